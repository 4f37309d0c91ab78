//! Fixed-size pool of engine sessions.
//!
//! Each session sits behind its own [`tokio::sync::Mutex`], so one request
//! is on the wire per session at any time. A pool of size 1 is a single
//! shared session serialized behind a lock; larger pools let independent
//! HTTP requests reach the engine in parallel over separate connections.
//! A semaphore with one permit per session admits callers, so a waiter is
//! handed whichever session frees up first.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, MutexGuard, Semaphore, SemaphorePermit};

use super::EngineError;
use super::session::{EngineSession, SessionSettings};

/// Exclusive access to one session. Released on drop.
#[derive(Debug)]
pub struct SessionLease<'a> {
    session: MutexGuard<'a, EngineSession>,
    _permit: SemaphorePermit<'a>,
}

impl Deref for SessionLease<'_> {
    type Target = EngineSession;

    fn deref(&self) -> &EngineSession {
        &self.session
    }
}

impl DerefMut for SessionLease<'_> {
    fn deref_mut(&mut self) -> &mut EngineSession {
        &mut self.session
    }
}

/// Sessions to a single engine address.
#[derive(Debug)]
pub struct SessionPool {
    sessions: Vec<Mutex<EngineSession>>,
    permits: Semaphore,
    next: AtomicUsize,
    reconnect_on_acquire: bool,
}

impl SessionPool {
    /// Creates `size` disconnected sessions (at least one).
    ///
    /// With `reconnect_on_acquire`, a session torn down by a failure is
    /// reconnected the next time it is leased. Sessions that were never
    /// connected, or were disconnected on purpose, are left alone.
    #[must_use]
    pub fn new(
        host: &str,
        port: u16,
        size: usize,
        settings: &SessionSettings,
        reconnect_on_acquire: bool,
    ) -> Self {
        let size = size.max(1);
        let sessions = (0..size)
            .map(|_| Mutex::new(EngineSession::new(host, port, settings.clone())))
            .collect();
        Self {
            sessions,
            permits: Semaphore::new(size),
            next: AtomicUsize::new(0),
            reconnect_on_acquire,
        }
    }

    /// Number of sessions in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.sessions.len()
    }

    /// Connects every session that is not already connected.
    ///
    /// # Errors
    ///
    /// Returns the first connection failure; sessions connected before it
    /// stay connected.
    pub async fn connect_all(&self) -> Result<(), EngineError> {
        for session in &self.sessions {
            let mut session = session.lock().await;
            if !session.is_connected() {
                session.reconnect().await?;
            }
        }
        tracing::info!(sessions = self.sessions.len(), "engine session pool connected");
        Ok(())
    }

    /// Closes and reopens every session.
    ///
    /// Waits for in-flight requests to finish first.
    ///
    /// # Errors
    ///
    /// Returns the first connection failure.
    pub async fn reconnect_all(&self) -> Result<usize, EngineError> {
        let mut reconnected = 0usize;
        for session in &self.sessions {
            session.lock().await.reconnect().await?;
            reconnected = reconnected.saturating_add(1);
        }
        tracing::info!(reconnected, "engine sessions reconnected");
        Ok(reconnected)
    }

    /// Releases every socket. Waits for in-flight requests to finish.
    pub async fn disconnect_all(&self) {
        for session in &self.sessions {
            session.lock().await.disconnect();
        }
        tracing::info!("engine session pool disconnected");
    }

    /// Number of sessions currently connected and idle.
    pub async fn connected_count(&self) -> usize {
        let mut count = 0usize;
        for session in &self.sessions {
            if let Ok(session) = session.try_lock()
                && session.is_connected()
            {
                count = count.saturating_add(1);
            }
        }
        count
    }

    /// Leases a session, waiting for any one to become idle.
    ///
    /// A session that needs recovery is reconnected before it is handed out
    /// when `reconnect_on_acquire` is set. Nothing has been sent on it yet,
    /// so this never replays a request. Otherwise it is handed out as is
    /// and the exchange fails with [`EngineError::NotConnected`].
    ///
    /// # Errors
    ///
    /// Returns the reconnect failure if the leased session could not be
    /// brought back up.
    pub async fn acquire(&self) -> Result<SessionLease<'_>, EngineError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| EngineError::NotConnected)?;

        let len = self.sessions.len();
        let start = self.next.fetch_add(1, Ordering::Relaxed) % len.max(1);

        for offset in 0..len {
            let idx = (start + offset) % len;
            if let Some(slot) = self.sessions.get(idx)
                && let Ok(session) = slot.try_lock()
            {
                return self.prepare(SessionLease { session, _permit: permit }).await;
            }
        }

        // A permit guarantees a session without a lease; an admin call
        // (`reconnect_all`, `disconnect_all`) may still be holding it.
        let Some(slot) = self.sessions.get(start) else {
            return Err(EngineError::NotConnected);
        };
        tracing::debug!(slot = start, "engine session held by an admin call, waiting");
        let session = slot.lock().await;
        self.prepare(SessionLease { session, _permit: permit }).await
    }

    async fn prepare<'a>(
        &self,
        mut lease: SessionLease<'a>,
    ) -> Result<SessionLease<'a>, EngineError> {
        if self.reconnect_on_acquire && lease.needs_recovery() {
            tracing::info!(addr = %lease.addr(), "reconnecting torn-down engine session before use");
            lease.reconnect().await?;
        }
        Ok(lease)
    }
}
