//! One connection to the matching engine with strict request/response
//! discipline.
//!
//! A session starts disconnected. [`EngineSession::connect`] opens the
//! socket; [`EngineSession::send_and_receive`] writes one request and waits
//! for exactly one reply. Any transport failure or deadline tears the socket
//! down, and the session stays down until it is explicitly reconnected.

use std::time::Duration;

use tokio::net::TcpStream;

use super::EngineError;
use super::framing::{FrameReader, Framing, write_frame};

/// Tunables shared by every session of a pool.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Deadline for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Deadline for one request/reply exchange. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// How messages are delimited on the socket.
    pub framing: Framing,
    /// Largest reply accepted before the session is discarded.
    pub max_frame_bytes: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Some(Duration::from_secs(5)),
            framing: Framing::Json,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug)]
struct Connection {
    stream: TcpStream,
    reader: FrameReader,
}

impl Connection {
    async fn exchange(&mut self, framing: Framing, request: &[u8]) -> Result<Vec<u8>, EngineError> {
        write_frame(&mut self.stream, framing, request).await?;
        self.reader.read_frame(&mut self.stream).await
    }
}

/// A single logical connection to the engine.
///
/// Requires `&mut self` for every exchange; concurrent callers go through
/// [`super::SessionPool`], which hands out one lease per in-flight request.
#[derive(Debug)]
pub struct EngineSession {
    host: String,
    port: u16,
    settings: SessionSettings,
    conn: Option<Connection>,
    /// Set while a request is on the wire. Still set on entry means the
    /// previous caller was cancelled mid-exchange.
    in_flight: bool,
    /// Set when a failure closed the socket. Cleared by `connect` and by an
    /// explicit `disconnect`.
    torn_down: bool,
}

impl EngineSession {
    /// Creates a disconnected session.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, settings: SessionSettings) -> Self {
        Self {
            host: host.into(),
            port,
            settings,
            conn: None,
            in_flight: false,
            torn_down: false,
        }
    }

    /// `host:port` of the engine.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns `true` if the socket is open and not mid-exchange.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.conn.is_some() && !self.in_flight
    }

    /// Returns `true` if a failure (or an abandoned exchange) closed the
    /// socket and nothing has reconnected it since.
    ///
    /// A session that was never connected, or was closed on purpose, does
    /// not need recovery.
    #[must_use]
    pub fn needs_recovery(&self) -> bool {
        self.torn_down || self.in_flight
    }

    /// Opens the socket.
    ///
    /// # Errors
    ///
    /// - [`EngineError::AlreadyConnected`] if the session is live; callers
    ///   must disconnect first.
    /// - [`EngineError::Connect`] if the engine refuses or is unreachable.
    /// - [`EngineError::Timeout`] if the connect deadline elapses.
    pub async fn connect(&mut self) -> Result<(), EngineError> {
        if self.in_flight {
            self.discard("previous exchange was interrupted");
        }
        let addr = self.addr();
        if self.conn.is_some() {
            return Err(EngineError::AlreadyConnected(addr));
        }

        let limit = self.settings.connect_timeout;
        let stream = match tokio::time::timeout(limit, TcpStream::connect(addr.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(EngineError::Connect { addr, source }),
            Err(_) => return Err(EngineError::Timeout(limit)),
        };
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(%addr, error = %e, "failed to set TCP_NODELAY");
        }

        self.conn = Some(Connection {
            stream,
            reader: FrameReader::new(self.settings.framing, self.settings.max_frame_bytes),
        });
        self.torn_down = false;
        tracing::info!(%addr, framing = %self.settings.framing, "engine session connected");
        Ok(())
    }

    /// Releases the socket. No-op when already disconnected.
    pub fn disconnect(&mut self) {
        self.in_flight = false;
        self.torn_down = false;
        if self.conn.take().is_some() {
            tracing::info!(addr = %self.addr(), "engine session closed");
        }
    }

    /// Drops the current socket (if any) and opens a new one.
    ///
    /// # Errors
    ///
    /// Same as [`EngineSession::connect`], minus `AlreadyConnected`.
    pub async fn reconnect(&mut self) -> Result<(), EngineError> {
        self.disconnect();
        self.connect().await
    }

    /// Writes one request and blocks until its reply is read.
    ///
    /// On any error the socket is closed before returning, so a failed
    /// session never serves another request without a reconnect.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotConnected`] if no socket is open.
    /// - [`EngineError::ConnectionLost`] if the peer closes or the previous
    ///   exchange on this session was abandoned.
    /// - [`EngineError::Desynchronized`] if unread bytes are left over.
    /// - [`EngineError::Timeout`] if the request deadline elapses.
    /// - [`EngineError::FrameTooLarge`] / [`EngineError::MalformedResponse`]
    ///   from the framing layer.
    pub async fn send_and_receive(&mut self, request: &[u8]) -> Result<Vec<u8>, EngineError> {
        if self.in_flight {
            self.discard("previous exchange was interrupted");
            return Err(EngineError::ConnectionLost(
                "previous exchange was interrupted".to_string(),
            ));
        }

        let Some(pending) = self.conn.as_ref().map(|c| c.reader.pending()) else {
            return Err(EngineError::NotConnected);
        };
        if pending > 0 {
            self.discard("unread bytes before new request");
            return Err(EngineError::Desynchronized(pending));
        }

        let framing = self.settings.framing;
        let request_timeout = self.settings.request_timeout;
        let Some(conn) = self.conn.as_mut() else {
            return Err(EngineError::NotConnected);
        };
        conn.reader.clear();
        self.in_flight = true;

        let result = match request_timeout {
            Some(limit) => tokio::time::timeout(limit, conn.exchange(framing, request))
                .await
                .unwrap_or(Err(EngineError::Timeout(limit))),
            None => conn.exchange(framing, request).await,
        };

        match result {
            Ok(reply) => {
                self.in_flight = false;
                Ok(reply)
            }
            Err(err) => {
                tracing::warn!(addr = %self.addr(), error = %err, "engine exchange failed");
                self.tear_down();
                Err(err)
            }
        }
    }

    fn discard(&mut self, reason: &str) {
        tracing::warn!(addr = %self.addr(), reason, "discarding engine session");
        self.tear_down();
    }

    fn tear_down(&mut self) {
        self.conn = None;
        self.in_flight = false;
        self.torn_down = true;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    fn settings(request_timeout: Option<Duration>) -> SessionSettings {
        SessionSettings {
            connect_timeout: Duration::from_secs(2),
            request_timeout,
            ..SessionSettings::default()
        }
    }

    /// Accepts one client and answers each request with the next scripted
    /// reply, then closes the socket.
    async fn scripted_engine(replies: Vec<&'static [u8]>) -> u16 {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut reader = FrameReader::new(Framing::Json, 4096);
            for reply in replies {
                if reader.read_frame(&mut socket).await.is_err() {
                    return;
                }
                if socket.write_all(reply).await.is_err() {
                    return;
                }
            }
        });
        addr.port()
    }

    /// Accepts one client and never answers.
    async fn silent_engine() -> (u16, tokio::task::JoinHandle<()>) {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        let handle = tokio::spawn(async move {
            let Ok((_socket, _)) = listener.accept().await else {
                return;
            };
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        (addr.port(), handle)
    }

    #[tokio::test]
    async fn send_before_connect_is_not_connected() {
        let mut session = EngineSession::new("127.0.0.1", 1, settings(None));
        let result = session.send_and_receive(b"{}").await;
        assert!(matches!(result, Err(EngineError::NotConnected)));
        assert!(!session.is_connected());
        assert!(!session.needs_recovery());
    }

    #[tokio::test]
    async fn round_trip_returns_one_reply() {
        let port = scripted_engine(vec![br#"{"success":true,"size":0}"#.as_slice()]).await;
        let mut session = EngineSession::new("127.0.0.1", port, settings(None));
        assert!(session.connect().await.is_ok());

        let reply = session.send_and_receive(br#"{"action":"get_size","data":{}}"#).await;
        let Ok(reply) = reply else {
            panic!("expected reply");
        };
        assert_eq!(reply, br#"{"success":true,"size":0}"#.to_vec());
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn peer_close_is_connection_lost_and_tears_down() {
        let port = scripted_engine(vec![]).await;
        let mut session = EngineSession::new("127.0.0.1", port, settings(None));
        assert!(session.connect().await.is_ok());

        let result = session.send_and_receive(b"{}").await;
        assert!(matches!(result, Err(EngineError::ConnectionLost(_))));
        assert!(!session.is_connected());
        assert!(session.needs_recovery());

        let result = session.send_and_receive(b"{}").await;
        assert!(matches!(result, Err(EngineError::NotConnected)));
    }

    #[tokio::test]
    async fn request_deadline_discards_session() {
        let (port, server) = silent_engine().await;
        let mut session = EngineSession::new(
            "127.0.0.1",
            port,
            settings(Some(Duration::from_millis(50))),
        );
        assert!(session.connect().await.is_ok());

        let result = session.send_and_receive(b"{}").await;
        assert!(matches!(result, Err(EngineError::Timeout(_))));
        assert!(!session.is_connected());
        server.abort();
    }

    #[tokio::test]
    async fn cancelled_exchange_is_not_resumed() {
        let (port, server) = silent_engine().await;
        let mut session = EngineSession::new("127.0.0.1", port, settings(None));
        assert!(session.connect().await.is_ok());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), session.send_and_receive(b"{}")).await;
        assert!(abandoned.is_err());
        assert!(!session.is_connected());

        let result = session.send_and_receive(b"{}").await;
        assert!(matches!(result, Err(EngineError::ConnectionLost(_))));
        let result = session.send_and_receive(b"{}").await;
        assert!(matches!(result, Err(EngineError::NotConnected)));
        server.abort();
    }

    #[tokio::test]
    async fn extra_reply_bytes_mean_desync() {
        let port = scripted_engine(vec![br#"{"size":1}{"size":2}"#.as_slice()]).await;
        let mut session = EngineSession::new("127.0.0.1", port, settings(None));
        assert!(session.connect().await.is_ok());

        let first = session.send_and_receive(b"{}").await;
        assert!(first.is_ok());
        let second = session.send_and_receive(b"{}").await;
        assert!(matches!(second, Err(EngineError::Desynchronized(_))));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn connect_refused_is_connect_error() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        drop(listener);

        let mut session = EngineSession::new("127.0.0.1", addr.port(), settings(None));
        let result = session.connect().await;
        assert!(matches!(result, Err(EngineError::Connect { .. })));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn double_connect_and_double_disconnect() {
        let port = scripted_engine(vec![]).await;
        let mut session = EngineSession::new("127.0.0.1", port, settings(None));
        assert!(session.connect().await.is_ok());
        assert!(matches!(
            session.connect().await,
            Err(EngineError::AlreadyConnected(_))
        ));

        session.disconnect();
        session.disconnect();
        assert!(!session.is_connected());
        assert!(!session.needs_recovery());
    }
}
