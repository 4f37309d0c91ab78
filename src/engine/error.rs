//! Transport-level failures talking to the matching engine.

use std::time::Duration;

/// Errors raised by the codec, framing layer, session, and pool.
///
/// None of these are retried by the gateway. The order service wraps them
/// in [`crate::error::GatewayError::EngineUnavailable`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The session could not be established.
    #[error("cannot connect to engine at {addr}: {source}")]
    Connect {
        /// `host:port` that was dialed.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// `connect` was called on a session that is already connected.
    #[error("session to {0} is already connected")]
    AlreadyConnected(String),

    /// An operation was attempted without an established session.
    #[error("not connected to engine")]
    NotConnected,

    /// The peer closed the connection or the socket failed mid-operation.
    #[error("connection to engine lost: {0}")]
    ConnectionLost(String),

    /// A configured deadline elapsed. The session has been discarded.
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),

    /// Bytes left over from a previous exchange; the stream is out of step.
    #[error("engine stream desynchronized ({0} unread bytes)")]
    Desynchronized(usize),

    /// A frame exceeded the configured size limit.
    #[error("engine frame of {len} bytes exceeds limit of {limit}")]
    FrameTooLarge {
        /// Declared or buffered length.
        len: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// The engine sent something that is not a well-formed reply.
    #[error("malformed engine response: {0}")]
    MalformedResponse(String),
}

impl EngineError {
    /// Wraps an I/O error raised on an established session.
    pub(crate) fn lost(err: &std::io::Error) -> Self {
        Self::ConnectionLost(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
