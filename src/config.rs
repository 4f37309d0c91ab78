//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable | Default |
//! |---|---|
//! | `LISTEN_ADDR` | `0.0.0.0:8000` |
//! | `ENGINE_HOST` | `127.0.0.1` |
//! | `ENGINE_PORT` | `9999` |
//! | `ENGINE_POOL_SIZE` | `1` |
//! | `ENGINE_CONNECT_TIMEOUT_MS` | `5000` |
//! | `ENGINE_REQUEST_TIMEOUT_MS` | `5000` (`0` disables) |
//! | `ENGINE_FRAMING` | `json` |
//! | `ENGINE_MAX_FRAME_BYTES` | `1048576` |
//! | `ENGINE_RECONNECT_ON_ACQUIRE` | `false` |
//! | `ENGINE_STRICT_SUCCESS` | `false` |
//! | `HTTP_REQUEST_TIMEOUT_SECS` | `30` |
//! | `LOG_FORMAT` | `text` (`json` for structured output) |

use std::net::SocketAddr;
use std::time::Duration;

use crate::engine::{Framing, SessionSettings};

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8000`).
    pub listen_addr: SocketAddr,

    /// Matching engine host name or IP.
    pub engine_host: String,

    /// Matching engine TCP port.
    pub engine_port: u16,

    /// Number of engine sessions. `1` serializes all traffic on one socket.
    pub engine_pool_size: usize,

    /// Connect deadline in milliseconds.
    pub engine_connect_timeout_ms: u64,

    /// Per-request deadline in milliseconds (`0` = wait indefinitely).
    pub engine_request_timeout_ms: u64,

    /// Message framing on the engine socket.
    pub engine_framing: Framing,

    /// Largest engine reply accepted.
    pub engine_max_frame_bytes: usize,

    /// Reconnect a session torn down by a failure when it is next leased.
    /// Off by default: recovery goes through the explicit reconnect
    /// operation.
    pub engine_reconnect_on_acquire: bool,

    /// Require `"success": true` on every engine reply.
    pub engine_strict_success: bool,

    /// Whole-request deadline for HTTP handlers.
    pub http_request_timeout_secs: u64,

    /// Emit JSON log lines instead of human-readable text.
    pub log_json: bool,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed as a
    /// [`SocketAddr`] or `ENGINE_FRAMING` names an unknown framing.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()?;

        let engine_host =
            std::env::var("ENGINE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let engine_port = parse_env("ENGINE_PORT", 9999);
        let engine_pool_size = parse_env("ENGINE_POOL_SIZE", 1usize).max(1);
        let engine_connect_timeout_ms = parse_env("ENGINE_CONNECT_TIMEOUT_MS", 5_000);
        let engine_request_timeout_ms = parse_env("ENGINE_REQUEST_TIMEOUT_MS", 5_000);

        let engine_framing = match std::env::var("ENGINE_FRAMING") {
            Ok(value) => value.parse::<Framing>()?,
            Err(_) => Framing::default(),
        };
        let engine_max_frame_bytes = parse_env("ENGINE_MAX_FRAME_BYTES", 1024 * 1024);

        let engine_reconnect_on_acquire = parse_env_bool("ENGINE_RECONNECT_ON_ACQUIRE", false);
        let engine_strict_success = parse_env_bool("ENGINE_STRICT_SUCCESS", false);

        let http_request_timeout_secs = parse_env("HTTP_REQUEST_TIMEOUT_SECS", 30);
        let log_json = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            listen_addr,
            engine_host,
            engine_port,
            engine_pool_size,
            engine_connect_timeout_ms,
            engine_request_timeout_ms,
            engine_framing,
            engine_max_frame_bytes,
            engine_reconnect_on_acquire,
            engine_strict_success,
            http_request_timeout_secs,
            log_json,
        })
    }

    /// Session tunables derived from this configuration.
    #[must_use]
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            connect_timeout: Duration::from_millis(self.engine_connect_timeout_ms),
            request_timeout: (self.engine_request_timeout_ms > 0)
                .then(|| Duration::from_millis(self.engine_request_timeout_ms)),
            framing: self.engine_framing,
            max_frame_bytes: self.engine_max_frame_bytes,
        }
    }

    /// `host:port` of the matching engine.
    #[must_use]
    pub fn engine_addr(&self) -> String {
        format!("{}:{}", self.engine_host, self.engine_port)
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}
