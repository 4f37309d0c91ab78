//! Engine bridge: wire codec, framing, sessions, and the session pool.
//!
//! ```text
//! OrderService
//!     │  WireRequest ──encode──▶ bytes
//!     ├── SessionPool::acquire ─▶ EngineSession::send_and_receive
//!     │                              └── framing ─▶ TCP ─▶ engine
//!     │  Fields ◀──decode── bytes
//! ```

pub mod codec;
pub mod error;
pub mod framing;
pub mod pool;
pub mod session;

pub use codec::{Action, Fields, WireRequest};
pub use error::EngineError;
pub use framing::Framing;
pub use pool::{SessionLease, SessionPool};
pub use session::{EngineSession, SessionSettings};
