//! # orderbook-gateway
//!
//! REST gateway for a socket-speaking order book matching engine.
//!
//! HTTP clients place and cancel orders and read the book through a small
//! REST API. Every call becomes one JSON request/reply exchange with the
//! engine over a persistent TCP session. The gateway holds no order or book
//! state of its own: all matching happens in the engine.
//!
//! ## Architecture
//!
//! ```text
//! HTTP clients
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── OrderService (service/)
//!     │
//!     ├── SessionPool ── EngineSession (engine/)
//!     ├── Wire codec + framing (engine/)
//!     │
//!     └── Matching engine (TCP)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod service;
