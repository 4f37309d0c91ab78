//! Service layer: gateway operations.
//!
//! [`OrderService`] composes the engine codec and session pool into the
//! add-order, cancel-order, snapshot, and size operations.

pub mod order_service;

pub use order_service::OrderService;
