//! Data Transfer Objects for REST request/response serialization.
//!
//! Side and order-type travel as their integer codes, exactly as the
//! engine expects them. Trades are forwarded as opaque JSON objects.

pub mod book_dto;
pub mod order_dto;

pub use book_dto::*;
pub use order_dto::*;
