//! Domain layer: order intents and order-book views.
//!
//! These are the values that flow between the HTTP façade, the order
//! service, and the engine codec. None of them hold business state; the
//! engine is the only source of truth for the book.

pub mod book;
pub mod order;

pub use book::{CancelAck, OrderAck, OrderBookSnapshot, PriceLevel, Trade};
pub use order::{OrderId, OrderIntent, OrderType, Side};
