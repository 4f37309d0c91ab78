//! Order book DTOs for snapshot and size queries.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{OrderBookSnapshot, PriceLevel};

/// Response body for `GET /orderbook`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderBookResponse {
    /// Bid levels, best (highest) price first.
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best (lowest) price first.
    pub asks: Vec<PriceLevel>,
    /// Resting orders across both sides.
    pub total_orders: i64,
}

impl From<OrderBookSnapshot> for OrderBookResponse {
    fn from(snapshot: OrderBookSnapshot) -> Self {
        Self {
            bids: snapshot.bids,
            asks: snapshot.asks,
            total_orders: snapshot.total_orders,
        }
    }
}

/// Response body for `GET /orderbook/size`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SizeResponse {
    /// Resting orders across both sides.
    pub size: i64,
}
