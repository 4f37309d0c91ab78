//! Order-book state as reported by the engine, plus operation results.
//!
//! None of these values are cached. Each one is a point-in-time copy of what
//! the engine sent back for a single call.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::OrderId;

/// One aggregated price level on one side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceLevel {
    /// Level price.
    pub price: i64,
    /// Total resting quantity at this price.
    pub quantity: i64,
}

/// A trade as returned by the engine.
///
/// Kept as an opaque field mapping: the gateway counts and forwards trades
/// but never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trade(pub serde_json::Map<String, serde_json::Value>);

impl Trade {
    /// Looks up a single trade field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }
}

/// Point-in-time view of both sides of the book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderBookSnapshot {
    /// Bid levels, best (highest) first.
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best (lowest) first.
    pub asks: Vec<PriceLevel>,
    /// Number of resting orders reported by the engine.
    pub total_orders: i64,
}

impl OrderBookSnapshot {
    /// Returns `true` if neither side has any level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Best bid level, if any.
    #[must_use]
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Best ask level, if any.
    #[must_use]
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }
}

/// Result of an accepted add-order call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderAck {
    /// Trade count exactly as the engine reported it.
    pub trades_count: i64,
    /// Trades generated by the order, forwarded untouched.
    pub trades: Vec<Trade>,
}

/// Result of an accepted cancel-order call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelAck {
    /// The cancelled order.
    pub order_id: OrderId,
    /// Always `true` for an accepted cancel.
    pub cancelled: bool,
}
