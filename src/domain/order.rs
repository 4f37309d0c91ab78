//! Order intent and the closed enumerations the engine recognizes.
//!
//! [`Side`] and [`OrderType`] can only be built from their recognized wire
//! codes, so an [`OrderIntent`] is valid by construction and the bridge never
//! forwards an unvalidated enum value.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// Engine-side order identifier.
pub type OrderId = i64;

/// Order side as understood by the matching engine (`0=BUY, 1=SELL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Bid side.
    Buy,
    /// Ask side.
    Sell,
}

impl Side {
    /// Returns the engine wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
        }
    }
}

impl TryFrom<i64> for Side {
    type Error = GatewayError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Buy),
            1 => Ok(Self::Sell),
            other => Err(GatewayError::InvalidSide(other)),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

/// Order lifetime semantics. Interpreted by the engine only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Rests until filled or cancelled.
    #[default]
    GoodTillCancel,
    /// Fills what it can immediately, remainder is dropped.
    FillAndKill,
    /// Fills completely or not at all.
    FillOrKill,
    /// Crosses at any price.
    Market,
    /// Rests until end of trading day.
    GoodForDay,
}

impl OrderType {
    /// All recognized order types, ordered by wire code.
    pub const ALL: [Self; 5] = [
        Self::GoodTillCancel,
        Self::FillAndKill,
        Self::FillOrKill,
        Self::Market,
        Self::GoodForDay,
    ];

    /// Returns the engine wire code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::GoodTillCancel => 0,
            Self::FillAndKill => 1,
            Self::FillOrKill => 2,
            Self::Market => 3,
            Self::GoodForDay => 4,
        }
    }
}

impl TryFrom<i64> for OrderType {
    type Error = GatewayError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::GoodTillCancel),
            1 => Ok(Self::FillAndKill),
            2 => Ok(Self::FillOrKill),
            3 => Ok(Self::Market),
            4 => Ok(Self::GoodForDay),
            other => Err(GatewayError::InvalidOrderType(other)),
        }
    }
}

/// A request to place one order on the engine.
///
/// Created by the caller of [`crate::service::OrderService::add_order`],
/// passed by value and never stored by the gateway. Price and quantity
/// positivity is enforced by the engine, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderIntent {
    /// Caller-chosen order identifier.
    pub order_id: OrderId,
    /// Buy or sell.
    pub side: Side,
    /// Limit price in engine ticks.
    pub price: i64,
    /// Quantity in engine lots.
    pub quantity: i64,
    /// Lifetime semantics.
    pub order_type: OrderType,
}

impl OrderIntent {
    /// Builds an intent from raw integer codes, rejecting unknown
    /// side or order-type values.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidSide`] or
    /// [`GatewayError::InvalidOrderType`] for unrecognized codes.
    pub fn from_codes(
        order_id: OrderId,
        side: i64,
        price: i64,
        quantity: i64,
        order_type: i64,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            order_id,
            side: Side::try_from(side)?,
            price,
            quantity,
            order_type: OrderType::try_from(order_type)?,
        })
    }
}
