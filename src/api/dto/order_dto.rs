//! Order DTOs for placement and cancellation.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{OrderAck, OrderId, OrderIntent, Side, Trade};
use crate::error::GatewayError;

/// Request body for `POST /orders`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderRequest {
    /// Client-chosen order identifier.
    pub order_id: OrderId,
    /// `0` = BUY, `1` = SELL.
    pub side: i64,
    /// Limit price in integer ticks.
    pub price: i64,
    /// Order quantity.
    pub quantity: i64,
    /// `0` = GoodTillCancel (default), `1` = FillAndKill, `2` = FillOrKill,
    /// `3` = Market, `4` = GoodForDay.
    #[serde(default)]
    pub order_type: i64,
}

impl OrderRequest {
    /// Validates the enumeration codes and builds an [`OrderIntent`].
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidSide`] or
    /// [`GatewayError::InvalidOrderType`] for out-of-range codes.
    pub fn into_intent(self) -> Result<OrderIntent, GatewayError> {
        OrderIntent::from_codes(
            self.order_id,
            self.side,
            self.price,
            self.quantity,
            self.order_type,
        )
    }
}

/// Query parameters for `POST /orders/buy` and `POST /orders/sell`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuickOrderParams {
    /// Client-chosen order identifier.
    pub order_id: OrderId,
    /// Limit price in integer ticks.
    pub price: i64,
    /// Order quantity.
    pub quantity: i64,
    /// Order-type code, defaults to `0` (GoodTillCancel).
    #[serde(default)]
    pub order_type: i64,
}

impl QuickOrderParams {
    /// Builds an [`OrderIntent`] on the side implied by the route.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidOrderType`] for an out-of-range
    /// order-type code.
    pub fn into_intent(self, side: Side) -> Result<OrderIntent, GatewayError> {
        OrderIntent::from_codes(
            self.order_id,
            i64::from(side.code()),
            self.price,
            self.quantity,
            self.order_type,
        )
    }
}

/// Response body for a placed order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    /// Always `true` on a 200 response.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Number of trades the order produced, as reported by the engine.
    pub trades_count: i64,
    /// Trades produced by the order, forwarded verbatim.
    #[schema(value_type = Vec<Object>)]
    pub trades: Vec<Trade>,
}

impl From<OrderAck> for OrderResponse {
    fn from(ack: OrderAck) -> Self {
        Self {
            success: true,
            message: "Order added successfully".to_string(),
            trades_count: ack.trades_count,
            trades: ack.trades,
        }
    }
}

/// Response body for `DELETE /orders/{order_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelResponse {
    /// Always `true` on a 200 response.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
}

impl CancelResponse {
    /// Success body for a cancelled order.
    #[must_use]
    pub fn cancelled(order_id: OrderId) -> Self {
        Self {
            success: true,
            message: format!("Order {order_id} cancelled"),
        }
    }
}
