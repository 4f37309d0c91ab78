//! Wire codec: typed requests to engine JSON and back.
//!
//! Requests have the shape `{"action": "<name>", "data": {...}}`. Field names
//! inside `data` follow the engine's convention (`orderId`, `orderType`);
//! everything else passes through unchanged. Replies are arbitrary JSON
//! objects whose fields depend on the action.
//!
//! This module is pure: no sockets, no retries. Framing lives in
//! [`super::framing`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::EngineError;
use crate::domain::{OrderId, OrderIntent, PriceLevel, Trade};

/// Decoded reply fields.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Engine action names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Place an order.
    AddOrder,
    /// Cancel a resting order.
    CancelOrder,
    /// Count resting orders.
    GetSize,
    /// Aggregated levels for both sides.
    #[serde(rename = "get_orderbook")]
    GetOrderBook,
}

impl Action {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddOrder => "add_order",
            Self::CancelOrder => "cancel_order",
            Self::GetSize => "get_size",
            Self::GetOrderBook => "get_orderbook",
        }
    }
}

/// One request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    /// Which engine operation to run.
    pub action: Action,
    /// Operation arguments, already in wire field names.
    #[serde(default)]
    pub data: Fields,
}

#[derive(Serialize)]
struct AddOrderData {
    #[serde(rename = "orderId")]
    order_id: OrderId,
    side: u8,
    price: i64,
    quantity: i64,
    #[serde(rename = "orderType")]
    order_type: u8,
}

#[derive(Serialize)]
struct CancelOrderData {
    #[serde(rename = "orderId")]
    order_id: OrderId,
}

impl WireRequest {
    /// `add_order` request for a validated intent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedResponse`] only if serialization of
    /// the payload fails, which cannot happen for plain integers.
    pub fn add_order(intent: &OrderIntent) -> Result<Self, EngineError> {
        let data = AddOrderData {
            order_id: intent.order_id,
            side: intent.side.code(),
            price: intent.price,
            quantity: intent.quantity,
            order_type: intent.order_type.code(),
        };
        Self::with_data(Action::AddOrder, &data)
    }

    /// `cancel_order` request.
    ///
    /// # Errors
    ///
    /// See [`WireRequest::add_order`].
    pub fn cancel_order(order_id: OrderId) -> Result<Self, EngineError> {
        Self::with_data(Action::CancelOrder, &CancelOrderData { order_id })
    }

    /// `get_size` request with empty data.
    #[must_use]
    pub fn get_size() -> Self {
        Self {
            action: Action::GetSize,
            data: Fields::new(),
        }
    }

    /// `get_orderbook` request with empty data.
    #[must_use]
    pub fn get_orderbook() -> Self {
        Self {
            action: Action::GetOrderBook,
            data: Fields::new(),
        }
    }

    fn with_data<T: Serialize>(action: Action, data: &T) -> Result<Self, EngineError> {
        match serde_json::to_value(data)? {
            serde_json::Value::Object(data) => Ok(Self { action, data }),
            other => Err(EngineError::MalformedResponse(format!(
                "request data must be an object, got {other}"
            ))),
        }
    }
}

/// Serializes a request into one message body (framing not included).
///
/// # Errors
///
/// Returns [`EngineError::MalformedResponse`] if serialization fails.
pub fn encode(request: &WireRequest) -> Result<Vec<u8>, EngineError> {
    Ok(serde_json::to_vec(request)?)
}

/// Parses one message body into its top-level fields.
///
/// # Errors
///
/// Returns [`EngineError::MalformedResponse`] if the bytes are not a JSON
/// object.
pub fn decode(bytes: &[u8]) -> Result<Fields, EngineError> {
    match serde_json::from_slice::<serde_json::Value>(bytes)? {
        serde_json::Value::Object(fields) => Ok(fields),
        other => Err(EngineError::MalformedResponse(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Converts decoded fields into a typed reply.
///
/// # Errors
///
/// Returns [`EngineError::MalformedResponse`] if a present field has the
/// wrong type.
pub fn interpret<T: DeserializeOwned>(fields: Fields) -> Result<T, EngineError> {
    Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
}

/// Reply to `add_order`.
///
/// The reference engine omits `success` when it cannot parse the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddOrderReply {
    /// Explicit success flag, if sent.
    #[serde(default)]
    pub success: Option<bool>,
    /// Engine-provided failure reason.
    #[serde(default)]
    pub error: Option<String>,
    /// Trade count as reported.
    #[serde(default)]
    pub trades_count: Option<i64>,
    /// Generated trades.
    #[serde(default)]
    pub trades: Vec<Trade>,
}

/// Reply to `cancel_order`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelReply {
    /// Explicit success flag.
    #[serde(default)]
    pub success: Option<bool>,
    /// Engine-provided failure reason.
    #[serde(default)]
    pub error: Option<String>,
    /// Informational message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply to `get_size`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SizeReply {
    /// Explicit success flag, if sent.
    #[serde(default)]
    pub success: Option<bool>,
    /// Engine-provided failure reason.
    #[serde(default)]
    pub error: Option<String>,
    /// Number of resting orders.
    #[serde(default)]
    pub size: Option<i64>,
}

/// Reply to `get_orderbook`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookReply {
    /// Explicit success flag.
    #[serde(default)]
    pub success: Option<bool>,
    /// Engine-provided failure reason.
    #[serde(default)]
    pub error: Option<String>,
    /// Bid levels, best first.
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best first.
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    /// Resting order count, when the engine includes it.
    #[serde(default)]
    pub total_orders: Option<i64>,
}
