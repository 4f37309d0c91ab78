//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Transport failures from the engine bridge arrive wrapped in
//! [`GatewayError::EngineUnavailable`].

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::EngineError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4001,
///     "message": "order rejected by engine: duplicate order id",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status               |
/// |-----------|--------------------|---------------------------|
/// | 1000–1999 | Validation         | 400 Bad Request           |
/// | 3000–3999 | Engine / Server    | 500 Internal Server Error |
/// | 4000–4999 | Engine rejection   | 400 Bad Request           |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Side code outside the recognized enumeration.
    #[error("side must be 0 (BUY) or 1 (SELL), got {0}")]
    InvalidSide(i64),

    /// Order-type code outside the recognized enumeration.
    #[error("invalid order_type {0}: expected 0..=4")]
    InvalidOrderType(i64),

    /// The engine refused the order.
    #[error("order rejected by engine: {0}")]
    OrderRejected(String),

    /// The engine refused the cancel (unknown or already filled order).
    #[error("cancel rejected by engine: {0}")]
    CancelRejected(String),

    /// The engine reported that it could not produce a snapshot.
    #[error("order book snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    /// The engine could not be reached or answered garbage.
    #[error("matching engine unavailable: {0}")]
    EngineUnavailable(#[from] EngineError),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidSide(_) => 1002,
            Self::InvalidOrderType(_) => 1003,
            Self::EngineUnavailable(_) => 3001,
            Self::SnapshotUnavailable(_) => 3002,
            Self::OrderRejected(_) => 4001,
            Self::CancelRejected(_) => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidSide(_)
            | Self::InvalidOrderType(_)
            | Self::OrderRejected(_)
            | Self::CancelRejected(_) => StatusCode::BAD_REQUEST,
            Self::SnapshotUnavailable(_) | Self::EngineUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns `true` for transport-level failures (engine unreachable,
    /// connection lost, malformed reply).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::EngineUnavailable(_))
    }

    /// Renders this error with an explicit status, keeping the body shape.
    #[must_use]
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<JsonRejection> for GatewayError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for GatewayError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for GatewayError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        if self.is_transport() {
            tracing::warn!(error = %self, "engine call failed");
        }
        let status = self.status_code();
        self.into_response_with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_client_errors() {
        assert_eq!(
            GatewayError::OrderRejected("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::CancelRejected("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GatewayError::InvalidSide(3).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn transport_failures_are_server_errors() {
        let err = GatewayError::from(EngineError::NotConnected);
        assert!(err.is_transport());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), 3001);
    }

    #[test]
    fn explicit_status_keeps_error_code() {
        let response = GatewayError::from(EngineError::NotConnected)
            .into_response_with_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
