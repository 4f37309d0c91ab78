//! System endpoints: banner, health check, admin.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// Banner returned by `GET /`.
#[derive(Debug, Serialize, ToSchema)]
struct RootResponse {
    message: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    orderbook_size: i64,
    timestamp: String,
    version: String,
}

/// Admin reconnect response.
#[derive(Debug, Serialize, ToSchema)]
struct ReconnectResponse {
    success: bool,
    reconnected: usize,
}

/// `GET /` — Liveness banner.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Service banner",
    responses(
        (status = 200, description = "Gateway process is up", body = RootResponse),
    )
)]
pub async fn root_handler() -> impl IntoResponse {
    Json(RootResponse {
        message: "OrderBook API is running".to_string(),
    })
}

/// `GET /health` — Engine round-trip health check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Performs a `get_size` round trip to the engine. Returns 503 when the engine cannot be reached.",
    responses(
        (status = 200, description = "Engine reachable", body = HealthResponse),
        (status = 503, description = "Engine unreachable", body = ErrorResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Response {
    match state.order_service.health().await {
        Ok(orderbook_size) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                orderbook_size,
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            err.into_response_with_status(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// `POST /admin/reconnect` — Re-establish every engine session.
///
/// # Errors
///
/// Returns [`GatewayError::EngineUnavailable`] if any session fails to
/// reconnect.
#[utoipa::path(
    post,
    path = "/admin/reconnect",
    tag = "System",
    summary = "Reconnect engine sessions",
    description = "Closes and reopens every pooled engine connection. Requests in flight on other sessions are not affected.",
    responses(
        (status = 200, description = "All sessions reconnected", body = ReconnectResponse),
        (status = 500, description = "Engine unreachable", body = ErrorResponse),
    )
)]
pub async fn reconnect_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let reconnected = state.order_service.reconnect().await?;
    Ok(Json(ReconnectResponse {
        success: true,
        reconnected,
    }))
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/admin/reconnect", post(reconnect_handler))
}
