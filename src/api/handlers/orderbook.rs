//! Order book handlers: snapshot and size.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{OrderBookResponse, SizeResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /orderbook` — Fresh snapshot of both sides of the book.
///
/// # Errors
///
/// Returns [`GatewayError::SnapshotUnavailable`] if the engine cannot
/// produce a snapshot, or [`GatewayError::EngineUnavailable`] on transport
/// failure.
#[utoipa::path(
    get,
    path = "/orderbook",
    tag = "Order Book",
    summary = "Order book snapshot",
    description = "Queries the engine for aggregated bid and ask levels. Nothing is cached.",
    responses(
        (status = 200, description = "Current book", body = OrderBookResponse),
        (status = 500, description = "Snapshot unavailable or engine unreachable", body = ErrorResponse),
    )
)]
pub async fn get_orderbook(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let snapshot = state.order_service.get_snapshot().await?;
    Ok(Json(OrderBookResponse::from(snapshot)))
}

/// `GET /orderbook/size` — Number of resting orders.
///
/// # Errors
///
/// Returns [`GatewayError::EngineUnavailable`] on transport failure.
#[utoipa::path(
    get,
    path = "/orderbook/size",
    tag = "Order Book",
    summary = "Order book size",
    responses(
        (status = 200, description = "Resting order count", body = SizeResponse),
        (status = 500, description = "Engine unreachable", body = ErrorResponse),
    )
)]
pub async fn get_orderbook_size(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let size = state.order_service.get_size().await?;
    Ok(Json(SizeResponse { size }))
}

/// Order book routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orderbook", get(get_orderbook))
        .route("/orderbook/size", get(get_orderbook_size))
}
