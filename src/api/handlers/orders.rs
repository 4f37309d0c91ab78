//! Order handlers: place, quick buy/sell, cancel.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use crate::api::dto::{CancelResponse, OrderRequest, OrderResponse, QuickOrderParams};
use crate::app_state::AppState;
use crate::domain::{OrderId, OrderIntent, Side};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /orders` — Place an order.
///
/// # Errors
///
/// Returns [`GatewayError`] on a malformed request, invalid codes, engine
/// rejection, or transport failure.
#[utoipa::path(
    post,
    path = "/orders",
    tag = "Orders",
    summary = "Place an order",
    description = "Forwards a new order to the matching engine and returns the trades it produced. Side and order type are integer codes.",
    request_body = OrderRequest,
    responses(
        (status = 200, description = "Order accepted", body = OrderResponse),
        (status = 400, description = "Malformed request, invalid codes, or order rejected by the engine", body = ErrorResponse),
        (status = 500, description = "Engine unavailable", body = ErrorResponse),
    )
)]
pub async fn add_order(
    State(state): State<AppState>,
    body: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(req) = body?;
    let intent = req.into_intent()?;
    place(&state, intent).await
}

/// `POST /orders/buy` — Place a buy order from query parameters.
///
/// # Errors
///
/// Returns [`GatewayError`] on a malformed request, invalid codes, engine
/// rejection, or transport failure.
#[utoipa::path(
    post,
    path = "/orders/buy",
    tag = "Orders",
    summary = "Quick buy",
    description = "Shortcut for `POST /orders` with `side = 0`.",
    params(QuickOrderParams),
    responses(
        (status = 200, description = "Order accepted", body = OrderResponse),
        (status = 400, description = "Malformed request, invalid codes, or order rejected by the engine", body = ErrorResponse),
        (status = 500, description = "Engine unavailable", body = ErrorResponse),
    )
)]
pub async fn add_buy_order(
    State(state): State<AppState>,
    params: Result<Query<QuickOrderParams>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(params) = params?;
    let intent = params.into_intent(Side::Buy)?;
    place(&state, intent).await
}

/// `POST /orders/sell` — Place a sell order from query parameters.
///
/// # Errors
///
/// Returns [`GatewayError`] on a malformed request, invalid codes, engine
/// rejection, or transport failure.
#[utoipa::path(
    post,
    path = "/orders/sell",
    tag = "Orders",
    summary = "Quick sell",
    description = "Shortcut for `POST /orders` with `side = 1`.",
    params(QuickOrderParams),
    responses(
        (status = 200, description = "Order accepted", body = OrderResponse),
        (status = 400, description = "Malformed request, invalid codes, or order rejected by the engine", body = ErrorResponse),
        (status = 500, description = "Engine unavailable", body = ErrorResponse),
    )
)]
pub async fn add_sell_order(
    State(state): State<AppState>,
    params: Result<Query<QuickOrderParams>, QueryRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Query(params) = params?;
    let intent = params.into_intent(Side::Sell)?;
    place(&state, intent).await
}

/// `DELETE /orders/{order_id}` — Cancel a resting order.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a non-numeric id,
/// [`GatewayError::CancelRejected`] if the engine refuses, or
/// [`GatewayError::EngineUnavailable`] on transport failure.
#[utoipa::path(
    delete,
    path = "/orders/{order_id}",
    tag = "Orders",
    summary = "Cancel an order",
    params(
        ("order_id" = i64, Path, description = "Engine order identifier"),
    ),
    responses(
        (status = 200, description = "Order cancelled", body = CancelResponse),
        (status = 400, description = "Malformed order id or cancel rejected by the engine", body = ErrorResponse),
        (status = 500, description = "Engine unavailable", body = ErrorResponse),
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    order_id: Result<Path<OrderId>, PathRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Path(order_id) = order_id?;
    let ack = state.order_service.cancel_order(order_id).await?;
    Ok(Json(CancelResponse::cancelled(ack.order_id)))
}

async fn place(state: &AppState, intent: OrderIntent) -> Result<Json<OrderResponse>, GatewayError> {
    let ack = state.order_service.add_order(intent).await?;
    Ok(Json(OrderResponse::from(ack)))
}

/// Order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(add_order))
        .route("/orders/buy", post(add_buy_order))
        .route("/orders/sell", post(add_sell_order))
        .route("/orders/{order_id}", delete(cancel_order))
}
