//! REST API layer: route handlers, DTOs, router composition, and the
//! OpenAPI document.
//!
//! Routes are mounted at the root so the paths match what existing
//! clients of the order book API call.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
}

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "OrderBook Gateway API",
        description = "REST gateway in front of a socket-speaking order book matching engine."
    ),
    paths(
        handlers::orders::add_order,
        handlers::orders::add_buy_order,
        handlers::orders::add_sell_order,
        handlers::orders::cancel_order,
        handlers::orderbook::get_orderbook,
        handlers::orderbook::get_orderbook_size,
        handlers::system::root_handler,
        handlers::system::health_handler,
        handlers::system::reconnect_handler,
    ),
    components(schemas(
        dto::OrderRequest,
        dto::OrderResponse,
        dto::CancelResponse,
        dto::OrderBookResponse,
        dto::SizeResponse,
        crate::domain::PriceLevel,
        crate::domain::Side,
        crate::domain::OrderType,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Orders", description = "Order placement and cancellation"),
        (name = "Order Book", description = "Book snapshot and size"),
        (name = "System", description = "Banner, health, and admin"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/orders",
            "/orders/buy",
            "/orders/sell",
            "/orders/{order_id}",
            "/orderbook",
            "/orderbook/size",
            "/",
            "/health",
            "/admin/reconnect",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
