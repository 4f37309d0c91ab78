//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::OrderService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Order service for all engine operations.
    pub order_service: Arc<OrderService>,
}

impl AppState {
    /// Wraps an [`OrderService`] for handler injection.
    #[must_use]
    pub fn new(order_service: OrderService) -> Self {
        Self {
            order_service: Arc::new(order_service),
        }
    }
}
