//! orderbook-gateway server entry point.
//!
//! Connects to the matching engine, then serves the REST API until
//! interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use orderbook_gateway::api;
use orderbook_gateway::app_state::AppState;
use orderbook_gateway::config::GatewayConfig;
use orderbook_gateway::engine::SessionPool;
use orderbook_gateway::service::OrderService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("invalid gateway configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(
        addr = %config.listen_addr,
        engine = %config.engine_addr(),
        pool_size = config.engine_pool_size,
        framing = %config.engine_framing,
        "starting orderbook-gateway"
    );

    // Build engine bridge; the gateway refuses to start without an engine
    let pool = Arc::new(SessionPool::new(
        &config.engine_host,
        config.engine_port,
        config.engine_pool_size,
        &config.session_settings(),
        config.engine_reconnect_on_acquire,
    ));
    pool.connect_all()
        .await
        .with_context(|| format!("cannot reach matching engine at {}", config.engine_addr()))?;

    // Build service layer
    let order_service = OrderService::new(Arc::clone(&pool), config.engine_strict_success);
    let app_state = AppState::new(order_service);
    let service = Arc::clone(&app_state.order_service);

    // Build router
    let app = Router::new().merge(api::build_router());
    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::ApiDoc::openapi()),
        )
    };
    let app = app
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.http_request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown().await;
    tracing::info!("engine sessions released, shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
