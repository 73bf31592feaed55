//! Server bootstrap and routing.

pub mod config;
pub mod loader;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use provisio_core::BroadcastRegistry;

use crate::{api, websocket};
use self::config::AppConfig;

/// Load configuration and run the server until shutdown.
pub async fn run() -> Result<()> {
    let config = loader::load_config()?;
    run_with_config(config).await
}

/// Run the server with an explicit configuration.
pub async fn run_with_config(config: AppConfig) -> Result<()> {
    let registry = Arc::new(BroadcastRegistry::new());
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = router(registry, Arc::new(config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "provisio server listening");

    axum::serve(listener, app)
        .await
        .context("server terminated")?;
    Ok(())
}

/// Build the full application router around a shared registry.
///
/// Public so integration tests can serve it on an ephemeral port.
pub fn router(registry: Arc<BroadcastRegistry>, config: Arc<AppConfig>) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::setup_routes())
        .merge(websocket::websocket_router())
        .layer(Extension(registry))
        .layer(Extension(config))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
