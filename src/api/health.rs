//! Health check endpoint.

use std::sync::Arc;

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use provisio_core::BroadcastRegistry;

/// Health response with registry occupancy
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub tenants: usize,
    pub sessions: usize,
}

/// Create the health router
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}

async fn health(
    Extension(registry): Extension<Arc<BroadcastRegistry>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        tenants: registry.tenant_count(),
        sessions: registry.session_count(),
    })
}
