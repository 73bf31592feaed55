//! WebSocket module for Provisio
//!
//! Provides the real-time endpoint:
//! - /ws/progress - Tenant provisioning progress stream

pub mod progress;

pub use progress::progress_handler;

use axum::{routing::get, Router};

/// Create the WebSocket router
pub fn websocket_router() -> Router {
    Router::new().route("/ws/progress", get(progress_handler))
}
