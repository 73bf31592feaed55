//! REST API module for Provisio
//!
//! Thin boundary endpoints around the progress stream:
//! - Health check
//! - Setup status check (used before the stream is opened)
//! - Progress ingest (called by the provisioning engine)

pub mod health;
pub mod setup;

pub use health::health_routes;
pub use setup::setup_routes;
