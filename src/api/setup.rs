//! Setup boundary endpoints.
//!
//! The status check is consumed by clients before they open the progress
//! stream; the ingest endpoint is the seam where the (external) provisioning
//! engine hands events to the notification subsystem. Publishing is
//! fire-and-forget for the engine: once an event decodes, the engine gets a
//! 202 regardless of how many observers are listening.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tracing::debug;

use provisio_core::steps::TOTAL_STEPS;
use provisio_core::{BroadcastRegistry, ProgressEvent};

/// Status-check response, camelCase on the wire like the event object.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupStatusResponse {
    pub requires_onboarding: bool,
    pub current_step_index: i32,
    pub total_steps: usize,
    pub progress_percentage: i32,
}

/// Create the setup router
pub fn setup_routes() -> Router {
    Router::new()
        .route("/api/v1/setup/status/:tenant_id", get(setup_status))
        .route("/api/v1/setup/progress", post(ingest_progress))
}

/// Last known provisioning position for a tenant, for clients that have not
/// opened the stream yet (or joined after the workflow already finished).
async fn setup_status(
    Path(tenant_id): Path<String>,
    Extension(registry): Extension<Arc<BroadcastRegistry>>,
) -> Json<SetupStatusResponse> {
    let response = match registry.last_event(&tenant_id) {
        Some(event) => SetupStatusResponse {
            requires_onboarding: !event.is_completed,
            current_step_index: event.decoded_step().ordinal(),
            total_steps: TOTAL_STEPS,
            progress_percentage: event.progress_percentage,
        },
        None => SetupStatusResponse {
            requires_onboarding: true,
            current_step_index: 0,
            total_steps: TOTAL_STEPS,
            progress_percentage: 0,
        },
    };
    Json(response)
}

/// Accept one progress event from the provisioning engine and fan it out.
async fn ingest_progress(
    Extension(registry): Extension<Arc<BroadcastRegistry>>,
    Json(event): Json<ProgressEvent>,
) -> StatusCode {
    let delivered = registry.publish(&event);
    debug!(
        tenant = %event.tenant_id,
        step = event.step,
        delivered,
        "progress event ingested"
    );
    StatusCode::ACCEPTED
}
