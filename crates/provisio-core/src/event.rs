//! Progress event wire model.
//!
//! One JSON object per event, camelCase keys. `progressPercentage` is a
//! display hint only and is not guaranteed monotonic by the producer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::steps::ProvisioningStep;

/// A single provisioning status update for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Opaque identity of the provisioning subject
    pub tenant_id: String,
    /// Ordinal position in the step sequence (see [`ProvisioningStep`])
    pub step: i32,
    /// Human-readable step label, not used for control flow
    pub step_name: String,
    /// Human-readable detail message, not used for control flow
    pub message: String,
    /// 0-100 display hint, not guaranteed monotonic
    pub progress_percentage: i32,
    /// Terminal success flag
    #[serde(default)]
    pub is_completed: bool,
    /// Terminal failure flag
    #[serde(default)]
    pub has_error: bool,
    /// Failure detail, populated when `has_error` is set
    #[serde(default)]
    pub error_message: Option<String>,
    /// Producer-side emission time
    pub timestamp: DateTime<Utc>,
    /// Open key/value bag
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ProgressEvent {
    /// Build an event for a normal (non-terminal) step transition.
    pub fn step(tenant_id: impl Into<String>, step: ProvisioningStep, message: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            step: step.ordinal(),
            step_name: step.label().to_string(),
            message: message.into(),
            progress_percentage: 0,
            is_completed: false,
            has_error: false,
            error_message: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Build the terminal success event.
    pub fn completed(tenant_id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut event = Self::step(tenant_id, ProvisioningStep::Completed, message);
        event.is_completed = true;
        event.progress_percentage = 100;
        event
    }

    /// Build the terminal failure event.
    pub fn failed(tenant_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        let error_message = error_message.into();
        let mut event = Self::step(tenant_id, ProvisioningStep::Failed, error_message.clone());
        event.has_error = true;
        event.error_message = Some(error_message);
        event
    }

    /// Set the display percentage.
    #[must_use]
    pub fn with_percentage(mut self, percentage: i32) -> Self {
        self.progress_percentage = percentage;
        self
    }

    /// Decode the step ordinal, with the safe fallback for unknown values.
    #[must_use]
    pub fn decoded_step(&self) -> ProvisioningStep {
        ProvisioningStep::from_ordinal(self.step)
    }

    /// Whether this event carries a terminal flag.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_completed || self.has_error
    }
}
