//! Progress state reducer.
//!
//! Reduces the raw event stream into one coherent, UI-consumable state. The
//! stream is at-least-once and only ordered within an unbroken connection, so
//! the reducer is the sole mechanism that makes the system behave as if
//! ordering held: `current_step` never regresses, and once a terminal event
//! is observed every further arrival reduces to a no-op.
//!
//! The reducer is pure state over input events. Side effects (the one-shot
//! completion and error callbacks) live in `provisio-client`, which drives
//! this type and interprets the returned [`Reduction`].

use crate::event::ProgressEvent;
use crate::steps::ProvisioningStep;

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reduction {
    /// Stale, duplicate-after-terminal, or otherwise discarded
    Ignored,
    /// Display state refreshed; step advanced or unchanged
    Updated,
    /// First observation of the terminal success event
    Completed,
    /// First observation of the terminal failure event
    Failed {
        /// Error detail from the producer, when present
        error_message: String,
    },
}

/// Canonical client-side provisioning state for one tenant.
#[derive(Debug, Clone)]
pub struct ProgressReducer {
    current_step: ProvisioningStep,
    progress_percentage: i32,
    message: String,
    is_completed: bool,
    has_error: bool,
    error_message: Option<String>,
}

impl ProgressReducer {
    /// Fresh state: nothing observed yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_step: ProvisioningStep::Initializing,
            progress_percentage: 0,
            message: String::new(),
            is_completed: false,
            has_error: false,
            error_message: None,
        }
    }

    /// Apply one event from the stream.
    ///
    /// Terminal latch first, then the monotonic step clamp. The percentage is
    /// carried through for display only and never consulted for control flow.
    pub fn apply(&mut self, event: &ProgressEvent) -> Reduction {
        if self.is_terminal() {
            return Reduction::Ignored;
        }

        if event.has_error {
            let error_message = event
                .error_message
                .clone()
                .unwrap_or_else(|| "provisioning failed".to_string());
            self.has_error = true;
            self.error_message = Some(error_message.clone());
            self.message = event.message.clone();
            return Reduction::Failed { error_message };
        }

        // Only the hasError flag is authoritative for failure. A stray Failed
        // ordinal without the flag sits outside the normal ordering and must
        // not out-rank genuine progress, so it demotes to the fallback step
        // like any unknown ordinal.
        let step = match event.decoded_step() {
            ProvisioningStep::Failed => ProvisioningStep::Initializing,
            step => step,
        };

        if event.is_completed {
            self.current_step = ProvisioningStep::Completed;
            self.progress_percentage = 100;
            self.message = event.message.clone();
            self.is_completed = true;
            return Reduction::Completed;
        }

        // Monotonic clamp: stale events from before a reconnect are dropped.
        if step < self.current_step {
            return Reduction::Ignored;
        }

        self.current_step = step;
        self.progress_percentage = event.progress_percentage;
        self.message = event.message.clone();
        Reduction::Updated
    }

    /// Highest step observed so far.
    #[must_use]
    pub fn current_step(&self) -> ProvisioningStep {
        if self.has_error {
            ProvisioningStep::Failed
        } else {
            self.current_step
        }
    }

    /// Last display percentage (advisory only).
    #[must_use]
    pub fn progress_percentage(&self) -> i32 {
        self.progress_percentage
    }

    /// Last display message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the terminal success event was observed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// Whether the terminal failure event was observed.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Failure detail, once `has_error` is set.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether a terminal event was observed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.is_completed || self.has_error
    }
}

impl Default for ProgressReducer {
    fn default() -> Self {
        Self::new()
    }
}
