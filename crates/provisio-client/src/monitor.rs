//! Progress monitor: reducer plus one-shot side effects.
//!
//! Wraps the pure [`ProgressReducer`] with the two callbacks the UI cares
//! about. The error callback fires synchronously and exactly once on the
//! first failure (business or protocol). The completion callback is
//! scheduled on a cancellable timer after a grace delay, so a UI can finish
//! its final animation before redirecting; cancelling the monitor before the
//! delay elapses suppresses it entirely.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use provisio_core::{ProgressEvent, ProgressReducer, ProvisioningStep, Reduction};

type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;
type CompletionCallback = Arc<dyn Fn() + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

struct Inner {
    reducer: ProgressReducer,
    on_progress: Option<ProgressCallback>,
    on_completed: Option<CompletionCallback>,
    on_error: Option<ErrorCallback>,
    completion_timer: Option<JoinHandle<()>>,
    cancelled: bool,
}

/// Reduces the incoming event stream and drives the one-shot callbacks.
pub struct ProgressMonitor {
    inner: Mutex<Inner>,
    completion_grace: Duration,
}

impl ProgressMonitor {
    /// Create a monitor with the given completion grace delay.
    #[must_use]
    pub fn new(completion_grace: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                reducer: ProgressReducer::new(),
                on_progress: None,
                on_completed: None,
                on_error: None,
                completion_timer: None,
                cancelled: false,
            }),
            completion_grace,
        }
    }

    /// Override the completion grace delay.
    #[must_use]
    pub fn with_completion_grace(mut self, grace: Duration) -> Self {
        self.completion_grace = grace;
        self
    }

    /// Callback for every accepted (non-discarded) event. Display updates.
    #[must_use]
    pub fn on_progress(self, callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        self.inner.lock().expect("monitor lock").on_progress = Some(Arc::new(callback));
        self
    }

    /// One-shot callback fired after the grace delay once provisioning
    /// completes successfully.
    #[must_use]
    pub fn on_completed(self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.inner.lock().expect("monitor lock").on_completed = Some(Arc::new(callback));
        self
    }

    /// One-shot callback fired synchronously on the first failure.
    #[must_use]
    pub fn on_error(self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.inner.lock().expect("monitor lock").on_error = Some(Arc::new(callback));
        self
    }

    /// Feed one event from the stream through the reducer and run whatever
    /// side effects its reduction calls for.
    pub fn ingest(&self, event: &ProgressEvent) {
        enum Effect {
            None,
            Display(ProgressCallback),
            Fail(Option<ProgressCallback>, Option<ErrorCallback>, String),
            Complete(Option<ProgressCallback>, Option<CompletionCallback>),
        }

        let effect = {
            let mut inner = self.inner.lock().expect("monitor lock");
            if inner.cancelled {
                return;
            }
            match inner.reducer.apply(event) {
                Reduction::Ignored => Effect::None,
                Reduction::Updated => match &inner.on_progress {
                    Some(callback) => Effect::Display(Arc::clone(callback)),
                    None => Effect::None,
                },
                Reduction::Failed { error_message } => Effect::Fail(
                    inner.on_progress.clone(),
                    inner.on_error.take(),
                    error_message,
                ),
                Reduction::Completed => {
                    Effect::Complete(inner.on_progress.clone(), inner.on_completed.take())
                }
            }
        };

        // Callbacks run outside the lock so they may query the monitor.
        match effect {
            Effect::None => {}
            Effect::Display(callback) => callback(event),
            Effect::Fail(progress, error, message) => {
                if let Some(callback) = progress {
                    callback(event);
                }
                if let Some(callback) = error {
                    callback(&message);
                }
            }
            Effect::Complete(progress, completed) => {
                if let Some(callback) = progress {
                    callback(event);
                }
                if let Some(callback) = completed {
                    self.schedule_completion(callback);
                }
            }
        }
    }

    /// Surface a group-protocol failure through the same one-shot error path
    /// as a business failure.
    pub fn protocol_error(&self, message: &str) {
        let callback = {
            let mut inner = self.inner.lock().expect("monitor lock");
            if inner.cancelled {
                return;
            }
            inner.on_error.take()
        };
        if let Some(callback) = callback {
            callback(message);
        }
    }

    /// Tear down: suppress any pending completion timer and all further
    /// callbacks. Called exactly once from `disconnect()`.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().expect("monitor lock");
        inner.cancelled = true;
        if let Some(timer) = inner.completion_timer.take() {
            timer.abort();
            debug!("pending completion callback cancelled");
        }
    }

    fn schedule_completion(&self, callback: CompletionCallback) {
        let grace = self.completion_grace;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            callback();
        });
        let mut inner = self.inner.lock().expect("monitor lock");
        if inner.cancelled {
            // disconnect() won the race; the timer must not fire.
            timer.abort();
        } else {
            inner.completion_timer = Some(timer);
        }
    }

    /// Highest step observed so far.
    #[must_use]
    pub fn current_step(&self) -> ProvisioningStep {
        self.inner.lock().expect("monitor lock").reducer.current_step()
    }

    /// Last display percentage.
    #[must_use]
    pub fn progress_percentage(&self) -> i32 {
        self.inner
            .lock()
            .expect("monitor lock")
            .reducer
            .progress_percentage()
    }

    /// Whether the terminal success event was observed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.inner.lock().expect("monitor lock").reducer.is_completed()
    }

    /// Whether the terminal failure event was observed.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.inner.lock().expect("monitor lock").reducer.has_error()
    }

    /// Failure detail, once an error was observed.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("monitor lock")
            .reducer
            .error_message()
            .map(str::to_string)
    }

    /// Whether a terminal event was observed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.inner.lock().expect("monitor lock").reducer.is_terminal()
    }
}
