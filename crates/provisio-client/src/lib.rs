//! Provisio Client - Resilient Progress Stream Observer
//!
//! Maintains one logical progress stream per observed tenant on behalf of a
//! client application:
//! - Connection: WebSocket transport with join handshake, keep-alive,
//!   automatic reconnect (0s/2s/5s then steady 10s) and re-join
//! - Monitor: the pure reducer from `provisio-core` composed with one-shot
//!   completion/error callbacks and the cancellable completion-delay timer
//!
//! Multiple independent observers (e.g. several tabs watching different
//! tenants) each own their own [`ProgressConnection`]; there is no ambient
//! shared state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backoff;
pub mod connection;
pub mod monitor;

pub use backoff::reconnect_delay;
pub use connection::{ConnectionState, ProgressConnection, WatchOptions};
pub use monitor::ProgressMonitor;
