//! Provisio Core - Provisioning Progress Model
//!
//! This crate provides the shared building blocks for the tenant provisioning
//! progress stream:
//! - Steps: the closed, ordered taxonomy of provisioning steps
//! - Event: the wire shape of a progress update
//! - Protocol: WebSocket control frames exchanged around the event stream
//! - Reducer: pure reduction of the at-least-once event stream into one
//!   monotonic, terminal-safe state
//! - Registry: server-side tenant -> subscriber fan-out

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod protocol;
pub mod reducer;
pub mod registry;
pub mod steps;

pub use error::{Error, Result};
pub use event::ProgressEvent;
pub use protocol::{ClientMessage, InboundFrame, ServerMessage};
pub use reducer::{ProgressReducer, Reduction};
pub use registry::{BroadcastRegistry, SessionId};
pub use steps::ProvisioningStep;
