//! Provisio server library.
//!
//! The binary in `main.rs` is a thin wrapper; the router and its pieces live
//! here so integration tests can drive a real server end to end.

#![forbid(unsafe_code)]

pub mod api;
pub mod cli;
pub mod server;
pub mod websocket;
