//! podwire gateway library entry.
//!
//! This crate wires the stream transport, reply correlation, remote dispatcher,
//! container backends and the local HTTP surface into one tunnel endpoint. It
//! is consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod backend;
pub mod client;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod peer;
pub mod router;
pub mod transport;
pub mod tunnel;
