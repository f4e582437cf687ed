//! podwire core: transport-agnostic protocol primitives and the shared error type.
//!
//! This crate defines the wire-level contracts used by both ends of a tunnel:
//! the frame codec, the request envelope and the command/reply classification.
//! It carries no runtime or transport dependencies so it can be reused by the
//! gateway, tests and tooling alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. All fallible paths
//! surface as `PodwireError`/`Result` so a peer sending garbage cannot crash
//! the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, PodwireError};
