//! Top-level facade crate for podwire.
//!
//! Re-exports the protocol core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use podwire_core::*;
}

pub mod gateway {
    pub use podwire_gateway::*;
}
