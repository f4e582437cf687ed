//! Protocol modules.
//!
//! - `frame`: terminator-delimited framing over an unstructured byte stream.
//! - `envelope`: the JSON request record carried by command frames.
//! - `message`: per-frame classification into commands and replies, with the
//!   tagged (correlated) and untagged payload shapes.
//!
//! All decoders are panic-free: malformed input surfaces as `PodwireError` or,
//! for untagged payloads, as a reply, never as a crash.

pub mod envelope;
pub mod frame;
pub mod message;

pub use envelope::{Envelope, Headers, Method, Param, Params};
pub use frame::{FrameDecoder, CHUNK_SIZE, TERMINATOR};
pub use message::{Inbound, Reply, RequestId, PROTOCOL_VERSION};
