//! Stream transport.
//!
//! `FrameWriter` frames outbound payloads onto the write half; `Demultiplexer`
//! lifts complete messages off the read half and hands them to the dispatcher.

pub mod demux;
pub mod writer;

pub use demux::{Demultiplexer, Unit};
pub use writer::FrameWriter;
