//! Terminator-delimited framing.
//!
//! Wire layout of one message:
//! - the payload, written as consecutive chunks of at most [`CHUNK_SIZE`] bytes
//! - the literal ASCII [`TERMINATOR`] as a final write
//!
//! There is no length prefix, checksum or version tag. The boundary is found by
//! scanning for the terminator, so a payload that itself contains the terminator
//! bytes is cut short. Payloads are expected to be JSON; the framing is not
//! binary-safe.

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{PodwireError, Result};

/// Size of each payload write and of each stream read.
pub const CHUNK_SIZE: usize = 1024;

/// End-of-message sentinel.
pub const TERMINATOR: &[u8] = b"END_OF_TRANSMISSION";

/// Split a payload into the chunk sequence written before the terminator.
///
/// An empty payload yields no chunks; the frame is then just the terminator.
pub fn chunks(payload: &[u8]) -> impl Iterator<Item = &[u8]> {
    payload.chunks(CHUNK_SIZE)
}

/// Encode a whole frame into one contiguous buffer.
///
/// Writers that go through a stream should prefer [`chunks`] + [`TERMINATOR`]
/// so each chunk is a separate write; this helper is for tests and in-memory use.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(payload.len() + TERMINATOR.len());
    for chunk in chunks(payload) {
        out.extend_from_slice(chunk);
    }
    out.extend_from_slice(TERMINATOR);
    out.freeze()
}

/// Incremental frame decoder.
///
/// Feed raw stream bytes with [`FrameDecoder::push`], then drain complete
/// messages with [`FrameDecoder::next_frame`] until it returns `Ok(None)`.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
    max_frame_bytes: Option<usize>,
    /// Offset before which no terminator can start.
    scanned: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that refuses to buffer more than `max` bytes of a single unterminated message.
    pub fn with_limit(max: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_bytes: Some(max),
            scanned: 0,
        }
    }

    /// Append bytes read from the stream.
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of bytes waiting for a terminator.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete message, if one is buffered.
    ///
    /// Bytes after the terminator stay in the buffer as the start of the next message.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        match find_terminator(&self.buf, self.scanned) {
            Some(start) => {
                let frame = self.buf.split_to(start).freeze();
                self.buf.advance(TERMINATOR.len());
                self.scanned = 0;
                Ok(Some(frame))
            }
            None => {
                // A terminator split across reads starts in the last 18 bytes.
                self.scanned = self.buf.len().saturating_sub(TERMINATOR.len() - 1);
                if let Some(max) = self.max_frame_bytes {
                    // A partial terminator may sit at the tail; it does not count as payload.
                    let payload_len = self.buf.len().saturating_sub(TERMINATOR.len() - 1);
                    if payload_len > max {
                        return Err(PodwireError::PayloadTooLarge);
                    }
                }
                Ok(None)
            }
        }
    }
}

fn find_terminator(haystack: &[u8], from: usize) -> Option<usize> {
    let tail = haystack.get(from..)?;
    if tail.len() < TERMINATOR.len() {
        return None;
    }
    tail.windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
        .map(|i| from + i)
}
