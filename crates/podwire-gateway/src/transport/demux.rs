//! Stream demultiplexer: the read loop.
//!
//! Owns the read half, feeds every read into a `FrameDecoder` and forwards each
//! complete message as a `Unit` to the single consumer channel. A read error or
//! an oversized frame is forwarded as `Err` and ends the loop; EOF ends it
//! silently, which closes the channel.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use podwire_core::error::Result;
use podwire_core::protocol::frame::{FrameDecoder, CHUNK_SIZE};

/// One complete message lifted off the stream.
#[derive(Debug, Clone)]
pub struct Unit {
    /// Fresh per-message id, for logs only; it never goes on the wire.
    pub id: String,
    pub data: Bytes,
}

pub struct Demultiplexer<R> {
    reader: R,
    tx: mpsc::Sender<Result<Unit>>,
    decoder: FrameDecoder,
}

impl<R> Demultiplexer<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R, tx: mpsc::Sender<Result<Unit>>, max_frame_bytes: Option<usize>) -> Self {
        let decoder = match max_frame_bytes {
            Some(max) => FrameDecoder::with_limit(max),
            None => FrameDecoder::new(),
        };
        Self { reader, tx, decoder }
    }

    pub async fn run(mut self) {
        let mut buf = [0u8; CHUNK_SIZE];
        loop {
            let n = match self.reader.read(&mut buf).await {
                Ok(0) => {
                    tracing::info!(buffered = self.decoder.buffered(), "stream closed by peer");
                    return;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read from stream");
                    let _ = self.tx.send(Err(e.into())).await;
                    return;
                }
            };

            self.decoder.push(&buf[..n]);

            loop {
                match self.decoder.next_frame() {
                    Ok(Some(data)) => {
                        let unit = Unit {
                            id: Uuid::new_v4().to_string(),
                            data,
                        };
                        tracing::debug!(unit = %unit.id, len = unit.data.len(), "message received");
                        if self.tx.send(Ok(unit)).await.is_err() {
                            tracing::info!("unit channel closed; read loop exiting");
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(error = %e, buffered = self.decoder.buffered(), "dropping stream");
                        let _ = self.tx.send(Err(e)).await;
                        return;
                    }
                }
            }
        }
    }
}
