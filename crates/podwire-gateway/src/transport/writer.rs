//! Framed write half of the tunnel stream.
//!
//! The gateway and the dispatcher both write to the same stream, so the write
//! half sits behind an async mutex held for one whole frame. Chunks of two
//! frames never interleave.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use podwire_core::error::Result;
use podwire_core::protocol::frame::{self, TERMINATOR};

type BoxedWrite = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Clone)]
pub struct FrameWriter {
    inner: Arc<Mutex<BoxedWrite>>,
}

impl FrameWriter {
    pub fn new<W>(w: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(w))),
        }
    }

    /// Write one payload as a frame: 1024-byte chunks, then the terminator.
    ///
    /// A failed write leaves whatever was already written on the stream; the
    /// peer will see a truncated message glued to the next one.
    pub async fn write_frame(&self, payload: &[u8]) -> Result<()> {
        let mut w = self.inner.lock().await;

        for chunk in frame::chunks(payload) {
            if let Err(e) = w.write_all(chunk).await {
                tracing::warn!(error = %e, "writing frame chunk failed");
                return Err(e.into());
            }
        }
        if let Err(e) = w.write_all(TERMINATOR).await {
            tracing::warn!(error = %e, "writing frame terminator failed");
            return Err(e.into());
        }
        w.flush().await?;

        tracing::trace!(len = payload.len(), "frame written");
        Ok(())
    }

    /// Shut down the write direction. Pending reads on the peer then see EOF.
    pub async fn shutdown(&self) -> Result<()> {
        let mut w = self.inner.lock().await;
        w.shutdown().await?;
        Ok(())
    }
}
