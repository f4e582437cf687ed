//! Caller side of the tunnel.
//!
//! `TunnelClient::call` writes one command and waits for its reply:
//! `Idle -> AwaitingReply -> Delivered | Failed`. There is no retry, and a call
//! cannot be cancelled once its command is on the wire.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use podwire_core::error::{PodwireError, Result};
use podwire_core::protocol::message;
use podwire_core::protocol::{Envelope, Reply};

use crate::config::Protocol;
use crate::correlation::PendingReplies;
use crate::transport::FrameWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    AwaitingReply,
    Delivered,
    Failed,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallState::Idle => "idle",
            CallState::AwaitingReply => "awaiting_reply",
            CallState::Delivered => "delivered",
            CallState::Failed => "failed",
        })
    }
}

#[derive(Clone)]
pub struct TunnelClient {
    writer: FrameWriter,
    pending: Arc<PendingReplies>,
    protocol: Protocol,
    reply_timeout: Option<Duration>,
}

impl TunnelClient {
    pub fn new(
        writer: FrameWriter,
        pending: Arc<PendingReplies>,
        protocol: Protocol,
        reply_timeout: Option<Duration>,
    ) -> Self {
        Self {
            writer,
            pending,
            protocol,
            reply_timeout,
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Send a command and return the remote backend's JSON result.
    pub async fn call(&self, envelope: Envelope) -> Result<Bytes> {
        let method = envelope.method.clone();
        let uri = envelope.uri.clone();
        tracing::debug!(?method, %uri, state = %CallState::Idle, "tunnel call");

        let result = match self.protocol {
            Protocol::Tagged => self.call_tagged(&envelope).await,
            Protocol::Legacy => self.call_single_flight(&envelope).await,
        }
        .and_then(Reply::into_result);

        let state = if result.is_ok() {
            CallState::Delivered
        } else {
            CallState::Failed
        };
        match &result {
            Ok(body) => tracing::debug!(?method, %uri, %state, len = body.len(), "tunnel call finished"),
            Err(e) => tracing::warn!(?method, %uri, %state, error = %e, "tunnel call failed"),
        }
        result
    }

    async fn call_tagged(&self, envelope: &Envelope) -> Result<Reply> {
        let (id, rx) = self.pending.register()?;

        let sent = match message::encode_command(Some(id), envelope) {
            Ok(payload) => self.writer.write_frame(&payload).await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            self.pending.unregister(id);
            return Err(e);
        }
        tracing::debug!(id, state = %CallState::AwaitingReply, "command sent");

        let wait = async { rx.await.map_err(|_| PodwireError::PeerClosed)? };
        match self.reply_timeout {
            None => wait.await,
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(r) => r,
                Err(_) => {
                    self.pending.unregister(id);
                    Err(PodwireError::Timeout)
                }
            },
        }
    }

    async fn call_single_flight(&self, envelope: &Envelope) -> Result<Reply> {
        let mut replies = self.pending.single_flight().await;

        // Left over from a call that timed out; it must not answer this one.
        while let Ok(stale) = replies.try_recv() {
            tracing::warn!(ok = stale.is_ok(), "discarding stale reply");
        }

        let payload = message::encode_command(None, envelope)?;
        self.writer.write_frame(&payload).await?;
        tracing::debug!(state = %CallState::AwaitingReply, "command sent");

        let wait = async { replies.recv().await.ok_or(PodwireError::PeerClosed)? };
        match self.reply_timeout {
            None => wait.await,
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| PodwireError::Timeout)?,
        }
    }
}
