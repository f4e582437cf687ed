//! Consume loop for the unit channel.
//!
//! Each unit is classified once. Replies go to `PendingReplies`; commands are
//! matched against the route table, executed against the backend and answered
//! on the same stream. Commands run one at a time in arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;

use podwire_core::error::{RemoteFailure, Result};
use podwire_core::protocol::message::{self, Inbound};
use podwire_core::protocol::{Envelope, Reply, RequestId};

use super::routes::{RouteRequest, RouteTable};
use crate::correlation::PendingReplies;
use crate::transport::{FrameWriter, Unit};

pub struct Dispatcher {
    routes: Arc<RouteTable>,
    writer: FrameWriter,
    pending: Arc<PendingReplies>,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>, writer: FrameWriter, pending: Arc<PendingReplies>) -> Self {
        Self {
            routes,
            writer,
            pending,
        }
    }

    /// Run until the channel closes or a transport error arrives.
    pub async fn run(self, mut rx: mpsc::Receiver<Result<Unit>>) {
        while let Some(unit) = rx.recv().await {
            match unit {
                Ok(unit) => self.handle_unit(unit).await,
                Err(e) => {
                    tracing::warn!(error = %e, "error to listen data; dispatcher exiting");
                    self.pending.close(Some(e));
                    return;
                }
            }
        }
        tracing::info!("channel closed; dispatcher exiting");
        self.pending.close(None);
    }

    pub async fn handle_unit(&self, unit: Unit) {
        match message::decode(&unit.data) {
            Ok(Inbound::Reply(reply)) => {
                tracing::debug!(unit = %unit.id, id = ?reply.id, "reply received");
                self.pending.deliver(reply).await;
            }
            Ok(Inbound::Command { id, envelope }) => self.execute(id, envelope).await,
            Err(e) => {
                tracing::warn!(unit = %unit.id, error = %e, "undecodable tagged message; dropping");
            }
        }
    }

    async fn execute(&self, id: Option<RequestId>, envelope: Envelope) {
        let Some(matched) = self.routes.find(&envelope) else {
            tracing::debug!(
                method = ?envelope.method,
                uri = %envelope.uri,
                "no route for command; dropping"
            );
            return;
        };

        let route = matched.route;
        let handler = route.handler.clone();
        let req = RouteRequest {
            params: matched.params,
            envelope,
        };
        tracing::debug!(method = %route.method, pattern = route.pattern.as_str(), handler = handler.name(), "dispatching");

        let reply = match handler.call(req).await {
            Ok(body) => Reply::ok(id, body),
            Err(e) => {
                tracing::warn!(handler = handler.name(), error = %e, "backend operation failed");
                Reply::err(id, RemoteFailure::from(&e))
            }
        };

        let payload = match reply.encode() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode reply");
                return;
            }
        };
        if let Err(e) = self.writer.write_frame(&payload).await {
            tracing::warn!(error = %e, "error sending reply");
        }
    }
}
