//! Wires one stream into a running tunnel.
//!
//! ```text
//!  stream (read) -> Demultiplexer -> mpsc<Unit> -> Dispatcher -> backend
//!                                                     |  \
//!                                        PendingReplies   FrameWriter -> stream (write)
//!                                                     |
//!  HTTP handler  -> TunnelClient --------------------/
//! ```

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use podwire_core::error::Result;

use crate::backend::ContainerEngine;
use crate::client::TunnelClient;
use crate::config::TunnelConfig;
use crate::correlation::PendingReplies;
use crate::dispatch::{container_routes, Dispatcher, RouteTable};
use crate::transport::{Demultiplexer, FrameWriter};

const UNIT_QUEUE: usize = 16;

pub struct Tunnel {
    client: TunnelClient,
    pending: Arc<PendingReplies>,
    reader: JoinHandle<()>,
    dispatcher: JoinHandle<()>,
}

impl Tunnel {
    /// Start a tunnel serving the standard container routes.
    pub fn spawn<S>(stream: S, cfg: &TunnelConfig, engine: Arc<dyn ContainerEngine>) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let routes = Arc::new(container_routes(engine)?);
        Ok(Self::spawn_with_routes(stream, cfg, routes))
    }

    pub fn spawn_with_routes<S>(stream: S, cfg: &TunnelConfig, routes: Arc<RouteTable>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        for (method, pattern, handler) in routes.describe() {
            tracing::debug!(%method, pattern, handler, "route registered");
        }

        let (rd, wr) = tokio::io::split(stream);
        let writer = FrameWriter::new(wr);
        let pending = Arc::new(PendingReplies::new(cfg.reply_handoff_timeout()));
        let (tx, rx) = mpsc::channel(UNIT_QUEUE);

        let reader = tokio::spawn(Demultiplexer::new(rd, tx, cfg.max_frame_bytes()).run());
        let dispatcher =
            tokio::spawn(Dispatcher::new(routes, writer.clone(), pending.clone()).run(rx));

        let client = TunnelClient::new(writer, pending.clone(), cfg.protocol, cfg.reply_timeout());
        tracing::info!(protocol = ?cfg.protocol, "tunnel started");

        Self {
            client,
            pending,
            reader,
            dispatcher,
        }
    }

    pub fn client(&self) -> TunnelClient {
        self.client.clone()
    }

    /// True once the read side or dispatcher has stopped.
    pub fn is_closed(&self) -> bool {
        self.pending.is_closed() || self.reader.is_finished() || self.dispatcher.is_finished()
    }

    /// Stop both loops. In-flight calls fail with `PeerClosed`.
    pub fn shutdown(&self) {
        self.reader.abort();
        self.dispatcher.abort();
        self.pending.close(None);
    }
}
