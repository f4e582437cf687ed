//! Shared application state for the podwire gateway.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use podwire_core::error::Result;

use crate::backend::ContainerEngine;
use crate::client::TunnelClient;
use crate::config::GatewayConfig;
use crate::tunnel::Tunnel;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    tunnel: Tunnel,
}

impl AppState {
    /// Start the tunnel over `stream` and build the state HTTP handlers share.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn start<S>(cfg: GatewayConfig, stream: S, engine: Arc<dyn ContainerEngine>) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let tunnel = Tunnel::spawn(stream, &cfg.tunnel, engine)?;
        Ok(Self::from_tunnel(cfg, tunnel))
    }

    pub fn from_tunnel(cfg: GatewayConfig, tunnel: Tunnel) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, tunnel }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn client(&self) -> TunnelClient {
        self.inner.tunnel.client()
    }

    pub fn tunnel(&self) -> &Tunnel {
        &self.inner.tunnel
    }
}
