//! Shared helpers for gateway integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use podwire_core::error::{PodwireError, Result};
use podwire_gateway::backend::{
    ContainerDetail, ContainerEngine, ContainerState, ContainerSummary, CreateRequest,
    CreateResponse,
};
use podwire_gateway::config::{Protocol, TunnelConfig};
use podwire_gateway::tunnel::Tunnel;

/// Engine that answers with canned data and records every call.
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<String>>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ContainerEngine for RecordingEngine {
    async fn list(&self) -> Result<Vec<ContainerSummary>> {
        self.record("list".into());
        Ok(Vec::new())
    }

    async fn create(&self, req: CreateRequest) -> Result<CreateResponse> {
        self.record(format!("create:{}", req.image));
        Ok(CreateResponse {
            id: format!("id-{}", req.image),
            warnings: Vec::new(),
        })
    }

    async fn inspect(&self, id: &str) -> Result<ContainerDetail> {
        self.record(format!("inspect:{id}"));
        if id == "missing" {
            return Err(PodwireError::NotFound(format!("no such container: {id}")));
        }
        Ok(detail(id))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.record(format!("delete:{id}"));
        Ok(())
    }
}

pub fn detail(id: &str) -> ContainerDetail {
    ContainerDetail {
        id: id.to_string(),
        name: format!("/{id}"),
        image: "alpine".into(),
        cmd: vec!["sh".into()],
        created: "0".into(),
        state: ContainerState {
            status: "created".into(),
            running: false,
        },
    }
}

pub fn tunnel_cfg(protocol: Protocol) -> TunnelConfig {
    TunnelConfig {
        protocol,
        ..TunnelConfig::default()
    }
}

pub fn with_reply_timeout(mut cfg: TunnelConfig, timeout: Duration) -> TunnelConfig {
    cfg.reply_timeout_ms = timeout.as_millis() as u64;
    cfg
}

/// Two tunnels joined by an in-memory stream. `local` issues calls, `remote`
/// serves them from `engine`.
pub struct Pair {
    pub local: Tunnel,
    pub remote: Tunnel,
}

pub fn pair(cfg: &TunnelConfig, local_engine: Arc<dyn ContainerEngine>, remote_engine: Arc<dyn ContainerEngine>) -> Pair {
    let (a, b) = tokio::io::duplex(64 * 1024);
    let local = Tunnel::spawn(a, cfg, local_engine).expect("local tunnel");
    let remote = Tunnel::spawn(b, cfg, remote_engine).expect("remote tunnel");
    Pair { local, remote }
}
