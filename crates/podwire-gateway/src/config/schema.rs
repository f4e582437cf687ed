use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use podwire_core::error::{PodwireError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    pub peer: PeerConfig,

    #[serde(default)]
    pub tunnel: TunnelConfig,

    #[serde(default)]
    pub backend: BackendConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PodwireError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.peer.validate()?;
        self.tunnel.validate()?;
        self.backend.validate()?;

        Ok(())
    }
}

/// Local HTTP surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            PodwireError::BadRequest(format!(
                "gateway.listen must be a valid socket address: {}",
                self.listen
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerRole {
    /// Wait for the remote peer to connect.
    Listen,
    /// Dial the remote peer.
    Connect,
}

/// Stream substrate between the two peers.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    pub role: PeerRole,
    pub addr: String,
}

impl PeerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(PodwireError::BadRequest("peer.addr must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Correlated `{"v":1,"kind":..}` messages; concurrent calls allowed.
    #[default]
    Tagged,
    /// Bare envelopes and raw replies; one call in flight at a time.
    Legacy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TunnelConfig {
    #[serde(default)]
    pub protocol: Protocol,

    /// 0 disables the limit.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_reply_handoff_timeout_ms")]
    pub reply_handoff_timeout_ms: u64,

    /// 0 waits forever.
    #[serde(default)]
    pub reply_timeout_ms: u64,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            max_frame_bytes: default_max_frame_bytes(),
            reply_handoff_timeout_ms: default_reply_handoff_timeout_ms(),
            reply_timeout_ms: 0,
        }
    }
}

impl TunnelConfig {
    pub fn validate(&self) -> Result<()> {
        if !(100..=600000).contains(&self.reply_handoff_timeout_ms) {
            return Err(PodwireError::BadRequest(
                "tunnel.reply_handoff_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        if self.max_frame_bytes != 0 && self.max_frame_bytes < 1024 {
            return Err(PodwireError::BadRequest(
                "tunnel.max_frame_bytes must be 0 (unlimited) or at least 1024".into(),
            ));
        }
        Ok(())
    }

    pub fn max_frame_bytes(&self) -> Option<usize> {
        (self.max_frame_bytes != 0).then_some(self.max_frame_bytes)
    }

    pub fn reply_handoff_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_handoff_timeout_ms)
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        (self.reply_timeout_ms != 0).then(|| Duration::from_millis(self.reply_timeout_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process-local engine; nothing is actually run.
    #[default]
    Memory,
    /// Shells out to the docker CLI.
    Docker,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            docker_bin: default_docker_bin(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.kind == BackendKind::Docker && self.docker_bin.trim().is_empty() {
            return Err(PodwireError::BadRequest("backend.docker_bin must not be empty".into()));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".into()
}
fn default_max_frame_bytes() -> usize {
    16 * 1024 * 1024
}
fn default_reply_handoff_timeout_ms() -> u64 {
    10000
}
fn default_docker_bin() -> String {
    "docker".into()
}
