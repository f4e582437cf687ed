//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use podwire_core::error::{PodwireError, Result};

pub use schema::{
    BackendConfig, BackendKind, GatewayConfig, GatewaySection, PeerConfig, PeerRole, Protocol,
    TunnelConfig,
};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PodwireError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| PodwireError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
