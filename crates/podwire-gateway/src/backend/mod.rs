//! Container engine contract.
//!
//! The dispatcher only ever sees `dyn ContainerEngine`; what runs behind it is
//! chosen by `backend.kind` in the config.

pub mod docker;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use podwire_core::error::Result;

use crate::config::{BackendConfig, BackendKind};

pub use docker::DockerCli;
pub use memory::MemoryEngine;

/// Row of `list()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSummary {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub command: String,
    pub state: String,
    pub status: String,
}

/// Body of a create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    #[serde(alias = "Image")]
    pub image: String,
    #[serde(default, alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Cmd")]
    pub cmd: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateResponse {
    pub id: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    pub status: String,
    pub running: bool,
}

/// Result of `inspect()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDetail {
    pub id: String,
    pub name: String,
    pub image: String,
    pub cmd: Vec<String>,
    pub created: String,
    pub state: ContainerState,
}

#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn list(&self) -> Result<Vec<ContainerSummary>>;
    async fn create(&self, req: CreateRequest) -> Result<CreateResponse>;
    /// `NotFound` when no container has this id or name.
    async fn inspect(&self, id: &str) -> Result<ContainerDetail>;
    /// Removes the container.
    async fn delete(&self, id: &str) -> Result<()>;
}

pub fn from_config(cfg: &BackendConfig) -> Arc<dyn ContainerEngine> {
    match cfg.kind {
        BackendKind::Memory => Arc::new(MemoryEngine::new()),
        BackendKind::Docker => Arc::new(DockerCli::new(cfg.docker_bin.clone())),
    }
}
