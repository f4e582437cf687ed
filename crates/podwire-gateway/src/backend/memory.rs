//! In-process engine. Keeps container records in memory and never runs anything.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use podwire_core::error::{PodwireError, Result};

use super::{
    ContainerDetail, ContainerEngine, ContainerState, ContainerSummary, CreateRequest,
    CreateResponse,
};

struct Record {
    seq: u64,
    detail: ContainerDetail,
}

#[derive(Default)]
pub struct MemoryEngine {
    containers: DashMap<String, Record>,
    seq: AtomicU64,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve(&self, id_or_name: &str) -> Option<String> {
        if self.containers.contains_key(id_or_name) {
            return Some(id_or_name.to_string());
        }
        let name = id_or_name.trim_start_matches('/');
        self.containers
            .iter()
            .find(|e| e.value().detail.name.trim_start_matches('/') == name)
            .map(|e| e.key().clone())
    }
}

#[async_trait]
impl ContainerEngine for MemoryEngine {
    async fn list(&self) -> Result<Vec<ContainerSummary>> {
        let mut rows: Vec<(u64, ContainerSummary)> = self
            .containers
            .iter()
            .map(|e| {
                let d = &e.value().detail;
                let summary = ContainerSummary {
                    id: d.id.clone(),
                    names: vec![d.name.clone()],
                    image: d.image.clone(),
                    command: d.cmd.join(" "),
                    state: d.state.status.clone(),
                    status: "Created".into(),
                };
                (e.value().seq, summary)
            })
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        Ok(rows.into_iter().map(|(_, s)| s).collect())
    }

    async fn create(&self, req: CreateRequest) -> Result<CreateResponse> {
        if req.image.trim().is_empty() {
            return Err(PodwireError::BadRequest("image is required".into()));
        }
        if !req.name.is_empty() && self.resolve(&req.name).is_some() {
            return Err(PodwireError::BadRequest(format!(
                "container name {} is already in use",
                req.name
            )));
        }

        let id = Uuid::new_v4().simple().to_string();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let name = if req.name.is_empty() {
            format!("/container_{seq}")
        } else {
            format!("/{}", req.name.trim_start_matches('/'))
        };
        let created = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string();

        let detail = ContainerDetail {
            id: id.clone(),
            name,
            image: req.image,
            cmd: req.cmd,
            created,
            state: ContainerState {
                status: "created".into(),
                running: false,
            },
        };
        self.containers.insert(id.clone(), Record { seq, detail });

        tracing::info!(%id, "container created");
        Ok(CreateResponse {
            id,
            warnings: Vec::new(),
        })
    }

    async fn inspect(&self, id: &str) -> Result<ContainerDetail> {
        self.resolve(id)
            .and_then(|key| self.containers.get(&key).map(|r| r.detail.clone()))
            .ok_or_else(|| PodwireError::NotFound(format!("no such container: {id}")))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let key = self
            .resolve(id)
            .ok_or_else(|| PodwireError::NotFound(format!("no such container: {id}")))?;
        self.containers.remove(&key);
        tracing::info!(id = %key, "container removed");
        Ok(())
    }
}
