//! Container route handlers and the fixed route table that binds them.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use podwire_core::error::{PodwireError, Result};
use podwire_core::protocol::Method;

use super::routes::{RouteHandler, RouteRequest, RouteTable};
use crate::backend::{ContainerEngine, CreateRequest};

/// The tunnel's route table:
///
/// | Method | Pattern | Operation |
/// |---|---|---|
/// | GET | `/containers/list` | list |
/// | GET | `/containers/:id` | inspect |
/// | POST | `/containers/create` | create |
/// | DELETE | `/containers/:id` | delete |
pub fn container_routes(engine: Arc<dyn ContainerEngine>) -> Result<RouteTable> {
    RouteTable::builder()
        .route(Method::Get, "/containers/list", Arc::new(ListContainers::new(engine.clone())))
        .route(Method::Get, "/containers/:id", Arc::new(InspectContainer::new(engine.clone())))
        .route(Method::Post, "/containers/create", Arc::new(CreateContainer::new(engine.clone())))
        .route(Method::Delete, "/containers/:id", Arc::new(DeleteContainer::new(engine)))
        .build()
}

fn to_json<T: Serialize>(v: &T) -> Result<Bytes> {
    serde_json::to_vec(v)
        .map(Bytes::from)
        .map_err(|e| PodwireError::Internal(format!("encode result failed: {e}")))
}

fn container_id(req: &RouteRequest) -> Result<&str> {
    req.params
        .get("id")
        .ok_or_else(|| PodwireError::BadRequest("missing container id".into()))
}

pub struct ListContainers {
    engine: Arc<dyn ContainerEngine>,
}

impl ListContainers {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl RouteHandler for ListContainers {
    fn name(&self) -> &'static str {
        "list"
    }

    async fn call(&self, _req: RouteRequest) -> Result<Bytes> {
        to_json(&self.engine.list().await?)
    }
}

pub struct InspectContainer {
    engine: Arc<dyn ContainerEngine>,
}

impl InspectContainer {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl RouteHandler for InspectContainer {
    fn name(&self) -> &'static str {
        "inspect"
    }

    async fn call(&self, req: RouteRequest) -> Result<Bytes> {
        let id = container_id(&req)?;
        to_json(&self.engine.inspect(id).await?)
    }
}

pub struct CreateContainer {
    engine: Arc<dyn ContainerEngine>,
}

impl CreateContainer {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl RouteHandler for CreateContainer {
    fn name(&self) -> &'static str {
        "create"
    }

    async fn call(&self, req: RouteRequest) -> Result<Bytes> {
        let create: CreateRequest = serde_json::from_slice(&req.envelope.body)
            .map_err(|e| PodwireError::BadRequest(format!("invalid create body: {e}")))?;
        to_json(&self.engine.create(create).await?)
    }
}

pub struct DeleteContainer {
    engine: Arc<dyn ContainerEngine>,
}

impl DeleteContainer {
    pub fn new(engine: Arc<dyn ContainerEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl RouteHandler for DeleteContainer {
    fn name(&self) -> &'static str {
        "delete"
    }

    async fn call(&self, req: RouteRequest) -> Result<Bytes> {
        let id = container_id(&req)?;
        self.engine.delete(id).await?;
        to_json(&"Ok")
    }
}
