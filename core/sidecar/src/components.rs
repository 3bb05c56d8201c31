// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Pass-through API for state, secrets, pub/sub and output bindings.
//!
//! Envelopes are handed to the configured component as they are; results are
//! not translated. A missing component fails the call with
//! `FailedPrecondition`, a component error with `Internal`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use sidecar_rpc::{Context, Status};
use thiserror::Error;
use tracing::{debug, warn};

use crate::proto::{
    DeleteStateEnvelope, Empty, GetSecretEnvelope, GetSecretResponseEnvelope, GetStateEnvelope,
    GetStateResponseEnvelope, InvokeBindingEnvelope, PublishEventEnvelope, SaveStateEnvelope,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    #[error("etag mismatch for key {0}")]
    EtagMismatch(String),
    #[error("{0}")]
    Failed(String),
}

/// A stored value with its concurrency tag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateItem {
    pub key: String,
    pub value: Bytes,
    pub etag: Option<String>,
    pub metadata: HashMap<String, String>,
}

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StateItem>, ComponentError>;
    async fn set(&self, item: StateItem) -> Result<(), ComponentError>;
    async fn delete(&self, key: &str, etag: Option<&str>) -> Result<(), ComponentError>;
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(
        &self,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, ComponentError>;
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, data: Bytes) -> Result<(), ComponentError>;
}

#[async_trait]
pub trait OutputBinding: Send + Sync {
    async fn invoke(
        &self,
        data: Bytes,
        metadata: HashMap<String, String>,
    ) -> Result<(), ComponentError>;
}

/// Named components reachable through the pass-through API
#[derive(Clone, Default)]
pub struct ComponentApi {
    state_stores: HashMap<String, Arc<dyn StateStore>>,
    secret_stores: HashMap<String, Arc<dyn SecretStore>>,
    bindings: HashMap<String, Arc<dyn OutputBinding>>,
    publisher: Option<Arc<dyn Publisher>>,
}

impl ComponentApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state_store(
        mut self,
        name: impl Into<String>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        self.state_stores.insert(name.into(), store);
        self
    }

    pub fn with_secret_store(
        mut self,
        name: impl Into<String>,
        store: Arc<dyn SecretStore>,
    ) -> Self {
        self.secret_stores.insert(name.into(), store);
        self
    }

    pub fn with_binding(
        mut self,
        name: impl Into<String>,
        binding: Arc<dyn OutputBinding>,
    ) -> Self {
        self.bindings.insert(name.into(), binding);
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub async fn publish_event(
        &self,
        ctx: &Context,
        envelope: PublishEventEnvelope,
    ) -> Result<Empty, Status> {
        let publisher = self
            .publisher
            .as_ref()
            .ok_or_else(|| not_configured("publisher", ""))?;
        debug!(topic = %envelope.topic, "publishing event");
        ctx.guard(publisher.publish(&envelope.topic, Bytes::from(envelope.data)))
            .await?
            .map_err(|e| component_failed("publish", e))?;
        Ok(Empty {})
    }

    pub async fn invoke_binding(
        &self,
        ctx: &Context,
        envelope: InvokeBindingEnvelope,
    ) -> Result<Empty, Status> {
        let binding = lookup(&self.bindings, "output binding", &envelope.name)?;
        debug!(binding = %envelope.name, "invoking output binding");
        ctx.guard(binding.invoke(Bytes::from(envelope.data), envelope.metadata))
            .await?
            .map_err(|e| component_failed("invoke binding", e))?;
        Ok(Empty {})
    }

    pub async fn get_state(
        &self,
        ctx: &Context,
        envelope: GetStateEnvelope,
    ) -> Result<GetStateResponseEnvelope, Status> {
        let store = lookup(&self.state_stores, "state store", &envelope.store_name)?;
        let item = ctx
            .guard(store.get(&envelope.key))
            .await?
            .map_err(|e| component_failed("get state", e))?;

        Ok(item
            .map(|item| GetStateResponseEnvelope {
                data: item.value.to_vec(),
                etag: item.etag.unwrap_or_default(),
            })
            .unwrap_or_default())
    }

    pub async fn save_state(
        &self,
        ctx: &Context,
        envelope: SaveStateEnvelope,
    ) -> Result<Empty, Status> {
        let store = lookup(&self.state_stores, "state store", &envelope.store_name)?;
        for request in envelope.requests {
            let item = StateItem {
                key: request.key,
                value: Bytes::from(request.value),
                etag: Some(request.etag).filter(|etag| !etag.is_empty()),
                metadata: request.metadata,
            };
            ctx.guard(store.set(item))
                .await?
                .map_err(|e| component_failed("save state", e))?;
        }
        Ok(Empty {})
    }

    pub async fn delete_state(
        &self,
        ctx: &Context,
        envelope: DeleteStateEnvelope,
    ) -> Result<Empty, Status> {
        let store = lookup(&self.state_stores, "state store", &envelope.store_name)?;
        let etag = Some(envelope.etag.as_str()).filter(|etag| !etag.is_empty());
        ctx.guard(store.delete(&envelope.key, etag))
            .await?
            .map_err(|e| component_failed("delete state", e))?;
        Ok(Empty {})
    }

    pub async fn get_secret(
        &self,
        ctx: &Context,
        envelope: GetSecretEnvelope,
    ) -> Result<GetSecretResponseEnvelope, Status> {
        let store = lookup(&self.secret_stores, "secret store", &envelope.store_name)?;
        let data = ctx
            .guard(store.get_secret(&envelope.key, &envelope.metadata))
            .await?
            .map_err(|e| component_failed("get secret", e))?;
        Ok(GetSecretResponseEnvelope { data })
    }
}

impl std::fmt::Debug for ComponentApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentApi")
            .field("state_stores", &self.state_stores.keys().collect::<Vec<_>>())
            .field("secret_stores", &self.secret_stores.keys().collect::<Vec<_>>())
            .field("bindings", &self.bindings.keys().collect::<Vec<_>>())
            .field("publisher", &self.publisher.is_some())
            .finish()
    }
}

fn lookup<'a, T: ?Sized>(
    components: &'a HashMap<String, Arc<T>>,
    kind: &str,
    name: &str,
) -> Result<&'a Arc<T>, Status> {
    components.get(name).ok_or_else(|| not_configured(kind, name))
}

fn not_configured(kind: &str, name: &str) -> Status {
    let message = if name.is_empty() {
        format!("{} is not configured", kind)
    } else {
        format!("{} {} is not configured", kind, name)
    };
    debug!(%message, "rejecting call");
    Status::failed_precondition(message)
}

fn component_failed(operation: &str, err: ComponentError) -> Status {
    warn!(operation, error = %err, "component call failed");
    Status::internal(format!("{} failed: {}", operation, err))
}
