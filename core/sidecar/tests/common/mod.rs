// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use sidecar_api::components::{
    ComponentError, OutputBinding, Publisher, SecretStore, StateItem, StateStore,
};
use sidecar_api::proto::{ApiVersion, Actor, InternalInvokeRequest, InvokeRequest};
use sidecar_api::{
    AppChannel, ChannelError, DirectMessaging, InvocationRequest, InvocationResult, Payload,
};
use sidecar_rpc::details::AnyProto;
use sidecar_rpc::{Context, Metadata};

/// What the mock app channel answers with
#[derive(Clone)]
pub enum Reply {
    /// Echo the call's span context in the body
    SpanContext,
    Result(InvocationResult),
    Error(ChannelError),
    /// Never answer
    Hang,
}

pub struct MockAppChannel {
    reply: Reply,
    calls: AtomicUsize,
    forwarded: Mutex<Vec<InvocationRequest>>,
    abandoned: AtomicBool,
}

/// Sets the flag when the pending call is dropped before it completes.
struct AbandonFlag<'a>(&'a AtomicBool);

impl Drop for AbandonFlag<'_> {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl MockAppChannel {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            forwarded: Mutex::new(Vec::new()),
            abandoned: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// True once a hanging call was dropped by its caller.
    pub fn was_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<InvocationRequest> {
        self.forwarded.lock().last().cloned()
    }
}

#[async_trait]
impl AppChannel for MockAppChannel {
    async fn invoke_method(
        &self,
        ctx: &Context,
        request: InvocationRequest,
    ) -> Result<InvocationResult, ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.forwarded.lock().push(request);

        match &self.reply {
            Reply::SpanContext => Ok(InvocationResult::http(200)
                .with_payload(Payload::new(ctx.span_context().encode(), "text/plain"))),
            Reply::Result(result) => Ok(result.clone()),
            Reply::Error(err) => Err(err.clone()),
            Reply::Hang => {
                let _flag = AbandonFlag(&self.abandoned);
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ChannelError::Transport("woke up".to_string()))
            }
        }
    }
}

pub struct MockDirectMessaging {
    result: InvocationResult,
    calls: AtomicUsize,
    targets: Mutex<Vec<(String, Metadata)>>,
}

impl MockDirectMessaging {
    pub fn new(result: InvocationResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_target(&self) -> Option<(String, Metadata)> {
        self.targets.lock().last().cloned()
    }
}

#[async_trait]
impl DirectMessaging for MockDirectMessaging {
    async fn invoke(
        &self,
        _ctx: &Context,
        target_app_id: &str,
        request: InvocationRequest,
    ) -> Result<InvocationResult, ChannelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets
            .lock()
            .push((target_app_id.to_string(), request.metadata().clone()));
        Ok(self.result.clone())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<(String, Bytes)>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, topic: &str, data: Bytes) -> Result<(), ComponentError> {
        self.events.lock().push((topic.to_string(), data));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingBinding {
    pub invocations: Mutex<Vec<(Bytes, HashMap<String, String>)>>,
}

#[async_trait]
impl OutputBinding for RecordingBinding {
    async fn invoke(
        &self,
        data: Bytes,
        metadata: HashMap<String, String>,
    ) -> Result<(), ComponentError> {
        self.invocations.lock().push((data, metadata));
        Ok(())
    }
}

/// Versioned in-memory store. The etag is the write count of the key.
#[derive(Default)]
pub struct InMemoryStateStore {
    items: Mutex<HashMap<String, (Bytes, u64)>>,
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<StateItem>, ComponentError> {
        Ok(self.items.lock().get(key).map(|(value, version)| StateItem {
            key: key.to_string(),
            value: value.clone(),
            etag: Some(version.to_string()),
            metadata: HashMap::new(),
        }))
    }

    async fn set(&self, item: StateItem) -> Result<(), ComponentError> {
        let mut items = self.items.lock();
        let version = items.get(&item.key).map_or(1, |(_, version)| version + 1);
        items.insert(item.key, (item.value, version));
        Ok(())
    }

    async fn delete(&self, key: &str, _etag: Option<&str>) -> Result<(), ComponentError> {
        self.items.lock().remove(key);
        Ok(())
    }
}

pub struct StaticSecretStore(pub HashMap<String, HashMap<String, String>>);

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_secret(
        &self,
        key: &str,
        _metadata: &HashMap<String, String>,
    ) -> Result<HashMap<String, String>, ComponentError> {
        self.0
            .get(key)
            .cloned()
            .ok_or_else(|| ComponentError::Failed(format!("secret {} not found", key)))
    }
}

pub fn internal_request(method: &str) -> InternalInvokeRequest {
    InternalInvokeRequest {
        ver: ApiVersion::V1 as i32,
        metadata: HashMap::new(),
        message: Some(InvokeRequest {
            method: method.to_string(),
            data: Some(AnyProto {
                type_url: String::new(),
                value: b"hello".to_vec(),
            }),
            content_type: "text/plain".to_string(),
        }),
        actor: None,
    }
}

pub fn actor_request(method: &str) -> InternalInvokeRequest {
    InternalInvokeRequest {
        actor: Some(Actor {
            actor_type: "test-actor".to_string(),
            actor_id: "actor-1".to_string(),
        }),
        ..internal_request(method)
    }
}
