// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Server-side RPC handling implementation
//!
//! Provides a method registry that decodes raw request bytes, runs the
//! interceptor chain and dispatches every call on its own task.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use prost::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::context::Context;
use crate::interceptor::{
    Interceptor, InterceptorChain, Item, ItemStream, StreamHandler, UnaryHandler,
};
use crate::metadata::Metadata;
use crate::status::Status;

/// Collects handlers and interceptors, then freezes them into a [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    interceptors: InterceptorChain,
    default_timeout: Option<Duration>,
    handlers: HashMap<String, UnaryHandler>,
    stream_handlers: HashMap<String, StreamHandler>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interceptor. Interceptors run in the order they are added.
    pub fn interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Deadline applied to calls whose metadata carries none
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Register a unary method taking and returning protobuf messages.
    /// Requests that fail to decode are rejected with `InvalidArgument`.
    pub fn register_unary<Req, Res, F, Fut>(mut self, method: &str, handler: F) -> Self
    where
        Req: Message + Default + 'static,
        Res: Message + 'static,
        F: Fn(Req, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, Status>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let wrapper: UnaryHandler = Arc::new(move |bytes: Item, ctx: Context| {
            let handler = Arc::clone(&handler);
            async move {
                let request = Req::decode(bytes).map_err(|e| {
                    debug!(method = %ctx.method(), error = %e, "failed to decode request");
                    Status::invalid_argument(format!("failed to decode request: {}", e))
                })?;
                let response = handler(request, ctx).await?;
                Ok(Bytes::from(response.encode_to_vec()))
            }
            .boxed()
        });

        self.handlers.insert(method.to_string(), wrapper);
        self
    }

    /// Register a stream-input, stream-output method working on raw items.
    pub fn register_stream<F, Fut>(mut self, method: &str, handler: F) -> Self
    where
        F: Fn(ItemStream, Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ItemStream, Status>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let wrapper: StreamHandler = Arc::new(move |requests: ItemStream, ctx: Context| {
            let handler = Arc::clone(&handler);
            async move { handler(requests, ctx).await }.boxed()
        });

        self.stream_handlers.insert(method.to_string(), wrapper);
        self
    }

    pub fn build(self) -> Server {
        let chain = self.interceptors;
        let handlers = self
            .handlers
            .into_iter()
            .map(|(method, handler)| (method, chain.wrap_unary(handler)))
            .collect();
        let stream_handlers = self
            .stream_handlers
            .into_iter()
            .map(|(method, handler)| (method, chain.wrap_stream(handler)))
            .collect();

        Server {
            handlers,
            stream_handlers,
            default_timeout: self.default_timeout,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Frozen method registry. Cheap to share behind an `Arc`.
pub struct Server {
    handlers: HashMap<String, UnaryHandler>,
    stream_handlers: HashMap<String, StreamHandler>,
    default_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Registered method paths, sorted
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self
            .handlers
            .keys()
            .chain(self.stream_handlers.keys())
            .map(String::as_str)
            .collect();
        methods.sort_unstable();
        methods
    }

    /// Dispatch a unary call. Dropping the returned future cancels the call.
    pub async fn call(
        &self,
        method: &str,
        request: Bytes,
        metadata: Metadata,
    ) -> Result<Bytes, Status> {
        let handler = self
            .handlers
            .get(method)
            .cloned()
            .ok_or_else(|| unknown_method(method))?;
        let ctx = self.new_context(method, metadata)?;

        debug!(method = %method, "dispatching call");
        let cancel_on_drop = ctx.cancellation_token().clone().drop_guard();
        let result = tokio::spawn(handler(request, ctx)).await;
        drop(cancel_on_drop);

        result.unwrap_or_else(|e| {
            error!(method = %method, error = %e, "call task failed");
            Err(Status::internal("call task failed"))
        })
    }

    /// Dispatch a streaming call. The call's context stays alive for as long
    /// as the returned stream is consumed.
    pub async fn call_stream(
        &self,
        method: &str,
        requests: ItemStream,
        metadata: Metadata,
    ) -> Result<ItemStream, Status> {
        let handler = self
            .stream_handlers
            .get(method)
            .cloned()
            .ok_or_else(|| unknown_method(method))?;
        let ctx = self.new_context(method, metadata)?;

        debug!(method = %method, "dispatching stream call");
        tokio::spawn(handler(requests, ctx))
            .await
            .unwrap_or_else(|e| {
                error!(method = %method, error = %e, "stream call task failed");
                Err(Status::internal("call task failed"))
            })
    }

    /// Typed unary call, encoding the request and decoding the response.
    pub async fn unary<Req, Res>(
        &self,
        method: &str,
        request: &Req,
        metadata: Metadata,
    ) -> Result<Res, Status>
    where
        Req: Message,
        Res: Message + Default,
    {
        let bytes = self
            .call(method, Bytes::from(request.encode_to_vec()), metadata)
            .await?;
        Res::decode(bytes)
            .map_err(|e| Status::internal(format!("failed to decode response: {}", e)))
    }

    /// Cancel every in-flight call and reject new ones.
    pub fn shutdown(&self) {
        debug!("server shutting down");
        self.shutdown.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    fn new_context(&self, method: &str, metadata: Metadata) -> Result<Context, Status> {
        if self.is_shutdown() {
            return Err(Status::unavailable("server is shutting down"));
        }

        let mut ctx = Context::new(method)
            .with_metadata(metadata)
            .with_cancellation(self.shutdown.child_token());
        if let Some(timeout) = self.default_timeout {
            ctx.set_default_timeout(timeout);
        }
        Ok(ctx)
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("methods", &self.methods())
            .field("default_timeout", &self.default_timeout)
            .finish()
    }
}

fn unknown_method(method: &str) -> Status {
    debug!(method = %method, "unknown method");
    Status::unimplemented(format!("unknown method {}", method))
}
