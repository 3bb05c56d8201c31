// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Call interceptors
//!
//! Interceptors wrap registered handlers at registration time. The first
//! interceptor added to the server is the outermost wrapper, so it sees the
//! call before every other interceptor and before dispatch.

use std::sync::Arc;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::context::Context;
use crate::status::Status;

pub type Item = Bytes;
pub type ItemStream = BoxStream<'static, Result<Item, Status>>;

pub type UnaryFuture = BoxFuture<'static, Result<Item, Status>>;
pub type StreamFuture = BoxFuture<'static, Result<ItemStream, Status>>;

/// Handler function type for unary methods
pub type UnaryHandler = Arc<dyn Fn(Item, Context) -> UnaryFuture + Send + Sync>;

/// Handler function type for stream-input methods
pub type StreamHandler = Arc<dyn Fn(ItemStream, Context) -> StreamFuture + Send + Sync>;

/// Hook run around every call.
///
/// An interceptor may mutate the context, wrap `next` in extra work, or
/// short-circuit by returning a status without calling `next`.
pub trait Interceptor: Send + Sync + 'static {
    fn intercept_unary(&self, request: Item, ctx: Context, next: UnaryHandler) -> UnaryFuture {
        next(request, ctx)
    }

    fn intercept_stream(
        &self,
        requests: ItemStream,
        ctx: Context,
        next: StreamHandler,
    ) -> StreamFuture {
        next(requests, ctx)
    }
}

/// Ordered list of interceptors
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wrap a unary handler in every interceptor, first one outermost
    pub fn wrap_unary(&self, handler: UnaryHandler) -> UnaryHandler {
        self.interceptors
            .iter()
            .rev()
            .fold(handler, |next, interceptor| {
                let interceptor = Arc::clone(interceptor);
                let wrapped: UnaryHandler = Arc::new(move |request: Item, ctx: Context| {
                    interceptor.intercept_unary(request, ctx, Arc::clone(&next))
                });
                wrapped
            })
    }

    /// Wrap a stream handler in every interceptor, first one outermost
    pub fn wrap_stream(&self, handler: StreamHandler) -> StreamHandler {
        self.interceptors
            .iter()
            .rev()
            .fold(handler, |next, interceptor| {
                let interceptor = Arc::clone(interceptor);
                let wrapped: StreamHandler = Arc::new(move |requests: ItemStream, ctx: Context| {
                    interceptor.intercept_stream(requests, ctx, Arc::clone(&next))
                });
                wrapped
            })
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}
