// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Invocation entry points: local call, actor call and service invoke.
//!
//! Within a call the order is always parse, dispatch, translate. Downstream
//! calls are raced against the call's cancellation token and deadline; the
//! downstream future is dropped when either fires.

use std::sync::Arc;

use sidecar_rpc::Context;
use sidecar_tracing::propagation::inject_span_context;
use tracing::{debug, warn};

use crate::channel::{AppChannel, DirectMessaging};
use crate::errors::InvokeError;
use crate::invoke::{Interpretation, InvocationRequest};
use crate::proto::{
    InternalInvokeRequest, InternalInvokeResponse, InvokeResponse, InvokeServiceRequest,
};
use crate::translate::translate;

#[derive(Clone, Default)]
pub struct Router {
    app_channel: Option<Arc<dyn AppChannel>>,
    direct_messaging: Option<Arc<dyn DirectMessaging>>,
}

impl Router {
    pub fn new(
        app_channel: Option<Arc<dyn AppChannel>>,
        direct_messaging: Option<Arc<dyn DirectMessaging>>,
    ) -> Self {
        Self {
            app_channel,
            direct_messaging,
        }
    }

    pub fn with_app_channel(mut self, app_channel: Arc<dyn AppChannel>) -> Self {
        self.app_channel = Some(app_channel);
        self
    }

    pub fn with_direct_messaging(mut self, direct_messaging: Arc<dyn DirectMessaging>) -> Self {
        self.direct_messaging = Some(direct_messaging);
        self
    }

    /// Invoke a method on the local application.
    pub async fn call_local(
        &self,
        ctx: &Context,
        request: InternalInvokeRequest,
    ) -> Result<InternalInvokeResponse, InvokeError> {
        let channel = self.app_channel()?;
        let request = InvocationRequest::from_internal(request)?;
        self.invoke_app(ctx, channel, request).await
    }

    /// Invoke a method on an actor hosted by the local application.
    pub async fn call_actor(
        &self,
        ctx: &Context,
        request: InternalInvokeRequest,
    ) -> Result<InternalInvokeResponse, InvokeError> {
        let channel = self.app_channel()?;
        let request = InvocationRequest::from_internal(request)?;
        if !request.actor().is_some_and(|actor| actor.is_complete()) {
            return Err(InvokeError::MalformedRequest(
                "actor type and id are required".to_string(),
            ));
        }
        self.invoke_app(ctx, channel, request).await
    }

    /// Invoke a method on a peer service through direct messaging.
    pub async fn invoke_service(
        &self,
        ctx: &Context,
        request: InvokeServiceRequest,
    ) -> Result<InvokeResponse, InvokeError> {
        let messaging = self
            .direct_messaging
            .as_ref()
            .ok_or(InvokeError::ChannelUnavailable("direct messaging"))?;

        if request.id.is_empty() {
            return Err(InvokeError::MalformedRequest(
                "target app id is required".to_string(),
            ));
        }
        let message = request.message.ok_or_else(|| {
            InvokeError::MalformedRequest("missing invoke request message".to_string())
        })?;
        let invocation = InvocationRequest::from_invoke_request(message)?
            .with_metadata(ctx.metadata().clone());
        let invocation = with_trace_context(ctx, invocation);

        debug!(
            target_app = %request.id,
            method = %invocation.method(),
            "invoking remote service"
        );
        let result = ctx
            .guard(messaging.invoke(ctx, &request.id, invocation))
            .await?
            .map_err(|e| {
                warn!(target_app = %request.id, error = %e, "direct messaging failed");
                InvokeError::from(e)
            })?;

        let status = translate(&result, result.origin());
        if status.is_ok() {
            return Ok(result.payload().to_invoke_response());
        }

        debug!(target_app = %request.id, status = %status, "remote service returned an error");
        Err(match result.origin() {
            Interpretation::HttpStyle => InvokeError::UpstreamHttpError(status),
            Interpretation::RpcNative => InvokeError::UpstreamRpcNative(status),
        })
    }

    fn app_channel(&self) -> Result<&Arc<dyn AppChannel>, InvokeError> {
        self.app_channel
            .as_ref()
            .ok_or(InvokeError::ChannelUnavailable("app channel"))
    }

    async fn invoke_app(
        &self,
        ctx: &Context,
        channel: &Arc<dyn AppChannel>,
        request: InvocationRequest,
    ) -> Result<InternalInvokeResponse, InvokeError> {
        let request = with_trace_context(ctx, request);

        debug!(
            method = %request.method(),
            actor = ?request.actor(),
            "invoking app channel"
        );
        let result = ctx
            .guard(channel.invoke_method(ctx, request))
            .await?
            .map_err(|e| {
                warn!(error = %e, "app channel invocation failed");
                InvokeError::from(e)
            })?;

        let status = translate(&result, result.origin());
        Ok(InternalInvokeResponse {
            status: Some(status.to_proto()),
            headers: result.headers().as_map().clone(),
            message: Some(result.payload().to_invoke_response()),
        })
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("app_channel", &self.app_channel.is_some())
            .field("direct_messaging", &self.direct_messaging.is_some())
            .finish()
    }
}

/// Copy the call's trace position into the forwarded request metadata.
fn with_trace_context(ctx: &Context, request: InvocationRequest) -> InvocationRequest {
    let span_context = ctx.span_context();
    if !span_context.is_valid() {
        return request;
    }

    let mut metadata = request.metadata().clone();
    inject_span_context(&span_context, &mut metadata);
    request.with_metadata(metadata)
}
