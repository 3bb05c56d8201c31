// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Trace propagation for inbound calls.
//!
//! Reads the caller's trace position from the call metadata, derives the
//! position of this call, stores it in the [`Context`] and runs the rest of
//! the chain inside an `rpc_call` span. Nothing is exported.

use futures::{FutureExt, StreamExt};
use sidecar_tracing::propagation::extract_span_context;
use sidecar_tracing::{Sampler, SpanContext};
use tracing::{Instrument, debug};

use crate::context::Context;
use crate::interceptor::{
    Interceptor, Item, ItemStream, StreamFuture, StreamHandler, UnaryFuture, UnaryHandler,
};

#[derive(Debug, Clone, Default)]
pub struct TraceInterceptor {
    sampler: Sampler,
}

impl TraceInterceptor {
    pub fn new(sampler: Sampler) -> Self {
        Self { sampler }
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Derive the span context for this call and attach it to `ctx`.
    fn start(&self, ctx: &mut Context) -> tracing::Span {
        let parent = extract_span_context(ctx.metadata());
        let span_context = self.sampler.derive(parent);

        match parent {
            Some(parent) => debug!(
                method = %ctx.method(),
                trace_id = %parent.trace_id_hex(),
                "continuing remote trace"
            ),
            None if !span_context.is_zero() => debug!(
                method = %ctx.method(),
                trace_id = %span_context.trace_id_hex(),
                "starting new trace"
            ),
            None => {}
        }

        ctx.set_span_context(span_context);
        call_span(ctx.method(), &span_context)
    }
}

fn call_span(method: &str, span_context: &SpanContext) -> tracing::Span {
    tracing::info_span!(
        "rpc_call",
        method = %method,
        trace_id = %span_context.trace_id_hex(),
        span_id = %span_context.span_id_hex(),
        sampled = span_context.is_sampled(),
    )
}

impl Interceptor for TraceInterceptor {
    fn intercept_unary(&self, request: Item, mut ctx: Context, next: UnaryHandler) -> UnaryFuture {
        let span = self.start(&mut ctx);
        next(request, ctx).instrument(span).boxed()
    }

    fn intercept_stream(
        &self,
        requests: ItemStream,
        mut ctx: Context,
        next: StreamHandler,
    ) -> StreamFuture {
        let span = self.start(&mut ctx);
        let stream_span = span.clone();
        async move {
            let mut responses = next(requests, ctx).instrument(span).await?;
            // items are produced while the caller polls, keep them in the call span
            let responses: ItemStream = futures::stream::poll_fn(move |cx| {
                let _entered = stream_span.enter();
                responses.poll_next_unpin(cx)
            })
            .boxed();
            Ok(responses)
        }
        .boxed()
    }
}
