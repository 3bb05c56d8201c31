// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Reading and writing trace context through string key/value carriers.
//!
//! Two encodings are understood: the W3C `traceparent` header, handled by the
//! OpenTelemetry trace-context propagator, and the compact
//! [`SpanContext::encode`] form under [`TRACE_CONTEXT_KEY`].

use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry_sdk::propagation::TraceContextPropagator;

use crate::span_context::SpanContext;

pub const TRACEPARENT_KEY: &str = "traceparent";
pub const TRACE_CONTEXT_KEY: &str = "trace-context";

/// Extract the parent span context from a carrier. `traceparent` wins over
/// the compact form; `None` when neither yields a valid context.
pub fn extract_span_context(extractor: &dyn Extractor) -> Option<SpanContext> {
    let propagator = TraceContextPropagator::new();
    let cx = propagator.extract(extractor);
    let span = cx.span();
    let otel = span.span_context();
    if otel.is_valid() {
        return Some(SpanContext::from(otel));
    }

    extractor
        .get(TRACE_CONTEXT_KEY)
        .map(SpanContext::decode)
        .filter(SpanContext::is_valid)
}

/// Write the span context into a carrier using both encodings. The zero
/// value is not written.
pub fn inject_span_context(span_context: &SpanContext, injector: &mut dyn Injector) {
    if !span_context.is_valid() {
        return;
    }

    let propagator = TraceContextPropagator::new();
    let cx = opentelemetry::Context::new().with_remote_span_context(span_context.to_otel());
    propagator.inject_context(&cx, injector);
    injector.set(TRACE_CONTEXT_KEY, span_context.encode());
}
