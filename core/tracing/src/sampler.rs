// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use opentelemetry::trace::{SpanId, TraceId};
use opentelemetry_sdk::trace::{IdGenerator, RandomIdGenerator};

use crate::span_context::{SAMPLED_FLAG, SpanContext};

/// Probabilistic root-span sampler.
///
/// Calls that arrive with a parent context always continue it; the rate only
/// decides whether a call without a parent starts a new sampled trace.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    rate: f64,
    ids: RandomIdGenerator,
}

impl Sampler {
    /// Create a sampler. Rates outside [0, 1] are clamped and NaN counts as 0.
    pub fn new(rate: f64) -> Self {
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        Self {
            rate,
            ids: RandomIdGenerator::default(),
        }
    }

    pub fn always() -> Self {
        Self::new(1.0)
    }

    pub fn never() -> Self {
        Self::new(0.0)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Decide whether a new root span is sampled.
    pub fn should_sample_root(&self) -> bool {
        if self.rate >= 1.0 {
            true
        } else if self.rate <= 0.0 {
            false
        } else {
            rand::random::<f64>() < self.rate
        }
    }

    /// Produce the span context for a call, continuing `parent` when it is
    /// valid. Without a parent the result is either a fresh sampled root or
    /// the zero value.
    pub fn derive(&self, parent: Option<SpanContext>) -> SpanContext {
        match parent {
            Some(parent) if parent.is_valid() => self.child_of(&parent),
            _ if self.should_sample_root() => self.new_root(),
            _ => SpanContext::default(),
        }
    }

    /// Same trace and options as the parent, fresh span id.
    pub fn child_of(&self, parent: &SpanContext) -> SpanContext {
        SpanContext::new(
            self.new_span_id(),
            parent.trace_id(),
            parent.trace_options(),
        )
    }

    /// A sampled root with fresh identifiers.
    pub fn new_root(&self) -> SpanContext {
        SpanContext::new(self.new_span_id(), self.new_trace_id(), SAMPLED_FLAG)
    }

    fn new_span_id(&self) -> [u8; 8] {
        loop {
            let id = self.ids.new_span_id();
            if id != SpanId::INVALID {
                return id.to_bytes();
            }
        }
    }

    fn new_trace_id(&self) -> [u8; 16] {
        loop {
            let id = self.ids.new_trace_id();
            if id != TraceId::INVALID {
                return id.to_bytes();
            }
        }
    }
}
