// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Compact trace identity carried across process boundaries.
//!
//! The string form is `"<spanIDHex>;<traceIDHex>;<traceOptionsDecimal>"`. It is
//! meant for downstream applications that only see a generic payload and
//! cannot read call metadata.

use std::fmt;

use opentelemetry::trace::{
    SpanContext as OtelSpanContext, SpanId, TraceFlags, TraceId, TraceState,
};

const FIELD_SEPARATOR: char = ';';
const SPAN_ID_HEX_LEN: usize = 16;
const TRACE_ID_HEX_LEN: usize = 32;

/// Trace options bit marking the span as sampled.
pub const SAMPLED_FLAG: u8 = 0x01;

/// Position of a call inside a distributed trace.
///
/// The zero value is the root context: no parent, not sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanContext {
    span_id: [u8; 8],
    trace_id: [u8; 16],
    trace_options: u8,
}

impl SpanContext {
    pub fn new(span_id: [u8; 8], trace_id: [u8; 16], trace_options: u8) -> Self {
        Self {
            span_id,
            trace_id,
            trace_options,
        }
    }

    pub fn span_id(&self) -> [u8; 8] {
        self.span_id
    }

    pub fn trace_id(&self) -> [u8; 16] {
        self.trace_id
    }

    pub fn trace_options(&self) -> u8 {
        self.trace_options
    }

    pub fn span_id_hex(&self) -> String {
        SpanId::from_bytes(self.span_id).to_string()
    }

    pub fn trace_id_hex(&self) -> String {
        TraceId::from_bytes(self.trace_id).to_string()
    }

    /// Both identifiers are non-zero.
    pub fn is_valid(&self) -> bool {
        self.span_id != [0; 8] && self.trace_id != [0; 16]
    }

    pub fn is_zero(&self) -> bool {
        *self == SpanContext::default()
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_options & SAMPLED_FLAG == SAMPLED_FLAG
    }

    /// Serialize into the compact `span;trace;options` form.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.span_id_hex(),
            self.trace_id_hex(),
            self.trace_options,
            sep = FIELD_SEPARATOR
        )
    }

    /// Parse the compact form. Never fails: anything unparseable yields the
    /// zero value.
    pub fn decode(encoded: &str) -> SpanContext {
        Self::try_decode(encoded).unwrap_or_default()
    }

    fn try_decode(encoded: &str) -> Option<SpanContext> {
        let mut fields = encoded.split(FIELD_SEPARATOR);
        let span = fields.next()?;
        let trace = fields.next()?;
        let options = fields.next()?;
        if fields.next().is_some() {
            return None;
        }

        if !is_hex_of_len(span, SPAN_ID_HEX_LEN) || !is_hex_of_len(trace, TRACE_ID_HEX_LEN) {
            return None;
        }
        if options.is_empty() || !options.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let span_id = SpanId::from_hex(span).ok()?;
        let trace_id = TraceId::from_hex(trace).ok()?;
        let trace_options = options.parse::<u8>().ok()?;

        Some(SpanContext {
            span_id: span_id.to_bytes(),
            trace_id: trace_id.to_bytes(),
            trace_options,
        })
    }

    /// Convert into an OpenTelemetry span context flagged as remote.
    pub fn to_otel(&self) -> OtelSpanContext {
        OtelSpanContext::new(
            TraceId::from_bytes(self.trace_id),
            SpanId::from_bytes(self.span_id),
            TraceFlags::new(self.trace_options),
            true,
            TraceState::default(),
        )
    }
}

impl From<&OtelSpanContext> for SpanContext {
    fn from(sc: &OtelSpanContext) -> Self {
        SpanContext {
            span_id: sc.span_id().to_bytes(),
            trace_id: sc.trace_id().to_bytes(),
            trace_options: sc.trace_flags().to_u8(),
        }
    }
}

impl fmt::Display for SpanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn is_hex_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_hexdigit())
}
