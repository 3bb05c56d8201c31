// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Context types for RPC request handling
//!
//! Every call owns a [`Context`] carrying its method path, metadata, deadline,
//! cancellation token and typed extensions (the trace position lives there).

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::Extensions;
use sidecar_tracing::SpanContext;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::metadata::Metadata;
use crate::status::Status;

/// Metadata key carrying the absolute call deadline in seconds since the
/// Unix epoch.
pub const DEADLINE_KEY: &str = "sidecar-deadline";

/// Why a guarded operation did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Interrupted {
    #[error("call cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<Interrupted> for Status {
    fn from(interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::Cancelled => Status::cancelled("call cancelled"),
            Interrupted::DeadlineExceeded => Status::deadline_exceeded("deadline exceeded"),
        }
    }
}

/// Context passed to RPC handlers and interceptors
#[derive(Debug, Clone)]
pub struct Context {
    /// Full method path, e.g. `dapr.v1.Dapr/InvokeService`
    method: String,
    /// Request metadata
    metadata: Metadata,
    /// Deadline for the call
    deadline: Option<Instant>,
    /// Cancelled when the caller goes away or the server shuts down
    cancellation: CancellationToken,
    extensions: Extensions,
}

impl Default for Context {
    fn default() -> Self {
        Self::new("")
    }
}

impl Context {
    /// Create a new context for `method` with no metadata and no deadline
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            metadata: Metadata::new(),
            deadline: None,
            cancellation: CancellationToken::new(),
            extensions: Extensions::new(),
        }
    }

    /// Attach metadata. A deadline found under [`DEADLINE_KEY`] is applied.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        if let Some(deadline) = Self::parse_deadline(&metadata) {
            self.deadline = Some(deadline);
        }
        self.metadata = metadata;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now. A timeout too large to represent leaves
    /// the call without deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Set the deadline only if the caller did not supply one
    pub fn set_default_timeout(&mut self, timeout: Duration) {
        if self.deadline.is_none() {
            self.deadline = Instant::now().checked_add(timeout);
        }
    }

    /// Get the remaining time until deadline
    pub fn remaining_time(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Check if the deadline has been exceeded
    pub fn is_deadline_exceeded(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Trace position of this call. The zero value when no trace
    /// interceptor ran or the call was not sampled.
    pub fn span_context(&self) -> SpanContext {
        self.extensions
            .get::<SpanContext>()
            .copied()
            .unwrap_or_default()
    }

    pub fn set_span_context(&mut self, span_context: SpanContext) {
        self.extensions.insert(span_context);
    }

    /// Run `fut` to completion unless the call is cancelled or its deadline
    /// passes first. On interruption `fut` is dropped.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if self.is_deadline_exceeded() {
            return Err(Interrupted::DeadlineExceeded);
        }

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(Interrupted::Cancelled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
            output = fut => Ok(output),
        }
    }

    /// Parse deadline from metadata
    fn parse_deadline(metadata: &Metadata) -> Option<Instant> {
        let seconds = metadata.get(DEADLINE_KEY)?.parse::<f64>().ok()?;
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        // values too large to represent mean no deadline
        let since_epoch = Duration::try_from_secs_f64(seconds).ok()?;
        let deadline = UNIX_EPOCH.checked_add(since_epoch)?;
        let remaining = deadline
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO);
        Instant::now().checked_add(remaining)
    }
}
