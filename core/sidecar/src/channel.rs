// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Downstream collaborators the router dispatches to.
//!
//! Implementations must tolerate concurrent calls; the router never locks
//! around them.

use async_trait::async_trait;
use sidecar_rpc::{Context, Status};
use thiserror::Error;

use crate::invoke::{InvocationRequest, InvocationResult};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// The downstream replied with an RPC status instead of a result
    #[error("{0}")]
    Status(Status),
    /// The downstream could not be reached or gave no classifiable answer
    #[error("transport error: {0}")]
    Transport(String),
}

/// The local application managed by this sidecar
#[async_trait]
pub trait AppChannel: Send + Sync {
    async fn invoke_method(
        &self,
        ctx: &Context,
        request: InvocationRequest,
    ) -> Result<InvocationResult, ChannelError>;
}

/// Reaches a peer service by its application id
#[async_trait]
pub trait DirectMessaging: Send + Sync {
    async fn invoke(
        &self,
        ctx: &Context,
        target_app_id: &str,
        request: InvocationRequest,
    ) -> Result<InvocationResult, ChannelError>;
}
