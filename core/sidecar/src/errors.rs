// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use sidecar_rpc::{Interrupted, Status};
use thiserror::Error;

use crate::channel::ChannelError;

/// Failure of an invocation entry point
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("{0} is not ready")]
    ChannelUnavailable(&'static str),
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    #[error("upstream error: {0}")]
    UpstreamUnknown(String),
    #[error("upstream http error: {0}")]
    UpstreamHttpError(Status),
    #[error("upstream status: {0}")]
    UpstreamRpcNative(Status),
    #[error("call cancelled")]
    CallCancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl From<InvokeError> for Status {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::ChannelUnavailable(_) => Status::internal(err.to_string()),
            InvokeError::MalformedRequest(msg) => Status::invalid_argument(msg),
            InvokeError::UpstreamUnknown(msg) => Status::unknown(msg),
            InvokeError::UpstreamHttpError(status) | InvokeError::UpstreamRpcNative(status) => {
                status
            }
            InvokeError::CallCancelled => Status::cancelled("call cancelled"),
            InvokeError::DeadlineExceeded => Status::deadline_exceeded("deadline exceeded"),
        }
    }
}

impl From<Interrupted> for InvokeError {
    fn from(interrupted: Interrupted) -> Self {
        match interrupted {
            Interrupted::Cancelled => InvokeError::CallCancelled,
            Interrupted::DeadlineExceeded => InvokeError::DeadlineExceeded,
        }
    }
}

impl From<ChannelError> for InvokeError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Status(status) => InvokeError::UpstreamRpcNative(status),
            ChannelError::Transport(msg) => InvokeError::UpstreamUnknown(msg),
        }
    }
}
