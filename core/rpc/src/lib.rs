// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Call plumbing shared by every sidecar API: status model, call context,
//! metadata, interceptor chain, trace propagation and the method registry.

pub mod context;
pub mod details;
pub mod interceptor;
pub mod metadata;
pub mod server;
pub mod status;
pub mod trace_interceptor;

pub use context::{Context, DEADLINE_KEY, Interrupted};
pub use details::DetailRecord;
pub use interceptor::{Interceptor, InterceptorChain, ItemStream};
pub use metadata::Metadata;
pub use server::{Server, ServerBuilder};
pub use status::{Code, Status};
pub use trace_interceptor::TraceInterceptor;
