// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Server-side invocation layer of the sidecar: routes local, actor and
//! service invocations, translates downstream results into RPC statuses and
//! passes component calls through.

pub mod api;
pub mod channel;
pub mod components;
pub mod config;
pub mod errors;
pub mod invoke;
pub mod proto;
pub mod router;
pub mod translate;

use std::sync::Arc;

use sidecar_rpc::{Server, TraceInterceptor};
use sidecar_tracing::TracingConfiguration;
use tracing::info;

pub use channel::{AppChannel, ChannelError, DirectMessaging};
pub use components::{ComponentApi, ComponentError, StateItem};
pub use config::{ConfigError, ConfigLoader, ServerConfiguration};
pub use errors::InvokeError;
pub use invoke::{Interpretation, InvocationRequest, InvocationResult, Payload};
pub use router::Router;
pub use translate::translate;

/// Assemble the sidecar server. Trace propagation runs first on every call.
pub fn build_server(
    server: &ServerConfiguration,
    tracing: &TracingConfiguration,
    router: Router,
    components: ComponentApi,
) -> Server {
    let builder = Server::builder()
        .interceptor(TraceInterceptor::new(tracing.sampler()))
        .default_timeout(server.default_timeout());
    let builder = api::register_invocation(builder, Arc::new(router));
    let builder = api::register_components(builder, Arc::new(components));

    let server_instance = builder.build();
    info!(
        app_id = %server.app_id(),
        methods = server_instance.methods().len(),
        "sidecar server ready"
    );
    server_instance
}
