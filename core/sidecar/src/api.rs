// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Method names exposed by the sidecar and their registration on a
//! [`ServerBuilder`].

use std::sync::Arc;

use sidecar_rpc::{Context, ServerBuilder, Status};

use crate::components::ComponentApi;
use crate::proto::{
    DeleteStateEnvelope, GetSecretEnvelope, GetStateEnvelope, InternalInvokeRequest,
    InvokeBindingEnvelope, InvokeServiceRequest, PublishEventEnvelope, SaveStateEnvelope,
};
use crate::router::Router;

pub const CALL_LOCAL: &str = "internal.v1.ServiceInvocation/CallLocal";
pub const CALL_ACTOR: &str = "internal.v1.ServiceInvocation/CallActor";
pub const INVOKE_SERVICE: &str = "dapr.v1.Dapr/InvokeService";
pub const PUBLISH_EVENT: &str = "dapr.v1.Dapr/PublishEvent";
pub const INVOKE_BINDING: &str = "dapr.v1.Dapr/InvokeBinding";
pub const GET_STATE: &str = "dapr.v1.Dapr/GetState";
pub const SAVE_STATE: &str = "dapr.v1.Dapr/SaveState";
pub const DELETE_STATE: &str = "dapr.v1.Dapr/DeleteState";
pub const GET_SECRET: &str = "dapr.v1.Dapr/GetSecret";

/// Register the invocation methods backed by `router`.
pub fn register_invocation(builder: ServerBuilder, router: Arc<Router>) -> ServerBuilder {
    let local = Arc::clone(&router);
    let actor = Arc::clone(&router);
    let service = router;

    builder
        .register_unary(CALL_LOCAL, move |req: InternalInvokeRequest, ctx: Context| {
            let router = Arc::clone(&local);
            async move { router.call_local(&ctx, req).await.map_err(Status::from) }
        })
        .register_unary(CALL_ACTOR, move |req: InternalInvokeRequest, ctx: Context| {
            let router = Arc::clone(&actor);
            async move { router.call_actor(&ctx, req).await.map_err(Status::from) }
        })
        .register_unary(INVOKE_SERVICE, move |req: InvokeServiceRequest, ctx: Context| {
            let router = Arc::clone(&service);
            async move { router.invoke_service(&ctx, req).await.map_err(Status::from) }
        })
}

/// Register the component pass-through methods backed by `components`.
pub fn register_components(builder: ServerBuilder, components: Arc<ComponentApi>) -> ServerBuilder {
    let publish = Arc::clone(&components);
    let binding = Arc::clone(&components);
    let get = Arc::clone(&components);
    let save = Arc::clone(&components);
    let delete = Arc::clone(&components);
    let secret = components;

    builder
        .register_unary(PUBLISH_EVENT, move |req: PublishEventEnvelope, ctx: Context| {
            let api = Arc::clone(&publish);
            async move { api.publish_event(&ctx, req).await }
        })
        .register_unary(INVOKE_BINDING, move |req: InvokeBindingEnvelope, ctx: Context| {
            let api = Arc::clone(&binding);
            async move { api.invoke_binding(&ctx, req).await }
        })
        .register_unary(GET_STATE, move |req: GetStateEnvelope, ctx: Context| {
            let api = Arc::clone(&get);
            async move { api.get_state(&ctx, req).await }
        })
        .register_unary(SAVE_STATE, move |req: SaveStateEnvelope, ctx: Context| {
            let api = Arc::clone(&save);
            async move { api.save_state(&ctx, req).await }
        })
        .register_unary(DELETE_STATE, move |req: DeleteStateEnvelope, ctx: Context| {
            let api = Arc::clone(&delete);
            async move { api.delete_state(&ctx, req).await }
        })
        .register_unary(GET_SECRET, move |req: GetSecretEnvelope, ctx: Context| {
            let api = Arc::clone(&secret);
            async move { api.get_secret(&ctx, req).await }
        })
}
