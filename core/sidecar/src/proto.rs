// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Wire messages for the internal invocation service and the public API.

use std::collections::HashMap;

use sidecar_rpc::details::{AnyProto, RpcStatusProto};

/// Version of the internal invocation envelope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ApiVersion {
    Unspecified = 0,
    V1 = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvokeRequest {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(message, optional, tag = "2")]
    pub data: Option<AnyProto>,
    #[prost(string, tag = "3")]
    pub content_type: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvokeResponse {
    #[prost(message, optional, tag = "1")]
    pub data: Option<AnyProto>,
    #[prost(string, tag = "2")]
    pub content_type: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Actor {
    #[prost(string, tag = "1")]
    pub actor_type: String,
    #[prost(string, tag = "2")]
    pub actor_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InternalInvokeRequest {
    #[prost(enumeration = "ApiVersion", tag = "1")]
    pub ver: i32,
    #[prost(map = "string, string", tag = "2")]
    pub metadata: HashMap<String, String>,
    #[prost(message, optional, tag = "3")]
    pub message: Option<InvokeRequest>,
    #[prost(message, optional, tag = "4")]
    pub actor: Option<Actor>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InternalInvokeResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<RpcStatusProto>,
    #[prost(map = "string, string", tag = "2")]
    pub headers: HashMap<String, String>,
    #[prost(message, optional, tag = "3")]
    pub message: Option<InvokeResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvokeServiceRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "3")]
    pub message: Option<InvokeRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Empty {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PublishEventEnvelope {
    #[prost(string, tag = "1")]
    pub topic: String,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InvokeBindingEnvelope {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStateEnvelope {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(string, tag = "2")]
    pub key: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetStateResponseEnvelope {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    #[prost(string, tag = "2")]
    pub etag: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StateRequest {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
    #[prost(string, tag = "3")]
    pub etag: String,
    #[prost(map = "string, string", tag = "4")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SaveStateEnvelope {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(message, repeated, tag = "2")]
    pub requests: Vec<StateRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteStateEnvelope {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(string, tag = "2")]
    pub key: String,
    #[prost(string, tag = "3")]
    pub etag: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetSecretEnvelope {
    #[prost(string, tag = "1")]
    pub store_name: String,
    #[prost(string, tag = "2")]
    pub key: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetSecretResponseEnvelope {
    #[prost(map = "string, string", tag = "1")]
    pub data: HashMap<String, String>,
}
