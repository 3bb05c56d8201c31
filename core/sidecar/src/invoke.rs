// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Invocation requests and results exchanged with the downstream
//! collaborators.

use bytes::Bytes;
use sidecar_rpc::details::{AnyProto, DetailRecord};
use sidecar_rpc::{Metadata, Status};

use crate::errors::InvokeError;
use crate::proto::{ApiVersion, InternalInvokeRequest, InvokeRequest, InvokeResponse};

/// How the numeric code of a result must be read.
///
/// Stamped by the collaborator that produced the result. The value of the
/// code alone never decides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interpretation {
    /// HTTP status code from an HTTP-class application channel
    HttpStyle,
    /// Canonical RPC status code
    RpcNative,
}

/// Raw body plus its content type
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    data: Bytes,
    content_type: String,
}

impl Payload {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn from_any(data: Option<AnyProto>, content_type: String) -> Self {
        Self {
            data: data.map(|any| Bytes::from(any.value)).unwrap_or_default(),
            content_type,
        }
    }

    fn to_any(&self) -> Option<AnyProto> {
        if self.data.is_empty() {
            return None;
        }
        Some(AnyProto {
            type_url: String::new(),
            value: self.data.to_vec(),
        })
    }

    pub fn to_invoke_response(&self) -> InvokeResponse {
        InvokeResponse {
            data: self.to_any(),
            content_type: self.content_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorTarget {
    actor_type: String,
    actor_id: String,
}

impl ActorTarget {
    pub fn new(actor_type: impl Into<String>, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type: actor_type.into(),
            actor_id: actor_id.into(),
        }
    }

    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn is_complete(&self) -> bool {
        !self.actor_type.is_empty() && !self.actor_id.is_empty()
    }
}

/// A call to hand to a collaborator. Built once, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    method: String,
    actor: Option<ActorTarget>,
    metadata: Metadata,
    payload: Payload,
}

impl InvocationRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            actor: None,
            metadata: Metadata::new(),
            payload: Payload::default(),
        }
    }

    pub fn with_actor(
        mut self,
        actor_type: impl Into<String>,
        actor_id: impl Into<String>,
    ) -> Self {
        self.actor = Some(ActorTarget::new(actor_type, actor_id));
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn actor(&self) -> Option<&ActorTarget> {
        self.actor.as_ref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Parse the internal invocation envelope.
    pub fn from_internal(proto: InternalInvokeRequest) -> Result<Self, InvokeError> {
        match ApiVersion::try_from(proto.ver) {
            Ok(ApiVersion::V1) => {}
            _ => {
                return Err(InvokeError::MalformedRequest(format!(
                    "unsupported api version: {}",
                    proto.ver
                )));
            }
        }

        let message = proto.message.ok_or_else(|| {
            InvokeError::MalformedRequest("missing invoke request message".to_string())
        })?;

        let mut request = Self::from_invoke_request(message)?;
        request.metadata = Metadata::from_map(proto.metadata);
        request.actor = proto
            .actor
            .map(|actor| ActorTarget::new(actor.actor_type, actor.actor_id));
        Ok(request)
    }

    /// Parse the public invoke request.
    pub fn from_invoke_request(proto: InvokeRequest) -> Result<Self, InvokeError> {
        if proto.method.is_empty() {
            return Err(InvokeError::MalformedRequest(
                "method name is required".to_string(),
            ));
        }

        Ok(Self::new(proto.method).with_payload(Payload::from_any(proto.data, proto.content_type)))
    }
}

/// What a collaborator returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    code: i32,
    message: String,
    details: Vec<DetailRecord>,
    payload: Payload,
    headers: Metadata,
    origin: Interpretation,
}

impl InvocationResult {
    pub fn new(code: i32, message: impl Into<String>, origin: Interpretation) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
            payload: Payload::default(),
            headers: Metadata::new(),
            origin,
        }
    }

    /// Result of an HTTP-class application reply
    pub fn http(code: u16) -> Self {
        Self::new(i32::from(code), "", Interpretation::HttpStyle)
    }

    /// Result already expressed as an RPC status
    pub fn rpc(status: Status) -> Self {
        Self::new(status.code().as_i32(), status.message(), Interpretation::RpcNative)
            .with_details(status.details().to_vec())
    }

    pub fn with_details(mut self, details: Vec<DetailRecord>) -> Self {
        self.details = details;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_headers(mut self, headers: Metadata) -> Self {
        self.headers = headers;
        self
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &[DetailRecord] {
        &self.details
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn headers(&self) -> &Metadata {
        &self.headers
    }

    pub fn origin(&self) -> Interpretation {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::Actor;
    use sidecar_rpc::Code;
    use std::collections::HashMap;

    fn internal_request() -> InternalInvokeRequest {
        InternalInvokeRequest {
            ver: ApiVersion::V1 as i32,
            metadata: HashMap::from([("X-Custom".to_string(), "1".to_string())]),
            message: Some(InvokeRequest {
                method: "method".to_string(),
                data: Some(AnyProto {
                    type_url: String::new(),
                    value: b"body".to_vec(),
                }),
                content_type: "text/plain".to_string(),
            }),
            actor: Some(Actor {
                actor_type: "test-actor".to_string(),
                actor_id: "actor-1".to_string(),
            }),
        }
    }

    #[test]
    fn test_from_internal() {
        let request = InvocationRequest::from_internal(internal_request()).unwrap();
        assert_eq!(request.method(), "method");
        assert_eq!(request.metadata().get("x-custom"), Some("1"));
        assert_eq!(request.payload().data().as_ref(), b"body");
        assert_eq!(request.payload().content_type(), "text/plain");

        let actor = request.actor().unwrap();
        assert_eq!(actor.actor_type(), "test-actor");
        assert_eq!(actor.actor_id(), "actor-1");
        assert!(actor.is_complete());
    }

    #[test]
    fn test_from_internal_rejects_bad_envelopes() {
        let mut unversioned = internal_request();
        unversioned.ver = ApiVersion::Unspecified as i32;
        assert!(matches!(
            InvocationRequest::from_internal(unversioned),
            Err(InvokeError::MalformedRequest(_))
        ));

        let mut no_message = internal_request();
        no_message.message = None;
        assert!(matches!(
            InvocationRequest::from_internal(no_message),
            Err(InvokeError::MalformedRequest(_))
        ));

        let mut no_method = internal_request();
        if let Some(message) = no_method.message.as_mut() {
            message.method.clear();
        }
        assert!(matches!(
            InvocationRequest::from_internal(no_method),
            Err(InvokeError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_result_constructors() {
        let http = InvocationResult::http(404);
        assert_eq!(http.code(), 404);
        assert_eq!(http.origin(), Interpretation::HttpStyle);

        let status = Status::unimplemented("Unimplemented")
            .with_detail(DetailRecord::resource_info("sidecar", "invoke/service", "Dapr"));
        let rpc = InvocationResult::rpc(status);
        assert_eq!(rpc.code(), Code::Unimplemented.as_i32());
        assert_eq!(rpc.message(), "Unimplemented");
        assert_eq!(rpc.details().len(), 1);
        assert_eq!(rpc.origin(), Interpretation::RpcNative);
    }
}
