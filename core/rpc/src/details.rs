// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Structured error detail records carried by a [`Status`](crate::Status).
//!
//! Records travel as `google.protobuf.Any` values. The known payloads are
//! `google.rpc.ErrorInfo` and `google.rpc.ResourceInfo`; anything else is kept
//! as an opaque blob and re-encoded byte for byte.

use std::collections::HashMap;

use prost::Message;

pub const ERROR_INFO_TYPE_URL: &str = "type.googleapis.com/google.rpc.ErrorInfo";
pub const RESOURCE_INFO_TYPE_URL: &str = "type.googleapis.com/google.rpc.ResourceInfo";

/// ErrorInfo metadata key holding the decimal HTTP status code.
pub const HTTP_CODE_KEY: &str = "http.code";
/// ErrorInfo metadata key holding the HTTP response body.
pub const HTTP_ERROR_MESSAGE_KEY: &str = "http.error_message";

/// `google.protobuf.Any`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct AnyProto {
    #[prost(string, tag = "1")]
    pub type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

/// `google.rpc.ErrorInfo`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ErrorInfoProto {
    #[prost(string, tag = "1")]
    pub reason: String,
    #[prost(string, tag = "2")]
    pub domain: String,
    #[prost(map = "string, string", tag = "3")]
    pub metadata: HashMap<String, String>,
}

/// `google.rpc.ResourceInfo`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ResourceInfoProto {
    #[prost(string, tag = "1")]
    pub resource_type: String,
    #[prost(string, tag = "2")]
    pub resource_name: String,
    #[prost(string, tag = "3")]
    pub owner: String,
    #[prost(string, tag = "4")]
    pub description: String,
}

/// `google.rpc.Status`
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct RpcStatusProto {
    #[prost(int32, tag = "1")]
    pub code: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(message, repeated, tag = "3")]
    pub details: Vec<AnyProto>,
}

/// One structured detail attached to a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRecord {
    /// Failure reported by an HTTP-style downstream.
    HttpErrorInfo {
        http_code: String,
        error_message: String,
    },
    /// The resource the failure relates to.
    ResourceInfo {
        resource_type: String,
        resource_name: String,
        owner: String,
    },
    /// Any other detail, kept verbatim.
    Opaque { type_url: String, value: Vec<u8> },
}

impl DetailRecord {
    pub fn http_error(http_code: impl Into<String>, error_message: impl Into<String>) -> Self {
        DetailRecord::HttpErrorInfo {
            http_code: http_code.into(),
            error_message: error_message.into(),
        }
    }

    pub fn resource_info(
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        DetailRecord::ResourceInfo {
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
            owner: owner.into(),
        }
    }

    pub fn type_url(&self) -> &str {
        match self {
            DetailRecord::HttpErrorInfo { .. } => ERROR_INFO_TYPE_URL,
            DetailRecord::ResourceInfo { .. } => RESOURCE_INFO_TYPE_URL,
            DetailRecord::Opaque { type_url, .. } => type_url,
        }
    }

    /// Encode as `google.protobuf.Any`.
    pub fn to_any(&self) -> AnyProto {
        let value = match self {
            DetailRecord::HttpErrorInfo {
                http_code,
                error_message,
            } => {
                let mut metadata = HashMap::with_capacity(2);
                metadata.insert(HTTP_CODE_KEY.to_string(), http_code.clone());
                metadata.insert(HTTP_ERROR_MESSAGE_KEY.to_string(), error_message.clone());
                ErrorInfoProto {
                    reason: String::new(),
                    domain: String::new(),
                    metadata,
                }
                .encode_to_vec()
            }
            DetailRecord::ResourceInfo {
                resource_type,
                resource_name,
                owner,
            } => ResourceInfoProto {
                resource_type: resource_type.clone(),
                resource_name: resource_name.clone(),
                owner: owner.clone(),
                description: String::new(),
            }
            .encode_to_vec(),
            DetailRecord::Opaque { value, .. } => value.clone(),
        };

        AnyProto {
            type_url: self.type_url().to_string(),
            value,
        }
    }

    /// Decode from `google.protobuf.Any`. Payloads that do not match one of
    /// the known shapes exactly are kept as [`DetailRecord::Opaque`].
    pub fn from_any(any: AnyProto) -> Self {
        let known = match any.type_url.as_str() {
            ERROR_INFO_TYPE_URL => ErrorInfoProto::decode(any.value.as_slice())
                .ok()
                .and_then(http_error_from_info),
            RESOURCE_INFO_TYPE_URL => ResourceInfoProto::decode(any.value.as_slice())
                .ok()
                .filter(|info| info.description.is_empty())
                .map(|info| DetailRecord::ResourceInfo {
                    resource_type: info.resource_type,
                    resource_name: info.resource_name,
                    owner: info.owner,
                }),
            _ => None,
        };

        known.unwrap_or(DetailRecord::Opaque {
            type_url: any.type_url,
            value: any.value,
        })
    }
}

fn http_error_from_info(mut info: ErrorInfoProto) -> Option<DetailRecord> {
    if !info.reason.is_empty() || !info.domain.is_empty() || info.metadata.len() != 2 {
        return None;
    }
    let http_code = info.metadata.remove(HTTP_CODE_KEY)?;
    let error_message = info.metadata.remove(HTTP_ERROR_MESSAGE_KEY)?;
    Some(DetailRecord::HttpErrorInfo {
        http_code,
        error_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_any() {
        let record = DetailRecord::http_error("404", "fakeDirectMessageResponse");
        let any = record.to_any();
        assert_eq!(any.type_url, ERROR_INFO_TYPE_URL);

        let info = ErrorInfoProto::decode(any.value.as_slice()).unwrap();
        assert_eq!(info.metadata.get(HTTP_CODE_KEY).unwrap(), "404");
        assert_eq!(
            info.metadata.get(HTTP_ERROR_MESSAGE_KEY).unwrap(),
            "fakeDirectMessageResponse"
        );

        assert_eq!(DetailRecord::from_any(any), record);
    }

    #[test]
    fn test_resource_info_any() {
        let record = DetailRecord::resource_info("sidecar", "invoke/service", "Dapr");
        let any = record.to_any();
        assert_eq!(any.type_url, RESOURCE_INFO_TYPE_URL);
        assert_eq!(DetailRecord::from_any(any), record);
    }

    #[test]
    fn test_unknown_type_url_is_opaque() {
        let any = AnyProto {
            type_url: "type.googleapis.com/google.rpc.RetryInfo".to_string(),
            value: vec![0x0a, 0x02, 0x08, 0x05],
        };
        let record = DetailRecord::from_any(any.clone());
        assert!(matches!(record, DetailRecord::Opaque { .. }));
        assert_eq!(record.to_any(), any);
    }

    #[test]
    fn test_foreign_error_info_is_opaque() {
        let info = ErrorInfoProto {
            reason: "QUOTA".to_string(),
            domain: "example.com".to_string(),
            metadata: HashMap::new(),
        };
        let any = AnyProto {
            type_url: ERROR_INFO_TYPE_URL.to_string(),
            value: info.encode_to_vec(),
        };
        let record = DetailRecord::from_any(any.clone());
        assert!(matches!(record, DetailRecord::Opaque { .. }));
        assert_eq!(record.to_any(), any);
    }

    #[test]
    fn test_garbage_payload_is_opaque() {
        let any = AnyProto {
            type_url: RESOURCE_INFO_TYPE_URL.to_string(),
            value: vec![0xff, 0xff, 0xff],
        };
        assert!(matches!(
            DetailRecord::from_any(any),
            DetailRecord::Opaque { .. }
        ));
    }
}
