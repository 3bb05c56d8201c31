// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Maps downstream results onto the outgoing RPC status.

use http::StatusCode;
use sidecar_rpc::{Code, DetailRecord, Status};

use crate::invoke::{Interpretation, InvocationResult};

/// Translate a downstream result. Pure: the output depends only on the
/// arguments.
///
/// `RpcNative` results keep their code, message and details. `HttpStyle`
/// results map the HTTP code to an RPC code and, on failure, carry exactly one
/// [`DetailRecord::HttpErrorInfo`].
pub fn translate(result: &InvocationResult, interpretation: Interpretation) -> Status {
    match interpretation {
        Interpretation::RpcNative => translate_rpc(result),
        Interpretation::HttpStyle => translate_http(result),
    }
}

fn translate_rpc(result: &InvocationResult) -> Status {
    let code = Code::from_i32(result.code()).unwrap_or(Code::Unknown);
    Status::new(code, result.message()).with_details(result.details().to_vec())
}

fn translate_http(result: &InvocationResult) -> Status {
    let http_code = result.code();
    if (200..300).contains(&http_code) {
        return Status::ok();
    }

    let code = code_from_http(http_code);
    // message is the HTTP reason phrase ("Not Found"), not the RPC code
    // phrase; the RPC phrase is used only when HTTP has no reason for the code
    let message = u16::try_from(http_code)
        .ok()
        .and_then(|c| StatusCode::from_u16(c).ok())
        .and_then(|c| c.canonical_reason())
        .unwrap_or_else(|| code.description());

    let payload = result.payload();
    let error_message = if is_textual(payload.content_type()) {
        String::from_utf8_lossy(payload.data()).into_owned()
    } else {
        String::new()
    };

    Status::new(code, message).with_detail(DetailRecord::http_error(
        http_code.to_string(),
        error_message,
    ))
}

/// Fixed HTTP to RPC code table. Anything not listed is `Unknown`.
pub fn code_from_http(http_code: i32) -> Code {
    match http_code {
        200..=299 => Code::Ok,
        400 => Code::InvalidArgument,
        401 => Code::Unauthenticated,
        403 => Code::PermissionDenied,
        404 => Code::NotFound,
        408 => Code::DeadlineExceeded,
        409 => Code::AlreadyExists,
        412 => Code::FailedPrecondition,
        416 => Code::OutOfRange,
        429 => Code::ResourceExhausted,
        499 => Code::Cancelled,
        500 => Code::Internal,
        501 => Code::Unimplemented,
        503 => Code::Unavailable,
        504 => Code::DeadlineExceeded,
        _ => Code::Unknown,
    }
}

fn is_textual(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.is_empty()
        || essence.starts_with("text/")
        || essence.ends_with("json")
        || essence.ends_with("xml")
        || essence == "application/x-www-form-urlencoded"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::Payload;

    fn http_result(code: u16, body: &'static str, content_type: &str) -> InvocationResult {
        InvocationResult::http(code).with_payload(Payload::new(body, content_type))
    }

    #[test]
    fn test_http_not_found() {
        let result = http_result(404, "fakeDirectMessageResponse", "application/json");
        let status = translate(&result, Interpretation::HttpStyle);

        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "Not Found");
        assert_eq!(
            status.details(),
            &[DetailRecord::http_error("404", "fakeDirectMessageResponse")]
        );
    }

    #[test]
    fn test_http_success_has_no_details() {
        for code in [200, 201, 204, 299] {
            let result = http_result(code, "ok", "text/plain");
            let status = translate(&result, Interpretation::HttpStyle);
            assert!(status.is_ok());
            assert_eq!(status.message(), "");
            assert!(status.details().is_empty());
        }
    }

    #[test]
    fn test_http_code_table() {
        let cases = [
            (400, Code::InvalidArgument),
            (401, Code::Unauthenticated),
            (403, Code::PermissionDenied),
            (404, Code::NotFound),
            (408, Code::DeadlineExceeded),
            (409, Code::AlreadyExists),
            (412, Code::FailedPrecondition),
            (416, Code::OutOfRange),
            (429, Code::ResourceExhausted),
            (499, Code::Cancelled),
            (500, Code::Internal),
            (501, Code::Unimplemented),
            (503, Code::Unavailable),
            (504, Code::DeadlineExceeded),
            (302, Code::Unknown),
            (418, Code::Unknown),
            (502, Code::Unknown),
        ];
        for (http_code, expected) in cases {
            let status = translate(&InvocationResult::http(http_code), Interpretation::HttpStyle);
            assert_eq!(status.code(), expected, "http {}", http_code);
            assert_eq!(status.details().len(), 1, "http {}", http_code);
        }
    }

    #[test]
    fn test_http_message_falls_back_to_code_phrase() {
        let status = translate(&InvocationResult::http(499), Interpretation::HttpStyle);
        assert_eq!(status.code(), Code::Cancelled);
        assert_eq!(status.message(), "Cancelled");

        let status = translate(&InvocationResult::http(501), Interpretation::HttpStyle);
        assert_eq!(status.message(), "Not Implemented");
    }

    #[test]
    fn test_binary_body_is_not_copied() {
        let result = InvocationResult::http(500)
            .with_payload(Payload::new(vec![0xde_u8, 0xad], "application/octet-stream"));
        let status = translate(&result, Interpretation::HttpStyle);
        assert_eq!(status.details(), &[DetailRecord::http_error("500", "")]);
    }

    #[test]
    fn test_textual_content_types() {
        assert!(is_textual(""));
        assert!(is_textual("text/plain; charset=utf-8"));
        assert!(is_textual("application/json"));
        assert!(is_textual("application/problem+json"));
        assert!(is_textual("Application/XML"));
        assert!(is_textual("application/x-www-form-urlencoded"));
        assert!(!is_textual("application/octet-stream"));
        assert!(!is_textual("image/png"));
    }

    #[test]
    fn test_rpc_native_passthrough() {
        let native = Status::unimplemented("Unimplemented")
            .with_detail(DetailRecord::resource_info("sidecar", "invoke/service", "Dapr"));
        let result = InvocationResult::rpc(native.clone());
        let status = translate(&result, Interpretation::RpcNative);
        assert_eq!(status, native);
    }

    #[test]
    fn test_rpc_native_keeps_many_details_in_order() {
        let details = vec![
            DetailRecord::resource_info("a", "b", "c"),
            DetailRecord::http_error("500", "x"),
            DetailRecord::Opaque {
                type_url: "type.googleapis.com/google.rpc.RetryInfo".to_string(),
                value: vec![1, 2, 3],
            },
        ];
        let result = InvocationResult::new(13, "boom", Interpretation::RpcNative)
            .with_details(details.clone());
        let status = translate(&result, Interpretation::RpcNative);
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.details(), details.as_slice());
    }

    #[test]
    fn test_rpc_native_out_of_range_is_unknown() {
        let result = InvocationResult::new(404, "odd", Interpretation::RpcNative)
            .with_details(vec![DetailRecord::http_error("404", "")]);
        let status = translate(&result, Interpretation::RpcNative);
        assert_eq!(status.code(), Code::Unknown);
        assert_eq!(status.message(), "odd");
        assert_eq!(status.details().len(), 1);
    }

    #[test]
    fn test_rpc_native_translation_is_idempotent() {
        let result = InvocationResult::rpc(
            Status::not_found("missing").with_detail(DetailRecord::resource_info("t", "n", "o")),
        );
        let once = translate(&result, Interpretation::RpcNative);
        let twice = translate(&InvocationResult::rpc(once.clone()), Interpretation::RpcNative);
        assert_eq!(once, twice);

        let http = translate(&InvocationResult::http(404), Interpretation::HttpStyle);
        let again = translate(&InvocationResult::rpc(http.clone()), Interpretation::RpcNative);
        assert_eq!(http, again);
    }
}
