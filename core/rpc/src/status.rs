// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Canonical RPC status codes and the outgoing status
//!
//! This module provides gRPC-compatible status codes and a status type that
//! carries an ordered list of structured detail records.

use std::fmt;

use bytes::Bytes;
use prost::Message;

use crate::details::{DetailRecord, RpcStatusProto};

/// gRPC status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Code {
    /// Success
    #[default]
    Ok = 0,
    /// The operation was cancelled
    Cancelled = 1,
    /// Unknown error
    Unknown = 2,
    /// Client specified an invalid argument
    InvalidArgument = 3,
    /// Deadline expired before operation could complete
    DeadlineExceeded = 4,
    /// Some requested entity was not found
    NotFound = 5,
    /// Some entity that we attempted to create already exists
    AlreadyExists = 6,
    /// The caller does not have permission to execute the specified operation
    PermissionDenied = 7,
    /// Some resource has been exhausted
    ResourceExhausted = 8,
    /// The system is not in a state required for the operation's execution
    FailedPrecondition = 9,
    /// The operation was aborted
    Aborted = 10,
    /// Operation was attempted past the valid range
    OutOfRange = 11,
    /// Operation is not implemented or not supported
    Unimplemented = 12,
    /// Internal errors
    Internal = 13,
    /// The service is currently unavailable
    Unavailable = 14,
    /// Unrecoverable data loss or corruption
    DataLoss = 15,
    /// The request does not have valid authentication credentials
    Unauthenticated = 16,
}

impl Code {
    /// Returns true if this is a success code
    pub fn is_ok(&self) -> bool {
        matches!(self, Code::Ok)
    }

    /// Returns true if this is an error code
    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Convert from i32
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Code::Ok),
            1 => Some(Code::Cancelled),
            2 => Some(Code::Unknown),
            3 => Some(Code::InvalidArgument),
            4 => Some(Code::DeadlineExceeded),
            5 => Some(Code::NotFound),
            6 => Some(Code::AlreadyExists),
            7 => Some(Code::PermissionDenied),
            8 => Some(Code::ResourceExhausted),
            9 => Some(Code::FailedPrecondition),
            10 => Some(Code::Aborted),
            11 => Some(Code::OutOfRange),
            12 => Some(Code::Unimplemented),
            13 => Some(Code::Internal),
            14 => Some(Code::Unavailable),
            15 => Some(Code::DataLoss),
            16 => Some(Code::Unauthenticated),
            _ => None,
        }
    }

    /// Convert to i32
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Get the string representation of this code
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Cancelled => "CANCELLED",
            Code::Unknown => "UNKNOWN",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Aborted => "ABORTED",
            Code::OutOfRange => "OUT_OF_RANGE",
            Code::Unimplemented => "UNIMPLEMENTED",
            Code::Internal => "INTERNAL",
            Code::Unavailable => "UNAVAILABLE",
            Code::DataLoss => "DATA_LOSS",
            Code::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// Human readable reason phrase, e.g. "Not Found"
    pub fn description(&self) -> &'static str {
        match self {
            Code::Ok => "OK",
            Code::Cancelled => "Cancelled",
            Code::Unknown => "Unknown",
            Code::InvalidArgument => "Invalid Argument",
            Code::DeadlineExceeded => "Deadline Exceeded",
            Code::NotFound => "Not Found",
            Code::AlreadyExists => "Already Exists",
            Code::PermissionDenied => "Permission Denied",
            Code::ResourceExhausted => "Resource Exhausted",
            Code::FailedPrecondition => "Failed Precondition",
            Code::Aborted => "Aborted",
            Code::OutOfRange => "Out Of Range",
            Code::Unimplemented => "Unimplemented",
            Code::Internal => "Internal",
            Code::Unavailable => "Unavailable",
            Code::DataLoss => "Data Loss",
            Code::Unauthenticated => "Unauthenticated",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Code> for i32 {
    fn from(code: Code) -> i32 {
        code.as_i32()
    }
}

impl From<Code> for tonic::Code {
    fn from(code: Code) -> Self {
        tonic::Code::from_i32(code.as_i32())
    }
}

impl From<tonic::Code> for Code {
    fn from(code: tonic::Code) -> Self {
        Code::from_i32(code as i32).unwrap_or(Code::Unknown)
    }
}

/// RPC status with code, message and structured details
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    /// Status code
    code: Code,
    /// Status message, empty when not set
    message: String,
    /// Ordered detail records
    details: Vec<DetailRecord>,
}

impl Status {
    /// Create a new status
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Create a status with just a code
    pub fn with_code(code: Code) -> Self {
        Self::new(code, String::new())
    }

    /// Create a success status
    pub fn ok() -> Self {
        Self::with_code(Code::Ok)
    }

    /// Create a cancelled status
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(Code::Cancelled, message)
    }

    /// Create an unknown error status
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Code::Unknown, message)
    }

    /// Create an invalid argument status
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    /// Create a deadline exceeded status
    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(Code::DeadlineExceeded, message)
    }

    /// Create a not found status
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    /// Create a permission denied status
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(Code::PermissionDenied, message)
    }

    /// Create a failed precondition status
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(Code::FailedPrecondition, message)
    }

    /// Create an unimplemented status
    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::new(Code::Unimplemented, message)
    }

    /// Create an internal error status
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// Create an unavailable status
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    /// Get the status code
    pub fn code(&self) -> Code {
        self.code
    }

    /// Get the status message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the status details
    pub fn details(&self) -> &[DetailRecord] {
        &self.details
    }

    /// Replace the details
    pub fn with_details(mut self, details: Vec<DetailRecord>) -> Self {
        self.details = details;
        self
    }

    /// Append one detail record
    pub fn with_detail(mut self, detail: DetailRecord) -> Self {
        self.details.push(detail);
        self
    }

    /// Returns true if this is a success status
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }

    /// Returns true if this is an error status
    pub fn is_err(&self) -> bool {
        self.code.is_err()
    }

    /// Wire form (`google.rpc.Status`)
    pub fn to_proto(&self) -> RpcStatusProto {
        RpcStatusProto {
            code: self.code.as_i32(),
            message: self.message.clone(),
            details: self.details.iter().map(DetailRecord::to_any).collect(),
        }
    }

    /// Parse the wire form. Unknown codes become `Unknown`, keeping message
    /// and details.
    pub fn from_proto(proto: RpcStatusProto) -> Self {
        Self {
            code: Code::from_i32(proto.code).unwrap_or(Code::Unknown),
            message: proto.message,
            details: proto.details.into_iter().map(DetailRecord::from_any).collect(),
        }
    }

    /// Encode the details as the binary `google.rpc.Status` carried in the
    /// `grpc-status-details-bin` trailer.
    pub fn encode_details(&self) -> Bytes {
        Bytes::from(self.to_proto().encode_to_vec())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status {{ code: {}", self.code)?;
        if !self.message.is_empty() {
            write!(f, ", message: \"{}\"", self.message)?;
        }
        if !self.details.is_empty() {
            write!(f, ", details: {}", self.details.len())?;
        }
        write!(f, " }}")
    }
}

impl std::error::Error for Status {}

impl From<Code> for Status {
    fn from(code: Code) -> Self {
        Self::with_code(code)
    }
}

impl From<Status> for tonic::Status {
    fn from(status: Status) -> Self {
        if status.details.is_empty() {
            return tonic::Status::new(status.code.into(), status.message);
        }
        let details = status.encode_details();
        tonic::Status::with_details(status.code.into(), status.message, details)
    }
}

impl From<tonic::Status> for Status {
    fn from(status: tonic::Status) -> Self {
        let details = if status.details().is_empty() {
            Vec::new()
        } else {
            match RpcStatusProto::decode(status.details()) {
                Ok(proto) => proto
                    .details
                    .into_iter()
                    .map(DetailRecord::from_any)
                    .collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping undecodable status details");
                    Vec::new()
                }
            }
        };

        Status::new(status.code().into(), status.message()).with_details(details)
    }
}
