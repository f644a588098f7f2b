// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Unified status/error taxonomy shared across the wire codec, the
//! request/response bus, and the operation builders.
//!
//! Every completed [`crate::operation::Operation`] resolves to exactly one
//! [`Status`]. The core never retries a failed operation; retry policy is a
//! caller concern.

use std::fmt;

/// Closed enumeration of outcomes a Kinetic operation can resolve to.
///
/// Variants are grouped the way the spec groups them: local preconditions,
/// transport/session failures, wire integrity failures, and statuses mapped
/// from the remote device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Success,

    // Local precondition failures. Raised synchronously by a builder, or at
    // latest in the completion closure, without ever consuming a sequence
    // number.
    Invalid,
    OperationInvalid,
    BufferOverrun,
    InvalidFile,
    MemoryError,

    // Transport/session failures.
    ConnectionError,
    SocketTimeout,
    RequestRejected,

    // Wire integrity failure: HMAC mismatch or a malformed PDU.
    DataError,

    // Statuses mapped from the remote device's status code.
    RemoteVersionMismatch,
    RemoteNotFound,
    RemoteNotAuthorized,
    RemoteInternalError,
    RemoteNoSpace,
    RemoteConnectionError,
    RemoteServiceBusy,
    RemoteExpired,
    RemoteDataError,
    RemotePermissionDenied,
    RemoteClusterVersionMismatch,
    RemoteInvalidRequest,
    RemoteNestedOperationErrors,
    RemoteDeviceLocked,
    RemoteDeviceAlreadyUnlocked,

    OperationFailed,
}

impl Status {
    /// True when the operation should be considered to have produced no
    /// usable result.
    pub fn is_error(self) -> bool {
        self != Status::Success
    }

    /// Maps a server-reported numeric status code onto [`Status`]. Unknown
    /// codes map to [`Status::Invalid`], matching the spec's "unknown codes
    /// -> INVALID" rule.
    pub fn from_remote_code(code: i32) -> Self {
        match code {
            0 => Status::Success,
            1 => Status::RemoteNotAuthorized,
            2 => Status::RemoteClusterVersionMismatch,
            3 => Status::RemoteInternalError,
            4 => Status::RemoteInvalidRequest,
            5 => Status::RemoteNestedOperationErrors,
            6 => Status::RemoteDataError,
            7 => Status::RemotePermissionDenied,
            8 => Status::RemoteNotFound,
            9 => Status::RemoteVersionMismatch,
            10 => Status::RemoteInternalError,
            11 => Status::RemoteNoSpace,
            12 => Status::RemoteExpired,
            13 => Status::RemoteDeviceLocked,
            14 => Status::RemoteDeviceAlreadyUnlocked,
            15 => Status::RemoteConnectionError,
            16 => Status::RemoteServiceBusy,
            _ => Status::Invalid,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for Status {}

/// Result codes produced while streaming-parsing an ACL document (component
/// C8). Kept distinct from [`Status`] because the spec defines them as a
/// closed vocabulary of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AclError {
    #[error("end of ACL stream")]
    EndOfStream,
    #[error("out of memory while parsing ACL document")]
    Memory,
    #[error("failed to read ACL JSON file")]
    JsonFile,
    #[error("malformed JSON in ACL document")]
    BadJson,
    #[error("ACL record missing a required field")]
    MissingField,
    #[error("ACL record has an invalid field value")]
    InvalidField,
    #[error("null path or output pointer passed to ACL loader")]
    Null,
}
