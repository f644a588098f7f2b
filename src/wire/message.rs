// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The structured command-message schema carried inside the PDU's
//! `commandBytes` segment.
//!
//! The spec treats the real message codec as an external, stable-schema
//! collaborator ("assumed to provide pack/unpack to/from bytes"); this
//! module supplies a concrete implementation of that contract using `serde`
//! with a deterministic `bincode` wire encoding so the core is testable
//! standalone.

use serde::{Deserialize, Serialize};

use crate::status::Status;

/// Sentinel sequence value a freshly-built [`Header`] must carry before the
/// bus binds a real sequence number to it.
pub const NOT_YET_BOUND: i64 = -1;

/// Command message types (component C6 external interface table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum OpCode {
    Get = 2,
    Put = 4,
    Delete = 6,
    GetNext = 8,
    GetPrevious = 10,
    GetKeyRange = 12,
    Security = 18,
    Setup = 22,
    GetLog = 24,
    PinOp = 26,
    Noop = 30,
    FlushAllData = 32,
    PeerToPeerPush = 36,
    GetResponse = 3,
    PutResponse = 5,
    DeleteResponse = 7,
    GetNextResponse = 9,
    GetPreviousResponse = 11,
    GetKeyRangeResponse = 13,
    SecurityResponse = 19,
    SetupResponse = 23,
    GetLogResponse = 25,
    PinOpResponse = 27,
    NoopResponse = 31,
    FlushAllDataResponse = 33,
    PeerToPeerPushResponse = 37,
}

impl OpCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn try_from_u32(v: u32) -> Result<Self, Status> {
        use OpCode::*;
        Ok(match v {
            2 => Get,
            4 => Put,
            6 => Delete,
            8 => GetNext,
            10 => GetPrevious,
            12 => GetKeyRange,
            18 => Security,
            22 => Setup,
            24 => GetLog,
            26 => PinOp,
            30 => Noop,
            32 => FlushAllData,
            36 => PeerToPeerPush,
            3 => GetResponse,
            5 => PutResponse,
            7 => DeleteResponse,
            9 => GetNextResponse,
            11 => GetPreviousResponse,
            13 => GetKeyRangeResponse,
            19 => SecurityResponse,
            23 => SetupResponse,
            25 => GetLogResponse,
            27 => PinOpResponse,
            31 => NoopResponse,
            33 => FlushAllDataResponse,
            37 => PeerToPeerPushResponse,
            _ => return Err(Status::Invalid),
        })
    }
}

/// `header{clusterVersion, connectionId, sequence, identity, ackSequence,
/// messageType}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Header {
    pub cluster_version: i64,
    pub connection_id: i64,
    pub sequence: i64,
    pub ack_sequence: i64,
    pub identity: i64,
    pub message_type: u32,
}

impl Header {
    pub fn new(message_type: OpCode) -> Self {
        Self {
            cluster_version: 0,
            connection_id: 0,
            sequence: NOT_YET_BOUND,
            ack_sequence: 0,
            identity: 0,
            message_type: message_type.as_u32(),
        }
    }
}

/// `body.keyValue`: the PUT/GET/GETNEXT/GETPREVIOUS/DELETE entry metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: Vec<u8>,
    pub new_version: Vec<u8>,
    pub db_version: Vec<u8>,
    pub tag: Vec<u8>,
    pub algorithm: i32,
    pub force: bool,
    pub metadata_only: bool,
}

/// `body.range`: a GETKEYRANGE request/response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Range {
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
    pub start_key_inclusive: bool,
    pub end_key_inclusive: bool,
    pub max_returned: u32,
    pub reverse: bool,
    pub keys: Vec<Vec<u8>>,
}

/// `body.getLog`: requested log types (request) or populated readings
/// (response).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetLog {
    pub types: Vec<i32>,
    pub capacity_bytes_used: u64,
    pub capacity_bytes_total: u64,
    pub temperatures_celsius: Vec<f32>,
    pub messages: Vec<u8>,
}

/// `body.security`: ACL upload or PIN rotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Security {
    pub acls: Vec<crate::acl::Acl>,
    pub old_lock_pin: Vec<u8>,
    pub new_lock_pin: Vec<u8>,
    pub old_erase_pin: Vec<u8>,
    pub new_erase_pin: Vec<u8>,
}

/// `body.setup`: cluster-version rotation or firmware download.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Setup {
    pub new_cluster_version: Option<i64>,
    pub firmware_download: bool,
}

/// `body.pinOp`: lock/unlock/erase/secure-erase selector plus the pin in
/// use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinOpType {
    Lock,
    Unlock,
    Erase,
    SecureErase,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinOp {
    pub pin_op_type: Option<PinOpType>,
}

/// One leg of a peer-to-peer replication request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct P2pSubOperation {
    pub key: Vec<u8>,
    pub new_key: Option<Vec<u8>>,
    pub version: Option<Vec<u8>>,
    pub force: bool,
    pub chained: Option<Box<P2pOperation>>,
    pub status: Option<i32>,
}

/// `body.p2pOperation`: a server-to-server replication request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct P2pOperation {
    pub peer_host: String,
    pub peer_port: u16,
    pub peer_tls: bool,
    pub operations: Vec<P2pSubOperation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Body {
    #[default]
    None,
    KeyValue(KeyValue),
    Range(Range),
    GetLog(GetLog),
    Security(Security),
    Setup(Setup),
    PinOp(PinOp),
    P2p(P2pOperation),
}

/// `status{code, statusMessage, detailedMessage}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusField {
    pub code: i32,
    pub status_message: String,
    pub detailed_message: String,
}

/// The full command message: `{header, body, status}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Command {
    pub header: Header,
    pub body: Body,
    pub status: StatusField,
}

impl Command {
    pub fn new(message_type: OpCode) -> Self {
        Self {
            header: Header::new(message_type),
            body: Body::None,
            status: StatusField::default(),
        }
    }

    /// Serializes this command to its stable `commandBytes` wire
    /// representation.
    pub fn pack(&self) -> Result<Vec<u8>, Status> {
        bincode::serialize(self).map_err(|_| Status::MemoryError)
    }

    /// Deserializes `commandBytes` back into a [`Command`].
    pub fn unpack(bytes: &[u8]) -> Result<Self, Status> {
        bincode::deserialize(bytes).map_err(|_| Status::DataError)
    }
}

/// Authentication mode selector for the outer message (component C3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthType {
    HmacAuth,
    PinAuth,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HmacAuth {
    pub identity: i64,
    pub hmac: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinAuth {
    pub pin: Vec<u8>,
}

/// The outer message wrapping `commandBytes` with its authentication
/// envelope. This is what `wire::pdu::pack`'s `command` argument encodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OuterMessage {
    pub auth_type: AuthType,
    pub hmac_auth: Option<HmacAuth>,
    pub pin_auth: Option<PinAuth>,
    pub command_bytes: Vec<u8>,
}

impl OuterMessage {
    pub fn pack(&self) -> Result<Vec<u8>, Status> {
        bincode::serialize(self).map_err(|_| Status::MemoryError)
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, Status> {
        bincode::deserialize(bytes).map_err(|_| Status::DataError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_round_trip() {
        let mut cmd = Command::new(OpCode::Put);
        cmd.header.sequence = 42;
        cmd.header.identity = 7;
        cmd.body = Body::KeyValue(KeyValue {
            key: b"GET system test blob".to_vec(),
            tag: b"SomeTagValue".to_vec(),
            new_version: b"v1.0".to_vec(),
            ..Default::default()
        });

        let bytes = cmd.pack().expect("pack");
        let decoded = Command::unpack(&bytes).expect("unpack");
        assert_eq!(decoded.header.sequence, 42);
        assert_eq!(decoded.header.identity, 7);
        match decoded.body {
            Body::KeyValue(kv) => {
                assert_eq!(kv.key, b"GET system test blob");
                assert_eq!(kv.new_version, b"v1.0");
            },
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn opcode_round_trip() {
        for v in [2, 4, 6, 8, 10, 12, 18, 22, 24, 26, 30, 32, 36] {
            let op = OpCode::try_from_u32(v).expect("known opcode");
            assert_eq!(op.as_u32(), v);
        }
        assert_eq!(OpCode::try_from_u32(999), Err(Status::Invalid));
    }
}
