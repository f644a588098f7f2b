// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The on-wire PDU framing codec (component C2).
//!
//! A PDU is `MAGIC(1) | commandLen(u32 BE) | valueLen(u32 BE) | commandBytes
//! | valueBytes`. `pack`/`unpack` operate on already-assembled buffers; the
//! transport layer is responsible for performing the length-delimited reads
//! that produce the buffer `unpack` consumes.

use bytes::{Bytes, BytesMut};

use crate::status::Status;

/// Leading magic byte identifying a Kinetic PDU.
pub const MAGIC: u8 = 0x46; // 'F'
/// Length in bytes of the fixed PDU prologue (magic + two BE u32 lengths).
pub const HEADER_LEN: usize = 1 + 4 + 4;
/// Maximum size of the command-bytes segment.
pub const MAX_COMMAND: usize = 1 << 20;
/// Maximum size of the value segment.
pub const MAX_VALUE: usize = 1 << 20;

/// The fixed PDU prologue, decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prologue {
    pub command_len: u32,
    pub value_len: u32,
}

impl Prologue {
    /// Encodes the prologue into its fixed 9-byte wire representation.
    pub fn encode(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = MAGIC;
        buf[1..5].copy_from_slice(&self.command_len.to_be_bytes());
        buf[5..9].copy_from_slice(&self.value_len.to_be_bytes());
        buf
    }

    /// Decodes and validates a 9-byte prologue. Rejects a bad magic byte or
    /// lengths exceeding `MAX_COMMAND`/`MAX_VALUE` before any further
    /// reading is attempted.
    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self, Status> {
        if buf[0] != MAGIC {
            return Err(Status::DataError);
        }
        let command_len =
            u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        let value_len = u32::from_be_bytes([buf[5], buf[6], buf[7], buf[8]]);
        if command_len as usize > MAX_COMMAND || value_len as usize > MAX_VALUE
        {
            return Err(Status::BufferOverrun);
        }
        Ok(Prologue {
            command_len,
            value_len,
        })
    }
}

/// Packs a `(commandBytes, value)` pair into a complete wire PDU.
pub fn pack(command: &[u8], value: &[u8]) -> Result<Bytes, Status> {
    if command.len() > MAX_COMMAND || value.len() > MAX_VALUE {
        return Err(Status::BufferOverrun);
    }
    let prologue = Prologue {
        command_len: command.len() as u32,
        value_len: value.len() as u32,
    };
    let mut buf = BytesMut::with_capacity(HEADER_LEN + command.len() + value.len());
    buf.extend_from_slice(&prologue.encode());
    buf.extend_from_slice(command);
    buf.extend_from_slice(value);
    Ok(buf.freeze())
}

/// Unpacks a complete wire PDU back into `(commandBytes, value)`. The
/// inverse of [`pack`]: `unpack(pack(cmd, val)) == (cmd, val)` for any
/// well-formed inputs within the size limits.
pub fn unpack(buf: &[u8]) -> Result<(Bytes, Bytes), Status> {
    if buf.len() < HEADER_LEN {
        return Err(Status::DataError);
    }
    let mut hdr = [0u8; HEADER_LEN];
    hdr.copy_from_slice(&buf[..HEADER_LEN]);
    let prologue = Prologue::decode(&hdr)?;

    let command_end = HEADER_LEN + prologue.command_len as usize;
    let value_end = command_end + prologue.value_len as usize;
    if buf.len() != value_end {
        return Err(Status::DataError);
    }

    let owned = Bytes::copy_from_slice(buf);
    let command = owned.slice(HEADER_LEN..command_end);
    let value = owned.slice(command_end..value_end);
    Ok((command, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_empty_value() {
        let cmd = b"some-command-bytes";
        let (out_cmd, out_val) = unpack(&pack(cmd, &[]).expect("pack")).expect("unpack");
        assert_eq!(&out_cmd[..], cmd);
        assert!(out_val.is_empty());
    }

    #[test]
    fn round_trip_with_value() {
        let cmd = b"header-ish";
        let val = b"lorem ipsum... blah blah blah... etc.";
        let packed = pack(cmd, val).expect("pack");
        let (out_cmd, out_val) = unpack(&packed).expect("unpack");
        assert_eq!(&out_cmd[..], cmd);
        assert_eq!(&out_val[..], val);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut packed = pack(b"x", b"y").expect("pack").to_vec();
        packed[0] = 0;
        assert_eq!(unpack(&packed), Err(Status::DataError));
    }

    #[test]
    fn rejects_oversize_command() {
        let oversize = vec![0u8; MAX_COMMAND + 1];
        assert_eq!(pack(&oversize, &[]), Err(Status::BufferOverrun));
    }

    #[test]
    fn rejects_truncated_buffer() {
        let packed = pack(b"hello", b"world").expect("pack");
        assert_eq!(unpack(&packed[..packed.len() - 1]), Err(Status::DataError));
    }
}
