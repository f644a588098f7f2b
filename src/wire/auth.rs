// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! HMAC-SHA1 request/response authentication (component C3).
//!
//! The authenticated span is `BE32(len(commandBytes)) || commandBytes` --
//! the value is never covered by the tag. Keys are looked up by identity
//! and never logged.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::status::Status;

type HmacSha1 = Hmac<Sha1>;

/// Computes the HMAC-SHA1 tag over `commandBytes` under `key`.
pub fn compute(key: &[u8], command_bytes: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(&(command_bytes.len() as u32).to_be_bytes());
    mac.update(command_bytes);
    mac.finalize().into_bytes().to_vec()
}

/// Verifies `tag` against `commandBytes` under `key` in constant time.
/// Returns [`Status::DataError`] on mismatch, matching the spec's "auth
/// failure surfaces as a wire integrity failure" rule.
pub fn verify(key: &[u8], command_bytes: &[u8], tag: &[u8]) -> Result<(), Status> {
    let expected = compute(key, command_bytes);
    if expected.len() == tag.len() && bool::from(expected.ct_eq(tag)) {
        Ok(())
    } else {
        Err(Status::DataError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_matching_tag() {
        let key = b"asdfasdf";
        let cmd = b"the-command-bytes";
        let tag = compute(key, cmd);
        assert!(verify(key, cmd, &tag).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_command() {
        let key = b"asdfasdf";
        let tag = compute(key, b"the-command-bytes");
        assert_eq!(
            verify(key, b"a-different-command", &tag),
            Err(Status::DataError)
        );
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let cmd = b"the-command-bytes";
        let tag = compute(b"key-one", cmd);
        assert_eq!(verify(b"key-two", cmd, &tag), Err(Status::DataError));
    }
}
