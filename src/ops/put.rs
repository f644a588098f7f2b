// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! PUT: write an [`Entry`]. On success, if `newVersion` was supplied it
//! becomes the entry's `dbVersion` and `newVersion` is cleared.

use crate::{
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT, Entry},
    session::Session,
    status::Status,
    wire::{
        message::{Command, KeyValue, OpCode},
        pdu::MAX_VALUE,
    },
};

pub fn build(
    session: &Session,
    mut entry: Entry,
    on_complete: impl FnOnce(Status, Entry) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    if entry.value.len() > MAX_VALUE {
        return Err(Status::BufferOverrun);
    }

    let mut command = Command::new(OpCode::Put);
    command.body = crate::wire::message::Body::KeyValue(KeyValue {
        key: entry.key.clone(),
        new_version: entry.new_version.clone(),
        db_version: entry.db_version.clone(),
        tag: entry.tag.clone(),
        algorithm: entry.algorithm,
        force: entry.force,
        metadata_only: entry.metadata_only,
    });

    let value = std::mem::take(&mut entry.value);
    let completion: Completion = Box::new(move |result| {
        if result.status == Status::Success {
            apply_success(&mut entry);
        }
        on_complete(result.status, entry);
    });

    Ok(Operation::new(command, completion)
        .with_value(value)
        .with_timeout(DEFAULT_TIMEOUT))
}

/// `dbVersion := newVersion; newVersion := ""` when a new version was
/// supplied; a no-op otherwise.
fn apply_success(entry: &mut Entry) {
    if !entry.new_version.is_empty() {
        entry.db_version = std::mem::take(&mut entry.new_version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_promotes_new_version_to_db_version() {
        let mut entry = Entry {
            new_version: b"v2".to_vec(),
            db_version: b"v1".to_vec(),
            ..Default::default()
        };
        apply_success(&mut entry);
        assert_eq!(entry.db_version, b"v2");
        assert!(entry.new_version.is_empty());
    }

    #[test]
    fn success_without_new_version_leaves_db_version_untouched() {
        let mut entry = Entry {
            db_version: b"v1".to_vec(),
            ..Default::default()
        };
        apply_success(&mut entry);
        assert_eq!(entry.db_version, b"v1");
    }
}
