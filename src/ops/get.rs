// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! GET / GETNEXT / GETPREVIOUS: fetch an entry by key, or the next/previous
//! key in sort order. On success the response's key/tag/dbVersion/algorithm
//! are copied into the [`Entry`]; the value is appended unless
//! `metadata_only` is set.

use crate::{
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT, Entry},
    session::Session,
    status::Status,
    wire::message::{Body, Command, KeyValue, OpCode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Exact,
    Next,
    Previous,
}

pub fn build(
    session: &Session,
    direction: Direction,
    mut entry: Entry,
    on_complete: impl FnOnce(Status, Entry) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let op_code = match direction {
        Direction::Exact => OpCode::Get,
        Direction::Next => OpCode::GetNext,
        Direction::Previous => OpCode::GetPrevious,
    };

    let mut command = Command::new(op_code);
    command.body = Body::KeyValue(KeyValue {
        key: entry.key.clone(),
        metadata_only: entry.metadata_only,
        ..Default::default()
    });

    let metadata_only = entry.metadata_only;
    entry.value.clear();
    let completion: Completion = Box::new(move |result| {
        if result.status == Status::Success {
            apply_success(&mut entry, &result, metadata_only);
        }
        on_complete(result.status, entry);
    });

    Ok(Operation::new(command, completion).with_timeout(DEFAULT_TIMEOUT))
}

fn apply_success(
    entry: &mut Entry,
    result: &crate::operation::OperationResult,
    metadata_only: bool,
) {
    if let Some(response) = &result.response
        && let Body::KeyValue(kv) = &response.body
    {
        entry.key = kv.key.clone();
        entry.tag = kv.tag.clone();
        entry.db_version = kv.db_version.clone();
        entry.algorithm = kv.algorithm;
    }
    if !metadata_only {
        entry.value = result.value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::message::{Header, StatusField};

    fn response_with(kv: KeyValue, value: Vec<u8>) -> crate::operation::OperationResult {
        crate::operation::OperationResult {
            status: Status::Success,
            response: Some(Command {
                header: Header::new(OpCode::GetResponse),
                body: Body::KeyValue(kv),
                status: StatusField::default(),
            }),
            value,
        }
    }

    #[test]
    fn copies_metadata_and_value_when_not_metadata_only() {
        let mut entry = Entry::default();
        let result = response_with(
            KeyValue {
                tag: b"tag1".to_vec(),
                db_version: b"v1".to_vec(),
                algorithm: 1,
                ..Default::default()
            },
            b"the-value".to_vec(),
        );
        apply_success(&mut entry, &result, false);
        assert_eq!(entry.tag, b"tag1");
        assert_eq!(entry.db_version, b"v1");
        assert_eq!(entry.value, b"the-value");
    }

    #[test]
    fn skips_value_when_metadata_only() {
        let mut entry = Entry::default();
        let result = response_with(KeyValue::default(), b"the-value".to_vec());
        apply_success(&mut entry, &result, true);
        assert!(entry.value.is_empty());
    }
}
