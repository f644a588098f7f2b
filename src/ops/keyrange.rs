// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! GETKEYRANGE: list keys between `start_key` and `end_key`. On success the
//! returned keys are copied into the caller's buffer up to `max_returned`;
//! a response holding more keys than that is `BUFFER_OVERRUN`.

use crate::{
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT},
    session::Session,
    status::Status,
    wire::message::{Body, Command, OpCode, Range},
};

#[derive(Debug, Clone, Default)]
pub struct KeyRangeRequest {
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
    pub start_key_inclusive: bool,
    pub end_key_inclusive: bool,
    pub max_returned: u32,
    pub reverse: bool,
}

pub fn build(
    session: &Session,
    request: KeyRangeRequest,
    on_complete: impl FnOnce(Status, Vec<Vec<u8>>) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let max_returned = request.max_returned;
    let mut command = Command::new(OpCode::GetKeyRange);
    command.body = Body::Range(Range {
        start_key: request.start_key,
        end_key: request.end_key,
        start_key_inclusive: request.start_key_inclusive,
        end_key_inclusive: request.end_key_inclusive,
        max_returned,
        reverse: request.reverse,
        keys: Vec::new(),
    });

    let completion: Completion = Box::new(move |result| {
        let (status, keys) = apply_result(result, max_returned);
        on_complete(status, keys);
    });

    Ok(Operation::new(command, completion).with_timeout(DEFAULT_TIMEOUT))
}

fn apply_result(
    result: crate::operation::OperationResult,
    max_returned: u32,
) -> (Status, Vec<Vec<u8>>) {
    if result.status != Status::Success {
        return (result.status, Vec::new());
    }
    match &result.response.as_ref().map(|r| &r.body) {
        Some(Body::Range(range)) => {
            if range.keys.len() as u32 > max_returned {
                (Status::BufferOverrun, Vec::new())
            } else {
                (Status::Success, range.keys.clone())
            }
        },
        _ => (Status::OperationFailed, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::message::{Header, StatusField};

    fn ok_result(keys: Vec<Vec<u8>>) -> crate::operation::OperationResult {
        crate::operation::OperationResult {
            status: Status::Success,
            response: Some(Command {
                header: Header::new(OpCode::GetKeyRangeResponse),
                body: Body::Range(Range {
                    keys,
                    ..Default::default()
                }),
                status: StatusField::default(),
            }),
            value: Vec::new(),
        }
    }

    #[test]
    fn copies_keys_within_capacity() {
        let (status, keys) = apply_result(ok_result(vec![b"a".to_vec(), b"b".to_vec()]), 10);
        assert_eq!(status, Status::Success);
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn rejects_when_more_keys_than_capacity() {
        let (status, keys) = apply_result(ok_result(vec![b"a".to_vec(), b"b".to_vec()]), 1);
        assert_eq!(status, Status::BufferOverrun);
        assert!(keys.is_empty());
    }
}
