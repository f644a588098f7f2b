// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! PEER2PEERPUSH: ask the device to replicate keys to another peer. The
//! request tree is validated against the nesting-depth and
//! total-operation-count limits before it is ever sent.

use crate::{
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT},
    session::Session,
    status::Status,
    wire::message::{Body, Command, OpCode, P2pOperation, P2pSubOperation},
};

pub const MAX_NESTING: usize = 4;
pub const OPERATION_LIMIT: usize = 2000;

/// Validates nesting depth and total sub-operation count before a
/// [`P2pOperation`] is ever sent.
pub fn validate(op: &P2pOperation) -> Result<(), Status> {
    let mut total = 0usize;
    validate_ops(&op.operations, 1, &mut total)?;
    if total > OPERATION_LIMIT {
        return Err(Status::OperationInvalid);
    }
    Ok(())
}

fn validate_ops(
    ops: &[P2pSubOperation],
    depth: usize,
    total: &mut usize,
) -> Result<(), Status> {
    if depth > MAX_NESTING {
        return Err(Status::OperationInvalid);
    }
    for sub in ops {
        *total += 1;
        if *total > OPERATION_LIMIT {
            return Err(Status::OperationInvalid);
        }
        if let Some(chained) = &sub.chained {
            validate_ops(&chained.operations, depth + 1, total)?;
        }
    }
    Ok(())
}

pub fn build(
    session: &Session,
    op: P2pOperation,
    on_complete: impl FnOnce(Status, P2pOperation) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;
    validate(&op)?;

    let mut command = Command::new(OpCode::PeerToPeerPush);
    command.body = Body::P2p(op.clone());

    let completion: Completion = Box::new(move |result| {
        let merged = apply_result(&result, op);
        on_complete(result.status, merged);
    });

    Ok(Operation::new(command, completion).with_timeout(DEFAULT_TIMEOUT))
}

/// Walks the response tree and writes per-sub-op status back into the
/// caller's request tree; the request tree is always returned (and thus
/// always freed exactly once by the caller), matching the reference
/// builder's "always free the built p2p request tree" rule.
fn apply_result(
    result: &crate::operation::OperationResult,
    mut requested: P2pOperation,
) -> P2pOperation {
    if let Some(response) = &result.response
        && let Body::P2p(response_op) = &response.body
    {
        for (req, resp) in requested.operations.iter_mut().zip(&response_op.operations) {
            req.status = resp.status;
        }
    }
    requested
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(key: &[u8]) -> P2pSubOperation {
        P2pSubOperation {
            key: key.to_vec(),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_shallow_tree() {
        let op = P2pOperation {
            peer_host: "peer".into(),
            peer_port: 8123,
            peer_tls: false,
            operations: vec![leaf(b"a"), leaf(b"b")],
        };
        assert!(validate(&op).is_ok());
    }

    #[test]
    fn rejects_excess_nesting() {
        let mut innermost = P2pOperation {
            peer_host: "peer".into(),
            peer_port: 8123,
            peer_tls: false,
            operations: vec![leaf(b"a")],
        };
        for _ in 0..MAX_NESTING + 1 {
            innermost = P2pOperation {
                peer_host: "peer".into(),
                peer_port: 8123,
                peer_tls: false,
                operations: vec![P2pSubOperation {
                    key: b"outer".to_vec(),
                    chained: Some(Box::new(innermost)),
                    ..Default::default()
                }],
            };
        }
        assert_eq!(validate(&innermost), Err(Status::OperationInvalid));
    }
}
