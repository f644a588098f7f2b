// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! SECURITY: upload an ACL document, or rotate the lock/erase PIN.

use crate::{
    acl::Acl,
    operation::{Completion, Operation},
    ops::{self, SET_ACL_TIMEOUT, SET_PIN_TIMEOUT},
    session::Session,
    status::Status,
    wire::message::{Body, Command, OpCode, Security},
};

/// Uploads a parsed ACL document. Timeout 90 s, matching the reference
/// client's generous bound for a potentially large administrative write.
pub fn build_set_acl(
    session: &Session,
    acls: Vec<Acl>,
    on_complete: impl FnOnce(Status) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let mut command = Command::new(OpCode::Security);
    command.body = Body::Security(Security {
        acls,
        ..Default::default()
    });

    let completion: Completion = Box::new(move |result| on_complete(result.status));

    Ok(Operation::new(command, completion).with_timeout(SET_ACL_TIMEOUT))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    Lock,
    Erase,
}

/// Rotates the lock or erase PIN. This is hmac-authenticated, not
/// pin-authenticated -- the caller must already be able to authenticate as
/// an identity with `SECURITY` permission.
pub fn build_set_pin(
    session: &Session,
    kind: PinKind,
    old_pin: Vec<u8>,
    new_pin: Vec<u8>,
    on_complete: impl FnOnce(Status) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let mut security = Security::default();
    match kind {
        PinKind::Lock => {
            security.old_lock_pin = old_pin;
            security.new_lock_pin = new_pin;
        },
        PinKind::Erase => {
            security.old_erase_pin = old_pin;
            security.new_erase_pin = new_pin;
        },
    }

    let mut command = Command::new(OpCode::Security);
    command.body = Body::Security(security);

    let completion: Completion = Box::new(move |result| on_complete(result.status));

    Ok(Operation::new(command, completion).with_timeout(SET_PIN_TIMEOUT))
}
