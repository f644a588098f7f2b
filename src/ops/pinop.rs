// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! PINOP: lock, unlock, erase, or secure-erase the device using pin
//! authentication (not HMAC).

use crate::{
    operation::{Completion, Operation},
    ops::{self, ERASE_TIMEOUT, LOCK_TIMEOUT},
    session::Session,
    status::Status,
    wire::message::{Body, Command, OpCode, PinOp, PinOpType},
};

pub fn build(
    session: &Session,
    op_type: PinOpType,
    pin: Vec<u8>,
    on_complete: impl FnOnce(Status) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let mut command = Command::new(OpCode::PinOp);
    command.body = Body::PinOp(PinOp {
        pin_op_type: Some(op_type),
    });

    let timeout = match op_type {
        PinOpType::Erase | PinOpType::SecureErase => ERASE_TIMEOUT,
        PinOpType::Lock | PinOpType::Unlock => LOCK_TIMEOUT,
    };

    let completion: Completion = Box::new(move |result| on_complete(result.status));

    Ok(Operation::new(command, completion)
        .with_pin(pin)
        .with_timeout(timeout))
}
