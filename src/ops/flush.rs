// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! FLUSHALLDATA: force any buffered writes to stable storage. No body, no
//! post-processing.

use crate::{
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT},
    session::Session,
    status::Status,
    wire::message::{Command, OpCode},
};

pub fn build(
    session: &Session,
    on_complete: impl FnOnce(Status) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let completion: Completion = Box::new(move |result| on_complete(result.status));

    Ok(Operation::new(Command::new(OpCode::FlushAllData), completion)
        .with_timeout(DEFAULT_TIMEOUT))
}
