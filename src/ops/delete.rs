// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! DELETE: remove an entry by key. No post-processing beyond status.

use crate::{
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT, Entry},
    session::Session,
    status::Status,
    wire::message::{Body, Command, KeyValue, OpCode},
};

pub fn build(
    session: &Session,
    entry: &Entry,
    on_complete: impl FnOnce(Status) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let mut command = Command::new(OpCode::Delete);
    command.body = Body::KeyValue(KeyValue {
        key: entry.key.clone(),
        db_version: entry.db_version.clone(),
        force: entry.force,
        ..Default::default()
    });

    let completion: Completion = Box::new(move |result| on_complete(result.status));

    Ok(Operation::new(command, completion).with_timeout(DEFAULT_TIMEOUT))
}
