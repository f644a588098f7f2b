// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! SETUP: firmware download or cluster-version rotation.
//!
//! The firmware-download builder reads the whole file before allocating
//! the value buffer; an open failure returns `INVALID_FILE` without
//! allocating anything, matching the intended (rather than the literally
//! unreachable) behavior of the reference builder.

use crate::{
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT},
    session::Session,
    status::Status,
    wire::message::{Body, Command, OpCode, Setup},
};

pub async fn build_firmware_download(
    session: &Session,
    path: &std::path::Path,
    on_complete: impl FnOnce(Status) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let firmware = tokio::fs::read(path)
        .await
        .map_err(|_| Status::InvalidFile)?;

    let mut command = Command::new(OpCode::Setup);
    command.body = Body::Setup(Setup {
        new_cluster_version: None,
        firmware_download: true,
    });

    let completion: Completion = Box::new(move |result| on_complete(result.status));

    Ok(Operation::new(command, completion)
        .with_value(firmware)
        .with_timeout(DEFAULT_TIMEOUT))
}

pub fn build_new_cluster_version(
    session: &Session,
    new_version: i64,
    on_complete: impl FnOnce(Status) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let mut command = Command::new(OpCode::Setup);
    command.body = Body::Setup(Setup {
        new_cluster_version: Some(new_version),
        firmware_download: false,
    });

    let completion: Completion = Box::new(move |result| on_complete(result.status));

    Ok(Operation::new(command, completion).with_timeout(DEFAULT_TIMEOUT))
}
