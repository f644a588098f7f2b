// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! GETLOG: retrieve device log/status information. On success the response
//! is lifted into a [`LogInfo`]; a success status with no `getLog` body is
//! `OPERATION_FAILED`.

use crate::{
    cfg::logger::LoggableToFile,
    operation::{Completion, Operation},
    ops::{self, DEFAULT_TIMEOUT},
    session::Session,
    status::Status,
    wire::message::{Body, Command, GetLog, OpCode},
};

#[derive(Debug, Clone, Default)]
pub struct LogInfo {
    pub capacity_bytes_used: u64,
    pub capacity_bytes_total: u64,
    pub temperatures_celsius: Vec<f32>,
    pub messages: Vec<u8>,
}

/// Lets a caller dump the raw device-log messages to disk for offline
/// diagnostics, reusing the logger module's generic file-dump helper.
impl LoggableToFile for LogInfo {
    fn get_name() -> &'static str {
        "getlog"
    }
}

pub fn build(
    session: &Session,
    types: Vec<i32>,
    on_complete: impl FnOnce(Status, Option<LogInfo>) + Send + Sync + 'static,
) -> Result<Operation, Status> {
    ops::check_session(session)?;

    let mut command = Command::new(OpCode::GetLog);
    command.body = Body::GetLog(GetLog {
        types,
        ..Default::default()
    });

    let completion: Completion = Box::new(move |result| {
        let (status, info) = apply_result(result);
        on_complete(status, info);
    });

    Ok(Operation::new(command, completion).with_timeout(DEFAULT_TIMEOUT))
}

fn apply_result(result: crate::operation::OperationResult) -> (Status, Option<LogInfo>) {
    if result.status != Status::Success {
        return (result.status, None);
    }
    match result.response.as_ref().map(|r| &r.body) {
        Some(Body::GetLog(log)) => (
            Status::Success,
            Some(LogInfo {
                capacity_bytes_used: log.capacity_bytes_used,
                capacity_bytes_total: log.capacity_bytes_total,
                temperatures_celsius: log.temperatures_celsius.clone(),
                messages: log.messages.clone(),
            }),
        ),
        _ => (Status::OperationFailed, None),
    }
}
