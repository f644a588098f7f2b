// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Typed operation builders and their post-processors (component C7).
//!
//! Each submodule owns one command family: it shapes the wire [`Command`],
//! wires the completion closure that turns the raw [`OperationResult`]
//! into a typed outcome, and documents the per-command timeout/validation
//! rules from the design.

pub mod delete;
pub mod flush;
pub mod get;
pub mod getlog;
pub mod keyrange;
pub mod noop;
pub mod p2p;
pub mod pinop;
pub mod put;
pub mod security;
pub mod setup;

use std::time::Duration;

use crate::{session::Session, status::Status};

pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const SET_ACL_TIMEOUT: Duration = Duration::from_secs(90);
pub(crate) const SET_PIN_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const ERASE_TIMEOUT: Duration = Duration::from_secs(180);
pub(crate) const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// One key/value entry, shared by PUT/GET/GETNEXT/GETPREVIOUS/DELETE.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub key: Vec<u8>,
    pub tag: Vec<u8>,
    pub db_version: Vec<u8>,
    pub new_version: Vec<u8>,
    pub algorithm: i32,
    pub value: Vec<u8>,
    pub force: bool,
    pub metadata_only: bool,
}

/// Precondition every builder checks before consuming a sequence number or
/// admission slot: the session must not already be broken.
pub(crate) fn check_session(session: &Session) -> Result<(), Status> {
    if session.is_broken() {
        return Err(Status::OperationInvalid);
    }
    Ok(())
}
