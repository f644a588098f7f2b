// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The typed unit of work submitted to the bus (component C7's shared
//! envelope).

use std::time::Duration;

use tokio::sync::oneshot;

use crate::{
    status::Status,
    wire::message::{Command, NOT_YET_BOUND},
};

/// Default per-operation timeout; overridden per command family by each
/// builder in `ops::*`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result delivered to an operation's completion closure.
#[derive(Debug, Clone)]
pub struct OperationResult {
    pub status: Status,
    pub response: Option<Command>,
    pub value: Vec<u8>,
}

impl OperationResult {
    pub fn failed(status: Status) -> Self {
        Self {
            status,
            response: None,
            value: Vec::new(),
        }
    }
}

/// A boxed completion closure, invoked exactly once from either the
/// receiver task or the timeout sweeper.
pub type Completion = Box<dyn FnOnce(OperationResult) + Send + Sync + 'static>;

/// Which authentication envelope a send should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Hmac,
    Pin,
}

/// One in-flight unit of work: a command plus its value payload, timeout,
/// authentication mode, and completion closure.
pub struct Operation {
    pub command: Command,
    pub value: Vec<u8>,
    pub auth: AuthMode,
    pub pin: Vec<u8>,
    pub timeout: Duration,
    pub completion: Completion,
}

impl Operation {
    pub fn new(command: Command, completion: Completion) -> Self {
        debug_assert_eq!(
            command.header.sequence, NOT_YET_BOUND,
            "a freshly built operation must not carry a bound sequence"
        );
        Self {
            command,
            value: Vec::new(),
            auth: AuthMode::Hmac,
            pin: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            completion,
        }
    }

    pub fn with_value(mut self, value: Vec<u8>) -> Self {
        self.value = value;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pin(mut self, pin: Vec<u8>) -> Self {
        self.auth = AuthMode::Pin;
        self.pin = pin;
        self
    }
}

impl Operation {
    /// Layers a `tokio::sync::oneshot` on top of the raw completion closure
    /// so a caller can `.await` a result instead of supplying its own
    /// callback. Returns the completion to pass to a builder alongside the
    /// receiver to await.
    pub fn wait() -> (Completion, oneshot::Receiver<OperationResult>) {
        let (tx, rx) = oneshot::channel();
        let completion: Completion = Box::new(move |result| {
            let _ = tx.send(result);
        });
        (completion, rx)
    }
}
