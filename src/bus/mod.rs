// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The request/response pipeline (component C6): send path, receive loop,
//! and timeout sweeper.

pub mod semaphore;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{net::tcp::OwnedReadHalf, task::JoinHandle, time};
use tracing::{debug, warn};

use crate::{
    operation::{AuthMode, Operation, OperationResult},
    session::{PendingEntry, Session},
    status::Status,
    transport,
    wire::{auth, message::Command, pdu},
};

const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Submits `operation` on `session`: binds a sequence, packs and
/// authenticates the command, takes an admission slot, registers the
/// pending entry, and writes the framed PDU.
///
/// Matches the teacher's pattern of holding one mutex end-to-end for the
/// whole send so wire order equals sequence-allocation order -- here the
/// write-half's own mutex plays that role.
pub async fn submit(session: &Arc<Session>, mut operation: Operation) -> Result<(), Status> {
    if session.is_broken() {
        (operation.completion)(OperationResult::failed(Status::ConnectionError));
        return Err(Status::ConnectionError);
    }

    let write_half_guard = session.write_half.lock().await;

    let seq = session.next_sequence();
    operation.command.header.sequence = seq;
    operation.command.header.identity = session.identity;
    operation.command.header.cluster_version = session.cluster_version();
    operation.command.header.connection_id =
        session.connection_id.load(std::sync::atomic::Ordering::SeqCst);

    let command_bytes = match operation.command.pack() {
        Ok(bytes) => bytes,
        Err(_) => {
            drop(write_half_guard);
            (operation.completion)(OperationResult::failed(Status::MemoryError));
            return Err(Status::MemoryError);
        },
    };

    let outer = build_outer_message(session, &operation, &command_bytes);
    let outer_bytes = match outer.pack() {
        Ok(bytes) => bytes,
        Err(_) => {
            drop(write_half_guard);
            (operation.completion)(OperationResult::failed(Status::MemoryError));
            return Err(Status::MemoryError);
        },
    };

    let framed = match pdu::pack(&outer_bytes, &operation.value) {
        Ok(bytes) => bytes,
        Err(status) => {
            drop(write_half_guard);
            (operation.completion)(OperationResult::failed(status));
            return Err(status);
        },
    };

    session.admission.take().await;

    let deadline = Instant::now() + operation.timeout;
    session
        .pending
        .insert(seq, PendingEntry { operation, deadline });

    let write_result = {
        let mut write_half = write_half_guard;
        transport::write_all(&mut write_half, &framed).await
    };

    if let Err(status) = write_result {
        session.admission.give();
        if let Some((_, pending)) = session.pending.remove(&seq) {
            (pending.operation.completion)(OperationResult::failed(status));
        }
        return Err(status);
    }

    Ok(())
}

fn build_outer_message(
    session: &Session,
    operation: &Operation,
    command_bytes: &[u8],
) -> crate::wire::message::OuterMessage {
    use crate::wire::message::{AuthType, HmacAuth, OuterMessage, PinAuth};

    match operation.auth {
        AuthMode::Hmac => {
            let tag = auth::compute(&session.hmac_key, command_bytes);
            OuterMessage {
                auth_type: AuthType::HmacAuth,
                hmac_auth: Some(HmacAuth {
                    identity: session.identity,
                    hmac: tag,
                }),
                pin_auth: None,
                command_bytes: command_bytes.to_vec(),
            }
        },
        AuthMode::Pin => OuterMessage {
            auth_type: AuthType::PinAuth,
            hmac_auth: None,
            pin_auth: Some(PinAuth {
                pin: operation.pin.clone(),
            }),
            command_bytes: command_bytes.to_vec(),
        },
    }
}

/// Spawns the single receiver task for `session`: reads PDUs, verifies
/// HMAC, correlates by `ackSequence`, and delivers to the matched
/// operation's completion closure.
pub fn spawn_receiver(session: Arc<Session>, mut read_half: OwnedReadHalf) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match receive_one(&session, &mut read_half).await {
                Ok(()) => continue,
                Err(status) => {
                    warn!(?status, "receive loop terminating");
                    session.mark_broken();
                    let seqs: Vec<i64> = session.pending.iter().map(|e| *e.key()).collect();
                    for seq in seqs {
                        if let Some((_, pending)) = session.pending.remove(&seq) {
                            (pending.operation.completion)(OperationResult::failed(status));
                        }
                    }
                    return;
                },
            }
        }
    })
}

async fn receive_one(
    session: &Arc<Session>,
    read_half: &mut OwnedReadHalf,
) -> Result<(), Status> {
    let mut header_buf = [0u8; pdu::HEADER_LEN];
    transport::read_exact(read_half, &mut header_buf, session.socket_read_timeout).await?;
    let prologue = pdu::Prologue::decode(&header_buf)?;

    let mut rest = vec![0u8; prologue.command_len as usize + prologue.value_len as usize];
    transport::read_exact(read_half, &mut rest, session.socket_read_timeout).await?;

    let mut framed = Vec::with_capacity(pdu::HEADER_LEN + rest.len());
    framed.extend_from_slice(&header_buf);
    framed.extend_from_slice(&rest);
    let (outer_bytes, value) = pdu::unpack(&framed)?;

    let outer = crate::wire::message::OuterMessage::unpack(&outer_bytes)?;

    if let Some(hmac_auth) = &outer.hmac_auth {
        auth::verify(&session.hmac_key, &outer.command_bytes, &hmac_auth.hmac)?;
    }

    let command = Command::unpack(&outer.command_bytes)?;
    let ack_sequence = command.header.ack_sequence;

    let Some((_, pending)) = session.pending.remove(&ack_sequence) else {
        debug!(ack_sequence, "response for unknown or already-completed sequence");
        return Ok(());
    };

    if command.header.connection_id != 0 {
        session.set_connection_id(command.header.connection_id);
    }

    let status = post_process(session, &command);

    session.admission.give();

    (pending.operation.completion)(OperationResult {
        status,
        response: Some(command),
        value: value.to_vec(),
    });

    Ok(())
}

/// Runs the per-command response post-processor and maps the remote status
/// field. `SETUP` responses additionally update the session's cluster
/// version on success -- the only place that field is ever written.
fn post_process(session: &Session, command: &Command) -> Status {
    let status = Status::from_remote_code(command.status.code);

    if status == Status::Success
        && command.header.message_type
            == crate::wire::message::OpCode::SetupResponse.as_u32()
        && let crate::wire::message::Body::Setup(setup) = &command.body
        && let Some(new_version) = setup.new_cluster_version
    {
        session.set_cluster_version(new_version);
    }

    status
}

/// Spawns the periodic sweeper that completes past-deadline pending
/// entries with `SOCKET_TIMEOUT`.
pub fn spawn_sweeper(session: Arc<Session>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let now = Instant::now();
            let expired: Vec<i64> = session
                .pending
                .iter()
                .filter(|e| e.deadline <= now)
                .map(|e| *e.key())
                .collect();
            for seq in expired {
                if let Some((_, pending)) = session.pending.remove(&seq) {
                    session.admission.give();
                    (pending.operation.completion)(OperationResult::failed(
                        Status::SocketTimeout,
                    ));
                }
            }
        }
    })
}
