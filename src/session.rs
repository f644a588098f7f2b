// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-connection mutable state (component C5).

use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tokio::{
    net::tcp::OwnedWriteHalf,
    sync::Mutex,
    task::JoinHandle,
};
use tracing::{info, instrument};

use crate::{
    bus::{self, semaphore::AdmissionControl},
    cfg::config::Config,
    operation::Operation,
    status::Status,
    transport,
};

/// One entry awaiting a response, keyed by the sequence it was sent under.
pub(crate) struct PendingEntry {
    pub operation: Operation,
    pub deadline: Instant,
}

/// A live connection to one Kinetic device.
pub struct Session {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) identity: i64,
    pub(crate) hmac_key: Vec<u8>,
    pub(crate) cluster_version: AtomicI64,
    pub(crate) connection_id: AtomicI64,
    pub(crate) sequence: AtomicI64,
    pub(crate) write_half: Mutex<OwnedWriteHalf>,
    pub(crate) pending: DashMap<i64, PendingEntry>,
    pub(crate) admission: AdmissionControl,
    pub(crate) socket_read_timeout: Duration,
    pub(crate) receiver: Mutex<Option<JoinHandle<()>>>,
    pub(crate) sweeper: Mutex<Option<JoinHandle<()>>>,
    pub(crate) broken: std::sync::atomic::AtomicBool,
}

impl Session {
    /// Dials the configured peer, spawns the receiver loop and the timeout
    /// sweeper, and returns the ready-to-use session.
    #[instrument(skip(config), fields(host = %config.session.host, port = config.session.port))]
    pub async fn connect(config: &Config) -> Result<Arc<Session>, Status> {
        let (read_half, write_half) = transport::connect(
            &config.session.host,
            config.session.port,
            config.session.blocking,
        )
        .await?;

        let session = Arc::new(Session {
            host: config.session.host.clone(),
            port: config.session.port,
            identity: config.session.identity,
            hmac_key: config.session.hmac_key.clone().into_bytes(),
            cluster_version: AtomicI64::new(config.session.cluster_version),
            connection_id: AtomicI64::new(0),
            sequence: AtomicI64::new(0),
            write_half: Mutex::new(write_half),
            pending: DashMap::new(),
            admission: AdmissionControl::new(config.runtime.max_outstanding as usize),
            socket_read_timeout: config.runtime.socket_read_timeout,
            receiver: Mutex::new(None),
            sweeper: Mutex::new(None),
            broken: std::sync::atomic::AtomicBool::new(false),
        });

        let recv_handle = bus::spawn_receiver(Arc::clone(&session), read_half);
        let sweep_handle = bus::spawn_sweeper(Arc::clone(&session));
        *session.receiver.lock().await = Some(recv_handle);
        *session.sweeper.lock().await = Some(sweep_handle);

        info!("session connected");
        Ok(session)
    }

    /// The only permitted source of sequence numbers; strictly monotone.
    pub fn next_sequence(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    pub fn cluster_version(&self) -> i64 {
        self.cluster_version.load(Ordering::SeqCst)
    }

    /// Updates the cluster version. Only ever called from the receive
    /// loop's post-processing of a successful `SETUP` response, never
    /// mid-flight of another operation.
    pub(crate) fn set_cluster_version(&self, v: i64) {
        self.cluster_version.store(v, Ordering::SeqCst);
    }

    pub(crate) fn set_connection_id(&self, id: i64) {
        self.connection_id.store(id, Ordering::SeqCst);
    }

    pub(crate) fn is_broken(&self) -> bool {
        self.broken.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_broken(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    /// Closes the socket, cancels every pending operation with
    /// `CONNECTION_ERROR`, and aborts the receiver and sweeper tasks.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) {
        self.mark_broken();

        if let Some(handle) = self.receiver.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
        }

        {
            let mut write_half = self.write_half.lock().await;
            transport::close(&mut write_half).await;
        }

        let seqs: Vec<i64> = self.pending.iter().map(|e| *e.key()).collect();
        for seq in seqs {
            if let Some((_, pending)) = self.pending.remove(&seq) {
                (pending.operation.completion)(crate::operation::OperationResult::failed(
                    Status::ConnectionError,
                ));
            }
        }

        info!("session disconnected");
    }
}
