// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Async TCP transport primitives (component C1).
//!
//! A thin timeout-wrapped layer over `tokio::net::TcpStream`, split into
//! owned read/write halves the way the teacher's `ClientConnection` holds
//! its iSCSI socket halves.

use std::time::Duration;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    time::timeout,
};
use tracing::{debug, warn};

use crate::status::Status;

/// Per-attempt timeout applied to every socket read.
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);
/// Per-attempt timeout applied to every socket write.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves `host:port` and connects, trying each resolved address in turn
/// when `retry_all` is set (the config's `blocking` hint).
pub async fn connect(
    host: &str,
    port: u16,
    retry_all: bool,
) -> Result<(OwnedReadHalf, OwnedWriteHalf), Status> {
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| Status::ConnectionError)?;

    let mut last_err = Status::ConnectionError;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream.set_nodelay(true).map_err(|_| Status::ConnectionError)?;
                debug!(peer = %addr, "connected");
                return Ok(stream.into_split());
            },
            Err(e) => {
                warn!(peer = %addr, error = %e, "connect attempt failed");
                last_err = Status::ConnectionError;
                if !retry_all {
                    break;
                }
            },
        }
    }
    Err(last_err)
}

/// Reads exactly `buf.len()` bytes within `read_timeout`.
pub async fn read_exact(
    read_half: &mut OwnedReadHalf,
    buf: &mut [u8],
    read_timeout: Duration,
) -> Result<(), Status> {
    match timeout(read_timeout, read_half.read_exact(buf)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) => Err(Status::ConnectionError),
        Err(_) => Err(Status::SocketTimeout),
    }
}

/// Writes the whole buffer within [`WRITE_TIMEOUT`].
pub async fn write_all(
    write_half: &mut OwnedWriteHalf,
    buf: &[u8],
) -> Result<(), Status> {
    match timeout(WRITE_TIMEOUT, write_half.write_all(buf)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) => Err(Status::ConnectionError),
        Err(_) => Err(Status::SocketTimeout),
    }
}

/// Shuts the write half down, flushing anything queued.
pub async fn close(write_half: &mut OwnedWriteHalf) {
    let _ = write_half.shutdown().await;
}
