// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use kinetic_client_rs::{
    bus,
    cfg::{config::Config, logger::init_logger},
    ops::{self, Entry},
    session::Session,
};
use tokio::{sync::oneshot, time::timeout};
use tracing::info;

/// Resolves a config path relative to the binary's working directory so
/// `Config::load_from_file` sees an absolute, canonical path in its error
/// messages.
fn demo_config_path() -> Result<PathBuf> {
    let rel = Path::new("demos/config.kinetic.yaml");
    std::env::current_dir()
        .context("cannot get current working dir")?
        .join(rel)
        .canonicalize()
        .context("failed to canonicalize demo config path")
}

#[tokio::main]
async fn main() -> Result<()> {
    let _init_logger = init_logger("tests/config_logger.yaml")?;

    let cfg = Config::load_from_file(demo_config_path()?)
        .context("failed to load demo config")?;

    let session = Session::connect(&cfg).await.context("connect failed")?;
    info!(
        host = %cfg.session.host,
        port = cfg.session.port,
        "session connected"
    );

    // Liveness probe.
    let (on_noop, noop_rx) = oneshot::channel();
    let noop = ops::noop::build(&session, move |status| {
        let _ = on_noop.send(status);
    })?;
    bus::submit(&session, noop).await.context("submit noop")?;
    let noop_status = timeout(Duration::from_secs(15), noop_rx)
        .await
        .context("noop timeout")?
        .context("noop dropped")?;
    info!(?noop_status, "noop complete");

    // PUT then GET a demo entry.
    let entry = Entry {
        key: b"kinetic-cli-demo-key".to_vec(),
        tag: b"demo-tag".to_vec(),
        new_version: b"1".to_vec(),
        value: b"hello from kinetic-cli".to_vec(),
        ..Default::default()
    };

    let (on_put, put_rx) = oneshot::channel();
    let put_op = ops::put::build(&session, entry.clone(), move |status, entry| {
        let _ = on_put.send((status, entry));
    })?;
    bus::submit(&session, put_op).await.context("submit put")?;
    let (put_status, put_entry) = timeout(Duration::from_secs(15), put_rx)
        .await
        .context("put timeout")?
        .context("put dropped")?;
    info!(?put_status, db_version = ?put_entry.db_version, "put complete");

    let (on_get, get_rx) = oneshot::channel();
    let get_op = ops::get::build(
        &session,
        ops::get::Direction::Exact,
        Entry {
            key: entry.key.clone(),
            ..Default::default()
        },
        move |status, entry| {
            let _ = on_get.send((status, entry));
        },
    )?;
    bus::submit(&session, get_op).await.context("submit get")?;
    let (get_status, get_entry) = timeout(Duration::from_secs(15), get_rx)
        .await
        .context("get timeout")?
        .context("get dropped")?;
    info!(?get_status, value_len = get_entry.value.len(), "get complete");

    session.disconnect().await;
    Ok(())
}
