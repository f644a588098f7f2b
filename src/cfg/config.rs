// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Parameters needed to open and authenticate a session.
    pub session: SessionConfig,
    /// Implementation/runtime parameters that live outside the wire
    /// protocol.
    pub runtime: RuntimeConfig,
}

/// Everything [`crate::session::Session::connect`] needs to dial a peer and
/// authenticate subsequent requests.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SessionConfig {
    #[serde(rename = "Host")]
    /// Hostname or address of the device.
    pub host: String,

    #[serde(rename = "Port")]
    /// TCP port of the device.
    pub port: u16,

    #[serde(rename = "Identity")]
    /// Identity used to select the HMAC key for request authentication.
    pub identity: i64,

    #[serde(rename = "HmacKey")]
    /// Shared secret for HMAC-SHA1 request authentication.
    pub hmac_key: String,

    #[serde(default, rename = "ClusterVersion")]
    /// Cluster version to present on the first request. Updated afterward
    /// by a successful `SET_CLUSTER_VERSION` response.
    pub cluster_version: i64,

    #[serde(default = "default_timeout_secs", rename = "TimeoutSecs", with = "serde_secs")]
    /// Default per-operation timeout, overridden per command family by
    /// [`RuntimeConfig`].
    pub timeout: Duration,

    #[serde(default, rename = "Blocking")]
    /// Retained for wire compatibility with the reference client's config
    /// shape; only affects whether `connect` retries across resolved
    /// addresses instead of failing on the first one.
    pub blocking: bool,

    #[serde(default, rename = "UseSsl")]
    /// Reserved for a future TLS transport; unused by the plain TCP
    /// transport.
    pub use_ssl: bool,
}

fn default_timeout_secs() -> Duration {
    Duration::from_secs(10)
}

/// Runtime-only settings that do not travel over the wire.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RuntimeConfig {
    #[serde(rename = "MaxOutstanding")]
    /// Upper bound on concurrently in-flight requests for one session.
    pub max_outstanding: u32,

    #[serde(rename = "SocketReadTimeoutSecs", with = "serde_secs")]
    /// Per-read timeout applied to the receive loop's socket reads.
    pub socket_read_timeout: Duration,
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Validates invariants and normalizes derived fields.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure!(!self.session.host.is_empty(), "Host must not be empty");
        ensure!(self.session.port != 0, "Port must be nonzero");
        ensure!(
            !self.session.hmac_key.is_empty(),
            "HmacKey must not be empty"
        );
        ensure!(
            !self.session.timeout.is_zero(),
            "TimeoutSecs must be nonzero"
        );

        ensure!(
            self.runtime.max_outstanding >= 1,
            "MaxOutstanding must be >= 1"
        );
        ensure!(
            self.runtime.max_outstanding <= 64,
            "MaxOutstanding must not exceed 64"
        );
        ensure!(
            !self.runtime.socket_read_timeout.is_zero(),
            "SocketReadTimeoutSecs must be nonzero"
        );

        Ok(())
    }
}

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
