// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon records as they appear in the shared registry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unique identifier for a daemon process.
///
/// Spawned daemons get 8 hex characters drawn from a random 32-bit
/// integer. The embedded variant uses a `<pid>-<millis>` form instead so
/// it can never collide with a spawned daemon's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaemonId(pub String);

impl DaemonId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a random id for a daemon about to be launched.
    pub fn random() -> Self {
        let bits = uuid::Uuid::new_v4().as_u128() as u32;
        Self(format!("{:08x}", bits))
    }

    /// Id for an in-process daemon hosted by the client itself.
    pub fn embedded(pid: u32, epoch_ms: u64) -> Self {
        Self(format!("{}-{}", pid, epoch_ms))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DaemonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DaemonId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DaemonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state a daemon reports through the registry.
///
/// Only `Idle`, `Busy`, and `Canceled` matter to the connector; the
/// registry filters the terminal states out of its snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonState {
    Idle,
    Busy,
    Canceled,
    Stopped,
    Broken,
}

/// The runtime a daemon was started with, recorded by the daemon itself.
///
/// `options` holds the discriminating JVM system properties rendered as
/// `-Dkey=value`; a client requires an exact match on all of them before
/// it will reuse the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeProfile {
    pub java_home: PathBuf,
    pub options: Vec<String>,
}

/// One registered daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonInfo {
    pub id: DaemonId,
    /// Loopback TCP port the daemon listens on.
    pub address: u16,
    /// OS process id, informational only.
    pub pid: u32,
    pub profile: RuntimeProfile,
    pub state: DaemonState,
    /// Epoch milliseconds of the daemon's last registry touch.
    pub last_seen_ms: u64,
}

impl DaemonInfo {
    pub fn is_idle(&self) -> bool {
        self.state == DaemonState::Idle
    }

    pub fn is_canceled(&self) -> bool {
        self.state == DaemonState::Canceled
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
