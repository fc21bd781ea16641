// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client errors

use mvnd_core::DaemonId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the daemon connector.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure reaching a daemon's recorded address.
    #[error("could not connect to daemon at 127.0.0.1:{port}: {source}")]
    Connect {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// The connect landed on our own ephemeral port: nothing is listening.
    #[error("socket at 127.0.0.1:{port} connected to itself, daemon is not listening")]
    SelfConnect { port: u16 },

    /// A freshly started daemon registered itself but the connect failed.
    #[error("could not complete handshake with daemon {id}: {cause}\n{diagnostics}")]
    Handshake {
        id: DaemonId,
        cause: String,
        diagnostics: String,
    },

    /// The newly started daemon exited before accepting a connection.
    #[error("daemon {id} exited before accepting a connection\n{diagnostics}")]
    DaemonDied { id: DaemonId, diagnostics: String },

    /// The post-launch handshake exhausted its budget.
    #[error("Timeout waiting to connect to the Maven daemon.\n{diagnostics}")]
    StartupTimeout { diagnostics: String },

    /// Spawning the daemon subprocess failed.
    #[error("failed to start daemon {} in {}: {}\ncommand: {}", .id, .dir.display(), .message, .command)]
    Start {
        id: DaemonId,
        dir: PathBuf,
        command: String,
        message: String,
    },

    /// The calling thread was asked to stop while waiting.
    #[error("interrupted while waiting for a daemon connection")]
    Interrupted,

    /// The embedded variant was requested but cannot run in this build.
    #[error("cannot run an embedded daemon: {0}")]
    Unsupported(String),
}

impl ClientError {
    /// True for failures that identify a dead or unreachable daemon
    /// rather than a client-side defect.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. }
                | ClientError::SelfConnect { .. }
                | ClientError::Handshake { .. }
                | ClientError::DaemonDied { .. }
                | ClientError::StartupTimeout { .. }
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
