// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The connection handed back to the caller after a successful dial.

use crate::error::ClientError;
use crate::params::DaemonParameters;
use crate::stale::StaleAddressCleanup;
use mvnd_core::{Clock, DaemonInfo};
use std::io::{Read, Write};
use std::net::TcpStream;

/// An open, verified stream to a daemon.
///
/// Carries the registry record observed at connect time together with
/// the stale-address cleanup for it, so a later discovery that the
/// session died can still evict the record via
/// [`ClientConnection::connection_died`].
pub struct ClientConnection<C: Clock> {
    stream: TcpStream,
    daemon: DaemonInfo,
    cleanup: StaleAddressCleanup<C>,
    new_daemon: bool,
    parameters: DaemonParameters,
}

impl<C: Clock + std::fmt::Debug> std::fmt::Debug for ClientConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConnection")
            .field("stream", &self.stream)
            .field("daemon", &self.daemon)
            .field("cleanup", &self.cleanup)
            .field("new_daemon", &self.new_daemon)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl<C: Clock> ClientConnection<C> {
    pub(crate) fn new(
        stream: TcpStream,
        daemon: DaemonInfo,
        cleanup: StaleAddressCleanup<C>,
        new_daemon: bool,
        parameters: DaemonParameters,
    ) -> Self {
        Self { stream, daemon, cleanup, new_daemon, parameters }
    }

    /// The registry record this connection was opened against.
    pub fn daemon(&self) -> &DaemonInfo {
        &self.daemon
    }

    /// True when this connection resulted from starting a fresh daemon.
    pub fn is_new_daemon(&self) -> bool {
        self.new_daemon
    }

    pub fn parameters(&self) -> &DaemonParameters {
        &self.parameters
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    /// Evict the daemon's record after the session died underneath us.
    pub fn connection_died(&self, cause: &ClientError) {
        self.cleanup.clean(cause);
    }
}

impl<C: Clock> Read for ClientConnection<C> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }
}

impl<C: Clock> Write for ClientConnection<C> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stream.flush()
    }
}
