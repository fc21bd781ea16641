// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Blocking TCP dialer for daemon addresses.

use crate::error::ClientError;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;
use tracing::debug;

/// Hard per-socket connect deadline.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a loopback connection to a daemon's listen port.
///
/// On some systems a connect to a port with no listener can succeed by
/// landing on our own ephemeral endpoint; such a socket is useless and
/// is reported as [`ClientError::SelfConnect`] after closing it.
pub fn dial(port: u16) -> Result<TcpStream, ClientError> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)
        .map_err(|source| ClientError::Connect { port, source })?;

    let local = stream
        .local_addr()
        .map_err(|source| ClientError::Connect { port, source })?;
    let peer = stream
        .peer_addr()
        .map_err(|source| ClientError::Connect { port, source })?;
    if local == peer {
        drop(stream);
        return Err(ClientError::SelfConnect { port });
    }

    debug!(%peer, "connected to daemon");
    Ok(stream)
}

#[cfg(test)]
#[path = "dialer_tests.rs"]
mod tests;
