// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! mvnd-client: finds, starts, and connects to build daemons.
//!
//! One call to [`DaemonConnector::connect`] yields a socket session with
//! exactly one compatible daemon on the local host, starting a fresh
//! daemon process when nothing usable is registered.

pub mod connection;
pub mod connector;
pub mod dialer;
pub mod diagnostics;
pub mod embedded;
pub mod error;
pub mod interrupt;
pub mod launcher;
pub mod params;
pub mod stale;

pub use connection::ClientConnection;
pub use connector::{
    DaemonConnector, DiscardStatus, StatusListener, CANCELED_WAIT_TIMEOUT,
    DEFAULT_CONNECT_TIMEOUT, EMBEDDED_POLL_INTERVAL, HANDSHAKE_POLL_INTERVAL,
    STOP_EVENT_RETENTION,
};
pub use dialer::CONNECT_TIMEOUT;
pub use embedded::EmbeddedServer;
pub use error::ClientError;
pub use interrupt::Interrupt;
pub use launcher::{DaemonHandle, DaemonStarter, ProcessStarter, DAEMON_ENTRY_CLASS};
pub use params::DaemonParameters;
pub use stale::{StaleAddressCleanup, STALE_REASON};
