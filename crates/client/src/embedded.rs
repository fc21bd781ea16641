// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process daemon hosting for the no-daemon variant.

use crate::params::DaemonParameters;
use mvnd_core::DaemonId;
use mvnd_registry::DaemonRegistry;
use std::sync::Arc;

/// A daemon server linked into the client binary.
///
/// When a build links an implementation in, the connector can host the
/// daemon on a background thread instead of spawning a process. The
/// implementation must behave exactly like an external daemon: store a
/// `Busy` record for the given id, accept connections on the recorded
/// port, and flip itself `Idle` once ready. Parameters arrive through
/// this call; there is no process-global configuration.
pub trait EmbeddedServer: Send {
    fn run(
        self: Box<Self>,
        id: DaemonId,
        parameters: DaemonParameters,
        registry: Arc<dyn DaemonRegistry>,
    );
}
