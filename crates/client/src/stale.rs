// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Eviction of registry records whose address no longer answers.

use crate::error::ClientError;
use mvnd_core::{Clock, DaemonInfo, DaemonStopEvent};
use mvnd_registry::DaemonRegistry;
use std::sync::Arc;
use tracing::debug;

/// Reason recorded when a daemon vanished without updating the registry.
pub const STALE_REASON: &str = "by user or operating system";

/// Removes a daemon's record once its address is known dead.
///
/// Holds the record, the registry handle, and a clock, nothing else.
/// The connection that carries this value is never referenced back, so
/// the two can be dropped in any order.
pub struct StaleAddressCleanup<C: Clock> {
    daemon: DaemonInfo,
    registry: Arc<dyn DaemonRegistry>,
    clock: C,
}

impl<C: Clock + std::fmt::Debug> std::fmt::Debug for StaleAddressCleanup<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaleAddressCleanup")
            .field("daemon", &self.daemon)
            .field("clock", &self.clock)
            .finish()
    }
}

impl<C: Clock> StaleAddressCleanup<C> {
    pub fn new(daemon: DaemonInfo, registry: Arc<dyn DaemonRegistry>, clock: C) -> Self {
        Self { daemon, registry, clock }
    }

    /// Record a stop event and drop the daemon's record.
    ///
    /// Safe to invoke more than once for the same daemon: removal of an
    /// absent record is a no-op. Always returns true: the address was
    /// stale.
    pub fn clean(&self, cause: &ClientError) -> bool {
        debug!(daemon = %self.daemon.id, %cause, "removing daemon from the registry, address is stale");
        self.registry.store_stop_event(DaemonStopEvent {
            daemon_id: self.daemon.id.clone(),
            timestamp_ms: self.clock.epoch_ms(),
            status: None,
            reason: STALE_REASON.to_string(),
        });
        self.registry.remove(&self.daemon.id);
        true
    }

    pub fn daemon(&self) -> &DaemonInfo {
        &self.daemon
    }
}

#[cfg(test)]
#[path = "stale_tests.rs"]
mod tests;
