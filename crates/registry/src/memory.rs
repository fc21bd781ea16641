// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process registry used by the embedded daemon variant and by tests.

use crate::registry::DaemonRegistry;
use mvnd_core::{DaemonId, DaemonInfo, DaemonState, DaemonStopEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct Inner {
    daemons: HashMap<DaemonId, DaemonInfo>,
    stop_events: Vec<DaemonStopEvent>,
}

/// Registry backed by process memory under a single mutex.
///
/// Each trait method takes and releases the lock once, which gives the
/// same per-operation atomicity the file-backed store provides across
/// processes.
#[derive(Default)]
pub struct InMemoryRegistry {
    inner: Mutex<Inner>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update a record's state in place, if the record still exists.
    pub fn set_state(&self, id: &DaemonId, state: DaemonState) {
        let mut inner = self.inner.lock();
        if let Some(info) = inner.daemons.get_mut(id) {
            info.state = state;
        }
    }
}

impl DaemonRegistry for InMemoryRegistry {
    fn all(&self) -> Vec<DaemonInfo> {
        let mut daemons: Vec<DaemonInfo> = self.inner.lock().daemons.values().cloned().collect();
        // HashMap iteration order is arbitrary; callers get a stable view.
        daemons.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        daemons
    }

    fn get(&self, id: &DaemonId) -> Option<DaemonInfo> {
        self.inner.lock().daemons.get(id).cloned()
    }

    fn store(&self, info: DaemonInfo) {
        debug!(daemon = %info.id, state = ?info.state, "storing daemon record");
        self.inner.lock().daemons.insert(info.id.clone(), info);
    }

    fn remove(&self, id: &DaemonId) {
        self.inner.lock().daemons.remove(id);
    }

    fn stop_events(&self) -> Vec<DaemonStopEvent> {
        self.inner.lock().stop_events.clone()
    }

    fn store_stop_event(&self, event: DaemonStopEvent) {
        debug!(daemon = %event.daemon_id, reason = %event.reason, "storing stop event");
        self.inner.lock().stop_events.push(event);
    }

    fn remove_stop_events(&self, events: &[DaemonStopEvent]) {
        let mut inner = self.inner.lock();
        inner.stop_events.retain(|existing| {
            !events
                .iter()
                .any(|e| e.daemon_id == existing.daemon_id && e.timestamp_ms == existing.timestamp_ms)
        });
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
