// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stop events recorded when a daemon terminates or gets evicted.

use crate::daemon::DaemonId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fine-grained cause a daemon reported when it expired.
///
/// Variant order is load-bearing: when several events exist for one
/// daemon id, the highest-sorting status wins during dedup, and any
/// recorded status beats none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DaemonExpirationStatus {
    QuietExpire,
    GracefulExpire,
    ImmediateExpire,
}

/// A daemon termination or eviction, appended to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStopEvent {
    pub daemon_id: DaemonId,
    pub timestamp_ms: u64,
    pub status: Option<DaemonExpirationStatus>,
    pub reason: String,
}

/// Split stop events into those past the retention window and the rest.
///
/// Returns `(expired, recent)`. An event exactly at the cutoff counts as
/// recent.
pub fn partition_expired(
    events: Vec<DaemonStopEvent>,
    now_ms: u64,
    retention: Duration,
) -> (Vec<DaemonStopEvent>, Vec<DaemonStopEvent>) {
    let cutoff = now_ms.saturating_sub(retention.as_millis() as u64);
    events.into_iter().partition(|e| e.timestamp_ms < cutoff)
}

/// Collapse recent stop events to at most one per daemon id.
///
/// Keeps the event whose `status` sorts highest (`None` loses to any
/// recorded status). Ties keep the last-stored event. First-seen order of
/// daemon ids is preserved.
pub fn dedup_by_daemon(events: Vec<DaemonStopEvent>) -> Vec<DaemonStopEvent> {
    let mut deduped: Vec<DaemonStopEvent> = Vec::new();
    for event in events {
        match deduped.iter_mut().find(|e| e.daemon_id == event.daemon_id) {
            Some(existing) => {
                if event.status >= existing.status {
                    *existing = event;
                }
            }
            None => deduped.push(event),
        }
    }
    deduped
}

#[cfg(test)]
#[path = "stop_event_tests.rs"]
mod tests;
