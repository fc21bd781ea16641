// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-mortem context for daemons that never answered.

use crate::launcher::DaemonHandle;
use mvnd_core::DaemonId;
use std::path::Path;

const TAIL_LINES: usize = 60;

/// Summarize a daemon's log tail and process state for error messages.
pub fn daemon_diagnostics(id: &DaemonId, log_path: &Path, handle: &mut DaemonHandle) -> String {
    let state = handle.describe_state();
    match read_tail(log_path, TAIL_LINES) {
        Some(tail) if !tail.is_empty() => format!(
            "daemon {}: {}\n---- tail of {} ----\n{}",
            id,
            state,
            log_path.display(),
            tail,
        ),
        _ => format!("daemon {}: {}\nno log output at {}", id, state, log_path.display()),
    }
}

/// Last `n` lines of a file, if readable.
fn read_tail(path: &Path, n: usize) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    Some(lines[start..].join("\n"))
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
