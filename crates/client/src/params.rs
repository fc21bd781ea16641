// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Constructor-injected configuration for the daemon connector.

use mvnd_core::{Constraint, DaemonId};
use std::path::PathBuf;

/// Everything the connector needs to find, compare, and start daemons.
///
/// Parameter resolution (CLI flags, properties files, environment)
/// happens upstream; by the time this struct exists every value is
/// final.
#[derive(Debug, Clone)]
pub struct DaemonParameters {
    /// Distribution home holding the `lib` directory with the daemon jars.
    pub mvnd_home: PathBuf,
    /// Effective JRE home used to run daemons; also a compatibility key.
    pub java_home: PathBuf,
    /// Directory for per-daemon storage (logs, caches).
    pub storage_dir: PathBuf,
    /// Location of the shared registry file.
    pub registry_path: PathBuf,
    /// Logging configuration handed to new daemons.
    pub log_config_path: PathBuf,
    /// Project directory; searched for `.mvn/jvm.config`.
    pub project_dir: PathBuf,
    /// Free-form JVM args from configuration.
    pub jvm_args: Vec<String>,
    pub min_heap: Option<String>,
    pub max_heap: Option<String>,
    /// Remote-debug listen address; enables the jdwp agent when set.
    pub debug_address: Option<String>,
    /// Options whose value must match exactly for a daemon to be reused.
    pub discriminating_options: Vec<(String, String)>,
    /// Run the build in-process instead of connecting to a daemon.
    pub no_daemon: bool,
}

impl DaemonParameters {
    /// The compatibility requirements derived from these parameters.
    pub fn constraint(&self) -> Constraint {
        Constraint {
            java_home: self.java_home.clone(),
            options: self.rendered_discriminating_options(),
        }
    }

    pub(crate) fn rendered_discriminating_options(&self) -> Vec<String> {
        self.discriminating_options
            .iter()
            .map(|(key, value)| format!("-D{}={}", key, value))
            .collect()
    }

    /// The fixed `-D` options every spawned daemon receives.
    pub(crate) fn daemon_opts(&self, id: &DaemonId) -> Vec<String> {
        vec![
            format!("-Dmvnd.home={}", self.mvnd_home.display()),
            format!("-Djava.home={}", self.java_home.display()),
            format!("-Dlogback.configurationFile={}", self.log_config_path.display()),
            format!("-Dmvnd.id={}", id),
            format!("-Dmvnd.daemonStorage={}", self.storage_dir.display()),
            format!("-Dmvnd.registry={}", self.registry_path.display()),
        ]
    }

    /// Per-daemon log file receiving the child's stdout and stderr.
    pub fn daemon_log_path(&self, id: &DaemonId) -> PathBuf {
        self.storage_dir.join(format!("daemon-{}.out.log", id))
    }

    /// `.mvn/jvm.config` for the current project.
    pub(crate) fn project_jvm_config(&self) -> PathBuf {
        self.project_dir.join(".mvn").join("jvm.config")
    }
}

#[cfg(test)]
#[path = "params_tests.rs"]
mod tests;
