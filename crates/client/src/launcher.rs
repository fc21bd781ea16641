// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assembling and spawning daemon processes.

use crate::error::ClientError;
use crate::params::DaemonParameters;
use mvnd_core::DaemonId;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use tracing::{debug, info};

/// Class started as the daemon's main entry point, always last in argv.
pub const DAEMON_ENTRY_CLASS: &str = "org.mvndaemon.mvnd.daemon.Server";

const COMMON_JAR_PREFIX: &str = "mvnd-common-";
const AGENT_JAR_PREFIX: &str = "mvnd-agent-";

const CLASSPATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// A started daemon whose liveness can be polled.
///
/// The daemon is not owned by the client: the handle exists only so the
/// connector can notice an early death while waiting for first contact,
/// and is dropped as soon as a connection exists.
pub enum DaemonHandle {
    Process(Child),
    Thread(JoinHandle<()>),
}

impl DaemonHandle {
    /// Whether the daemon is still running. When the OS cannot answer,
    /// the daemon is assumed alive and the poll loop's budget decides.
    pub fn is_alive(&mut self) -> bool {
        match self {
            DaemonHandle::Process(child) => match child.try_wait() {
                Ok(Some(_)) => false,
                Ok(None) | Err(_) => true,
            },
            DaemonHandle::Thread(handle) => !handle.is_finished(),
        }
    }

    /// Short human-readable process state for diagnostics.
    pub fn describe_state(&mut self) -> String {
        match self {
            DaemonHandle::Process(child) => match child.try_wait() {
                Ok(None) => "process is alive".to_string(),
                Ok(Some(status)) => format!("process exited with {}", status),
                Err(error) => format!("process state unknown: {}", error),
            },
            DaemonHandle::Thread(handle) => {
                if handle.is_finished() {
                    "daemon thread has terminated".to_string()
                } else {
                    "daemon thread is alive".to_string()
                }
            }
        }
    }
}

/// Seam between the orchestrator and the OS: starts a daemon and hands
/// back something whose liveness can be polled.
pub trait DaemonStarter {
    fn start(&self, id: &DaemonId) -> Result<DaemonHandle, ClientError>;
}

/// Spawns a real daemon JVM, detached from the calling process.
pub struct ProcessStarter {
    parameters: DaemonParameters,
}

impl ProcessStarter {
    pub fn new(parameters: DaemonParameters) -> Self {
        Self { parameters }
    }

    /// Assemble the full argv, executable first.
    ///
    /// Ordering is part of the contract: classpath, agent, debug, user
    /// args, per-project args, heap sizes, mandatory daemon options,
    /// discriminating options, entry-point class last.
    pub fn build_command(&self, id: &DaemonId) -> Result<Vec<String>, ClientError> {
        let params = &self.parameters;
        let lib_dir = params.mvnd_home.join("lib");
        let common = find_artifact(&lib_dir, COMMON_JAR_PREFIX)
            .map_err(|message| self.start_error(id, String::new(), message))?;
        let agent = find_artifact(&lib_dir, AGENT_JAR_PREFIX)
            .map_err(|message| self.start_error(id, String::new(), message))?;

        let mut argv = vec![java_executable(&params.java_home).display().to_string()];
        argv.push("-classpath".to_string());
        argv.push(format!(
            "{}{}{}",
            common.display(),
            CLASSPATH_SEPARATOR,
            agent.display()
        ));
        argv.push(format!("-javaagent:{}", agent.display()));
        if let Some(address) = &params.debug_address {
            argv.push(format!(
                "-agentlib:jdwp=transport=dt_socket,server=y,suspend=y,address={}",
                address
            ));
        }
        argv.extend(params.jvm_args.iter().cloned());
        argv.extend(read_project_jvm_args(&params.project_jvm_config()));
        if let Some(min) = &params.min_heap {
            argv.push(format!("-Xms{}", min));
        }
        if let Some(max) = &params.max_heap {
            argv.push(format!("-Xmx{}", max));
        }
        argv.extend(params.daemon_opts(id));
        argv.extend(params.rendered_discriminating_options());
        argv.push(DAEMON_ENTRY_CLASS.to_string());
        Ok(argv)
    }

    fn start_error(&self, id: &DaemonId, command: String, message: String) -> ClientError {
        ClientError::Start {
            id: id.clone(),
            dir: self.parameters.project_dir.clone(),
            command,
            message,
        }
    }
}

impl DaemonStarter for ProcessStarter {
    fn start(&self, id: &DaemonId) -> Result<DaemonHandle, ClientError> {
        let argv = self.build_command(id)?;
        let command_line = argv.join(" ");
        let params = &self.parameters;

        std::fs::create_dir_all(&params.storage_dir)
            .map_err(|e| self.start_error(id, command_line.clone(), e.to_string()))?;
        let log_path = params.daemon_log_path(id);
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| self.start_error(id, command_line.clone(), e.to_string()))?;
        let log_err = log
            .try_clone()
            .map_err(|e| self.start_error(id, command_line.clone(), e.to_string()))?;

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .current_dir(&params.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        #[cfg(unix)]
        {
            // The daemon must outlive this client and its terminal.
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        info!(daemon = %id, command = %command_line, "starting daemon process");
        let child = command
            .spawn()
            .map_err(|e| self.start_error(id, command_line.clone(), e.to_string()))?;
        debug!(daemon = %id, pid = child.id(), log = %log_path.display(), "daemon process spawned");
        Ok(DaemonHandle::Process(child))
    }
}

fn java_executable(java_home: &Path) -> PathBuf {
    let exe = if cfg!(windows) { "java.exe" } else { "java" };
    java_home.join("bin").join(exe)
}

/// Locate the single jar in `lib_dir` whose name starts with `prefix`.
fn find_artifact(lib_dir: &Path, prefix: &str) -> Result<PathBuf, String> {
    let entries = std::fs::read_dir(lib_dir)
        .map_err(|e| format!("could not list {}: {}", lib_dir.display(), e))?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(".jar") {
            return Ok(entry.path());
        }
    }
    Err(format!("no {}*.jar found in {}", prefix, lib_dir.display()))
}

/// Extra JVM args from the per-project config file, whitespace-split.
/// An absent or unreadable file contributes nothing.
fn read_project_jvm_args(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => content.split_whitespace().map(|s| s.to_string()).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
