// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level connect policy: reuse an idle daemon, wait for a canceled
//! one, or start a fresh daemon and poll it into service.

use crate::connection::ClientConnection;
use crate::dialer;
use crate::diagnostics::daemon_diagnostics;
use crate::embedded::EmbeddedServer;
use crate::error::ClientError;
use crate::interrupt::Interrupt;
use crate::launcher::{DaemonHandle, DaemonStarter};
use crate::params::DaemonParameters;
use crate::stale::StaleAddressCleanup;
use mvnd_core::{dedup_by_daemon, partition_expired, Clock, Constraint, DaemonId, DaemonInfo};
use mvnd_registry::DaemonRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Total budget for reaching a daemon after deciding to start one.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// How long to wait for a canceled daemon to come back to idle.
pub const CANCELED_WAIT_TIMEOUT: Duration = Duration::from_secs(3);
/// Poll interval while waiting for a launched daemon's first contact.
pub const HANDSHAKE_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Poll interval while the embedded daemon thread starts up.
pub const EMBEDDED_POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Stop events older than this are garbage collected.
pub const STOP_EVENT_RETENTION: Duration = Duration::from_secs(3600);

/// Receives progress messages meant for the user.
pub trait StatusListener: Send {
    fn status(&mut self, message: &str);
}

/// Listener that drops every message.
#[derive(Default)]
pub struct DiscardStatus;

impl StatusListener for DiscardStatus {
    fn status(&mut self, _message: &str) {}
}

/// Finds, starts, and connects to a compatible daemon.
///
/// Holds no cross-call state beyond its injected collaborators; the
/// registry is the only serialization point between concurrent clients.
pub struct DaemonConnector<C: Clock> {
    registry: Arc<dyn DaemonRegistry>,
    parameters: DaemonParameters,
    starter: Box<dyn DaemonStarter>,
    embedded: Option<Box<dyn EmbeddedServer>>,
    clock: C,
    interrupt: Interrupt,
    output: Box<dyn StatusListener>,
}

impl<C: Clock> DaemonConnector<C> {
    pub fn new(
        parameters: DaemonParameters,
        registry: Arc<dyn DaemonRegistry>,
        starter: Box<dyn DaemonStarter>,
        clock: C,
    ) -> Self {
        Self {
            registry,
            parameters,
            starter,
            embedded: None,
            clock,
            interrupt: Interrupt::new(),
            output: Box::new(DiscardStatus),
        }
    }

    /// Host this server in-process when the no-daemon variant is chosen.
    pub fn with_embedded_server(mut self, server: Box<dyn EmbeddedServer>) -> Self {
        self.embedded = Some(server);
        self
    }

    pub fn with_status_listener(mut self, output: Box<dyn StatusListener>) -> Self {
        self.output = output;
        self
    }

    /// Flag checked during waits; set it from another thread to abort.
    pub fn interrupt_handle(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Find or start a compatible daemon and open a session to it.
    ///
    /// Tries idle daemons first, then waits briefly for a canceled one
    /// to come back, and finally starts a fresh daemon. Every candidate
    /// whose address does not answer is evicted along the way.
    pub fn connect(&mut self) -> Result<ClientConnection<C>, ClientError> {
        self.output.status("Looking up daemon...");
        if self.parameters.no_daemon {
            return self.connect_embedded();
        }

        let constraint = self.parameters.constraint();
        let daemons = self.registry.all();
        debug!(count = daemons.len(), "registry snapshot");
        let (idle, busy): (Vec<DaemonInfo>, Vec<DaemonInfo>) =
            daemons.into_iter().partition(DaemonInfo::is_idle);

        let compatible_idle = self.compatible(&idle, &constraint);
        if let Some(connection) = self.try_connect_any(&compatible_idle) {
            return Ok(connection);
        }

        let canceled: Vec<DaemonInfo> =
            busy.iter().filter(|d| d.is_canceled()).cloned().collect();
        if !self.compatible(&canceled, &constraint).is_empty() {
            if let Some(connection) = self.await_canceled_daemon(&constraint)? {
                return Ok(connection);
            }
        }

        self.start_new_daemon(busy.len(), compatible_idle.len())
    }

    /// Dial one candidate. On failure the record is evicted before the
    /// error propagates; eviction never masks the dial error.
    pub fn connect_to_daemon(
        &self,
        daemon: &DaemonInfo,
        new_daemon: bool,
    ) -> Result<ClientConnection<C>, ClientError> {
        let cleanup = StaleAddressCleanup::new(
            daemon.clone(),
            Arc::clone(&self.registry),
            self.clock.clone(),
        );
        match dialer::dial(daemon.address) {
            Ok(stream) => Ok(ClientConnection::new(
                stream,
                daemon.clone(),
                cleanup,
                new_daemon,
                self.parameters.clone(),
            )),
            Err(error) => {
                cleanup.clean(&error);
                Err(error)
            }
        }
    }

    fn compatible(&self, daemons: &[DaemonInfo], constraint: &Constraint) -> Vec<DaemonInfo> {
        daemons
            .iter()
            .filter(|daemon| {
                let result = constraint.check(daemon);
                if !result.compatible {
                    debug!(daemon = %daemon.id, why = %result.why, "skipping incompatible daemon");
                }
                result.compatible
            })
            .cloned()
            .collect()
    }

    /// Dial candidates in snapshot order; evict every address that fails.
    fn try_connect_any(&self, daemons: &[DaemonInfo]) -> Option<ClientConnection<C>> {
        for daemon in daemons {
            match self.connect_to_daemon(daemon, false) {
                Ok(connection) => {
                    debug!(daemon = %daemon.id, port = daemon.address, "reusing daemon");
                    return Some(connection);
                }
                Err(error) => {
                    debug!(daemon = %daemon.id, %error, "daemon did not answer, trying next candidate");
                }
            }
        }
        None
    }

    /// A compatible daemon had its build canceled; give it a short
    /// window to return to idle before starting another process.
    fn await_canceled_daemon(
        &self,
        constraint: &Constraint,
    ) -> Result<Option<ClientConnection<C>>, ClientError> {
        info!("waiting for a canceled daemon to become idle");
        let deadline = self.clock.now() + CANCELED_WAIT_TIMEOUT;
        loop {
            let idle = self.registry.idle();
            let compatible = self.compatible(&idle, constraint);
            if let Some(connection) = self.try_connect_any(&compatible) {
                return Ok(Some(connection));
            }
            if self.clock.now() >= deadline {
                return Ok(None);
            }
            self.sleep(HANDSHAKE_POLL_INTERVAL)?;
        }
    }

    fn start_new_daemon(
        &mut self,
        num_busy: usize,
        num_incompatible: usize,
    ) -> Result<ClientConnection<C>, ClientError> {
        let id = DaemonId::random();
        let num_stopped = self.collect_recent_stop_events();
        self.output
            .status(&startup_message(&id, num_busy, num_incompatible, num_stopped));
        info!(daemon = %id, "starting new daemon process");
        let handle = self.starter.start(&id)?;
        self.await_first_contact(id, handle, HANDSHAKE_POLL_INTERVAL)
    }

    /// GC stop events past retention, then count the recent ones, at
    /// most one per daemon id.
    fn collect_recent_stop_events(&self) -> usize {
        let now_ms = self.clock.epoch_ms();
        let (expired, recent) =
            partition_expired(self.registry.stop_events(), now_ms, STOP_EVENT_RETENTION);
        if !expired.is_empty() {
            debug!(count = expired.len(), "garbage collecting expired stop events");
            self.registry.remove_stop_events(&expired);
        }
        dedup_by_daemon(recent).len()
    }

    /// Shared post-start poll for both the spawned and the embedded
    /// daemon: wait for the new record, then make first contact. A
    /// connect failure after the record appeared is fatal.
    fn await_first_contact(
        &mut self,
        id: DaemonId,
        mut handle: DaemonHandle,
        interval: Duration,
    ) -> Result<ClientConnection<C>, ClientError> {
        let log_path = self.parameters.daemon_log_path(&id);
        let deadline = self.clock.now() + DEFAULT_CONNECT_TIMEOUT;
        loop {
            if let Some(info) = self.registry.get(&id) {
                debug!(daemon = %id, port = info.address, "new daemon registered, connecting");
                return match self.connect_to_daemon(&info, true) {
                    Ok(connection) => Ok(connection),
                    Err(error) => Err(ClientError::Handshake {
                        cause: error.to_string(),
                        diagnostics: daemon_diagnostics(&id, &log_path, &mut handle),
                        id,
                    }),
                };
            }

            if !handle.is_alive() {
                return Err(ClientError::DaemonDied {
                    diagnostics: daemon_diagnostics(&id, &log_path, &mut handle),
                    id,
                });
            }
            if self.clock.now() >= deadline {
                return Err(ClientError::StartupTimeout {
                    diagnostics: daemon_diagnostics(&id, &log_path, &mut handle),
                });
            }
            self.sleep(interval)?;
        }
    }

    /// Run the daemon inside this process on a background thread.
    fn connect_embedded(&mut self) -> Result<ClientConnection<C>, ClientError> {
        let Some(server) = self.embedded.take() else {
            return Err(ClientError::Unsupported(
                "this build does not link an in-process daemon server".to_string(),
            ));
        };

        let id = DaemonId::embedded(std::process::id(), self.clock.epoch_ms());
        info!(daemon = %id, "starting embedded daemon");
        let parameters = self.parameters.clone();
        let registry = Arc::clone(&self.registry);
        let thread_id = id.clone();
        let thread = std::thread::Builder::new()
            .name(format!("mvnd-daemon-{}", id))
            .spawn(move || server.run(thread_id, parameters, registry))
            .map_err(|e| ClientError::Start {
                id: id.clone(),
                dir: self.parameters.project_dir.clone(),
                command: "<in-process daemon thread>".to_string(),
                message: e.to_string(),
            })?;

        self.await_first_contact(id, DaemonHandle::Thread(thread), EMBEDDED_POLL_INTERVAL)
    }

    /// Sleep via the clock, surfacing interruption as a fatal error.
    fn sleep(&self, duration: Duration) -> Result<(), ClientError> {
        if self.interrupt.is_set() {
            return Err(ClientError::Interrupted);
        }
        self.clock.sleep(duration);
        if self.interrupt.is_set() {
            return Err(ClientError::Interrupted);
        }
        Ok(())
    }
}

/// User-facing message for the launch path.
///
/// `num_incompatible` receives the count of compatible idle daemons,
/// matching the long-standing behavior of the status report.
fn startup_message(
    id: &DaemonId,
    num_busy: usize,
    num_incompatible: usize,
    num_stopped: usize,
) -> String {
    let total = num_busy + num_incompatible + num_stopped;
    if total == 0 {
        return format!("Starting new daemon {} (subsequent builds will be faster)...", id);
    }

    let mut reasons: Vec<String> = Vec::new();
    if num_busy > 0 {
        reasons.push(format!("{} busy", num_busy));
    }
    if num_incompatible > 0 {
        reasons.push(format!("{} incompatible", num_incompatible));
    }
    if num_stopped > 0 {
        reasons.push(format!("{} stopped", num_stopped));
    }
    let plural = if total > 1 { "s" } else { "" };
    format!(
        "Starting new daemon {}, {} daemon{} could not be reused, use --status for details",
        id,
        reasons.join(" and "),
        plural,
    )
}

#[cfg(test)]
#[path = "connector_tests.rs"]
mod tests;
