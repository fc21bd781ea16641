//! Evicting registry records whose address no longer answers.

use crate::prelude::*;
use mvnd_client::{ClientError, DaemonConnector, STALE_REASON};
use mvnd_core::{DaemonId, DaemonState, FakeClock};
use mvnd_registry::{DaemonRegistry, InMemoryRegistry};
use std::sync::Arc;

/// A stale idle record is evicted with exactly one removal and one stop
/// event, then the connector falls through to starting a new daemon.
#[test]
fn stale_idle_daemon_is_evicted_then_new_daemon_started() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    registry.store(daemon_record("d1", dead_port(), DaemonState::Idle));

    let (starter, started) = RegisteringStarter::new(Arc::clone(&registry));
    let (status, messages) = RecordingStatus::new();
    let mut connector = DaemonConnector::new(
        parameters(dir.path()),
        Arc::clone(&registry) as Arc<dyn DaemonRegistry>,
        starter,
        FakeClock::new(),
    )
    .with_status_listener(status);

    let connection = connector.connect().unwrap();
    assert!(connection.is_new_daemon());
    assert_eq!(started.lock().unwrap().len(), 1);

    assert!(registry.get(&DaemonId::new("d1")).is_none(), "stale record must be evicted");
    let events: Vec<_> = registry
        .stop_events()
        .into_iter()
        .filter(|e| e.daemon_id == DaemonId::new("d1"))
        .collect();
    assert_eq!(events.len(), 1, "exactly one stop event per eviction");
    assert_eq!(events[0].reason, STALE_REASON);
    assert_eq!(events[0].status, None);

    let messages = messages.lock().unwrap();
    let startup = &messages[1];
    assert!(startup.contains("1 stopped"), "message: {}", startup);
    assert!(startup.contains("could not be reused"), "message: {}", startup);
}

/// Discovering mid-session that the daemon died evicts its record the
/// same way a failed dial does.
#[test]
fn connection_death_evicts_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let (_listener, port) = listener();
    registry.store(daemon_record("d1", port, DaemonState::Idle));

    let (starter, _calls) = RefusingStarter::new();
    let mut connector = DaemonConnector::new(
        parameters(dir.path()),
        Arc::clone(&registry) as Arc<dyn DaemonRegistry>,
        starter,
        FakeClock::new(),
    );
    let connection = connector.connect().unwrap();

    let cause = ClientError::Connect {
        port,
        source: std::io::Error::from(std::io::ErrorKind::ConnectionReset),
    };
    connection.connection_died(&cause);

    assert!(registry.get(&DaemonId::new("d1")).is_none());
    assert_eq!(registry.stop_events().len(), 1);
    assert_eq!(registry.stop_events()[0].reason, STALE_REASON);
}
