//! Reusing registered idle daemons.

use crate::prelude::*;
use mvnd_client::DaemonConnector;
use mvnd_core::{DaemonId, DaemonState, FakeClock, RuntimeProfile};
use mvnd_registry::{DaemonRegistry, InMemoryRegistry};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// An idle compatible daemon that answers its port is reused; nothing
/// gets spawned and the record survives.
#[test]
fn idle_compatible_daemon_is_reused_without_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let (_listener, port) = listener();
    registry.store(daemon_record("d1", port, DaemonState::Idle));

    let (starter, calls) = RefusingStarter::new();
    let mut connector = DaemonConnector::new(
        parameters(dir.path()),
        Arc::clone(&registry) as Arc<dyn DaemonRegistry>,
        starter,
        FakeClock::new(),
    );

    let connection = connector.connect().unwrap();
    assert_eq!(connection.daemon().id, DaemonId::new("d1"));
    assert!(!connection.is_new_daemon());
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no daemon may be started");
    assert!(registry.get(&DaemonId::new("d1")).is_some(), "record must survive reuse");
}

/// Candidates are dialed in snapshot order; the first one that answers
/// wins and later candidates are never touched.
#[test]
fn first_compatible_idle_daemon_wins() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let (_l1, port1) = listener();
    let (_l2, port2) = listener();
    registry.store(daemon_record("d1", port1, DaemonState::Idle));
    registry.store(daemon_record("d2", port2, DaemonState::Idle));

    let (starter, _calls) = RefusingStarter::new();
    let mut connector = DaemonConnector::new(
        parameters(dir.path()),
        Arc::clone(&registry) as Arc<dyn DaemonRegistry>,
        starter,
        FakeClock::new(),
    );

    let connection = connector.connect().unwrap();
    assert_eq!(connection.daemon().id, DaemonId::new("d1"));
    assert_eq!(registry.all().len(), 2, "no eviction on the untried candidate");
}

/// An idle daemon with a different JVM is skipped without being dialed
/// or evicted; a fresh daemon is started instead.
#[test]
fn incompatible_idle_daemon_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let mut other_jvm = daemon_record("d1", dead_port(), DaemonState::Idle);
    other_jvm.profile = RuntimeProfile { java_home: "/opt/jdk11".into(), options: vec![] };
    registry.store(other_jvm);

    let (starter, started) = RegisteringStarter::new(Arc::clone(&registry));
    let mut connector = DaemonConnector::new(
        parameters(dir.path()),
        Arc::clone(&registry) as Arc<dyn DaemonRegistry>,
        starter,
        FakeClock::new(),
    );

    let connection = connector.connect().unwrap();
    assert!(connection.is_new_daemon());
    assert_eq!(started.lock().unwrap().len(), 1);
    assert!(
        registry.get(&DaemonId::new("d1")).is_some(),
        "an incompatible daemon is skipped, not evicted"
    );
}

/// Once a daemon is consumed it reports itself busy through the
/// registry; a second client cannot obtain it and falls through to the
/// launch path.
#[test]
fn consumed_daemon_is_not_handed_to_a_second_client() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let (_listener, port) = listener();
    registry.store(daemon_record("d1", port, DaemonState::Idle));

    let (starter, calls) = RefusingStarter::new();
    let mut first = DaemonConnector::new(
        parameters(dir.path()),
        Arc::clone(&registry) as Arc<dyn DaemonRegistry>,
        starter,
        FakeClock::new(),
    );
    let connection = first.connect().unwrap();
    assert_eq!(connection.daemon().id, DaemonId::new("d1"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // The daemon flips itself busy on accept.
    registry.set_state(&DaemonId::new("d1"), DaemonState::Busy);

    let (starter, calls) = RefusingStarter::new();
    let mut second = DaemonConnector::new(
        parameters(dir.path()),
        Arc::clone(&registry) as Arc<dyn DaemonRegistry>,
        starter,
        FakeClock::new(),
    );
    let error = second.connect().unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "second client must try the launch path");
    assert!(matches!(error, mvnd_client::ClientError::Start { .. }));
}
