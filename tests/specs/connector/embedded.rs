//! The in-process (no-daemon) variant.

use crate::prelude::*;
use mvnd_client::{ClientError, DaemonConnector, DaemonParameters, EmbeddedServer};
use mvnd_core::{DaemonId, DaemonInfo, DaemonState, FakeClock, RuntimeProfile, SystemClock};
use mvnd_registry::{DaemonRegistry, InMemoryRegistry};
use std::net::TcpListener;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Server that behaves like a real daemon: registers busy, listens,
/// then idles.
struct LoopbackServer;

impl EmbeddedServer for LoopbackServer {
    fn run(
        self: Box<Self>,
        id: DaemonId,
        parameters: DaemonParameters,
        registry: Arc<dyn DaemonRegistry>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        registry.store(DaemonInfo {
            id,
            address: port,
            pid: std::process::id(),
            profile: RuntimeProfile {
                java_home: parameters.java_home.clone(),
                options: parameters.constraint().options,
            },
            state: DaemonState::Busy,
            last_seen_ms: 0,
        });
        // Hold the port open for the lifetime of the process.
        for stream in listener.incoming() {
            let _ = stream;
        }
    }
}

#[test]
fn embedded_server_is_hosted_and_connected() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let mut params = parameters(dir.path());
    params.no_daemon = true;

    let (starter, calls) = RefusingStarter::new();
    let mut connector =
        DaemonConnector::new(params, Arc::clone(&registry) as Arc<dyn DaemonRegistry>, starter, SystemClock)
            .with_embedded_server(Box::new(LoopbackServer));

    let connection = connector.connect().unwrap();
    assert!(connection.is_new_daemon());
    assert_eq!(calls.load(Ordering::SeqCst), 0, "no subprocess in embedded mode");

    let id = connection.daemon().id.clone();
    let expected_prefix = format!("{}-", std::process::id());
    assert!(
        id.as_str().starts_with(&expected_prefix),
        "embedded ids are <pid>-<millis>, got {}",
        id
    );
}

#[test]
fn embedded_mode_without_a_server_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let registry = Arc::new(InMemoryRegistry::new());
    let mut params = parameters(dir.path());
    params.no_daemon = true;

    let (starter, _calls) = RefusingStarter::new();
    let mut connector =
        DaemonConnector::new(params, registry as Arc<dyn DaemonRegistry>, starter, FakeClock::new());

    let error = connector.connect().unwrap_err();
    assert!(matches!(error, ClientError::Unsupported(_)), "got {}", error);
}
