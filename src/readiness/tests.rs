use super::*;
use std::cell::Cell;

use tokio::net::TcpListener;

const FAST: Duration = Duration::from_millis(1);

#[tokio::test]
async fn succeeds_immediately_without_sleeping() {
    let calls = Cell::new(0u32);
    let result = poll_until("thing", FAST, 5, || {
        calls.set(calls.get() + 1);
        async { true }
    })
    .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn stops_probing_after_first_success() {
    let calls = Cell::new(0u32);
    let result = poll_until("thing", FAST, 10, || {
        calls.set(calls.get() + 1);
        let ready = calls.get() >= 3;
        async move { ready }
    })
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.get(), 3);
}

#[tokio::test]
async fn exhausts_after_exactly_max_attempts() {
    let calls = Cell::new(0u32);
    let result = poll_until("thing", FAST, 4, || {
        calls.set(calls.get() + 1);
        async { false }
    })
    .await;

    assert_eq!(calls.get(), 4);
    match result {
        Err(CliError::ReadinessTimeout { what, attempts }) => {
            assert_eq!(what, "thing");
            assert_eq!(attempts, 4);
        }
        other => panic!("expected ReadinessTimeout, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn port_probe_sees_listening_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    assert!(port_open(port).await);
}

#[tokio::test]
async fn port_probe_fails_on_closed_port() {
    // Bind then drop to get a port that is very likely closed
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = poll_until("closed port", FAST, 2, || port_open(port)).await;
    assert!(result.is_err());
}
