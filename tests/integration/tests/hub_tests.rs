//! Broadcast hub end-to-end tests
//!
//! Each test starts its own gateway on an ephemeral port with the in-memory
//! history store; no external services are needed.
//!
//! Run with: cargo test -p integration-tests --test hub_tests

use std::time::Duration;

use hub_common::HubConfig;
use integration_tests::{is_stamped, test_hub_config, TestServer};
use reqwest::StatusCode;

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_reports_sessions() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok", "sessions": 0 }));

    let (_alice, _) = server.join().await.unwrap();
    server.wait_for_sessions(1).await.unwrap();
}

// ============================================================================
// Fanout Tests
// ============================================================================

#[tokio::test]
async fn test_message_reaches_every_session() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (mut alice, alice_name) = server.join().await.unwrap();
    let (mut bob, bob_name) = server.join().await.unwrap();
    assert_eq!(alice.next_line().await.unwrap(), format!("[{bob_name}] is online"));
    let (mut carol, carol_name) = server.join().await.unwrap();
    assert_eq!(alice.next_line().await.unwrap(), format!("[{carol_name}] is online"));
    assert_eq!(bob.next_line().await.unwrap(), format!("[{carol_name}] is online"));

    alice.say("  hello\nworld ").await.unwrap();

    for client in [&mut alice, &mut bob, &mut carol] {
        let line = client.next_line().await.unwrap();
        assert!(is_stamped(&line, &alice_name, "hello world"), "{line}");
    }
}

#[tokio::test]
async fn test_late_joiner_gets_history_first() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (mut alice, alice_name) = server.join().await.unwrap();
    alice.say("first").await.unwrap();
    alice.say("second").await.unwrap();
    assert!(is_stamped(&alice.next_line().await.unwrap(), &alice_name, "first"));
    assert!(is_stamped(&alice.next_line().await.unwrap(), &alice_name, "second"));

    let mut late = server.connect().await.unwrap();
    assert!(is_stamped(&late.next_line().await.unwrap(), &alice_name, "first"));
    assert!(is_stamped(&late.next_line().await.unwrap(), &alice_name, "second"));
    assert_eq!(late.next_line().await.unwrap(), "[bob] is online");

    alice.say("live").await.unwrap();
    assert!(is_stamped(&late.next_line().await.unwrap(), &alice_name, "live"));
}

#[tokio::test]
async fn test_notices_are_not_replayed() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (alice, _) = server.join().await.unwrap();
    alice.close().await.unwrap();
    server.wait_for_sessions(0).await.unwrap();

    // join() fails unless the first line is the joiner's own notice.
    let (_bob, bob_name) = server.join().await.unwrap();
    assert_eq!(bob_name, "bob");
}

// ============================================================================
// Teardown Tests
// ============================================================================

#[tokio::test]
async fn test_peer_close_notifies_others_once() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (alice, alice_name) = server.join().await.unwrap();
    let (mut bob, bob_name) = server.join().await.unwrap();
    server.wait_for_sessions(2).await.unwrap();

    alice.close().await.unwrap();
    assert_eq!(
        bob.next_line().await.unwrap(),
        format!("[{alice_name}] went offline")
    );
    server.wait_for_sessions(1).await.unwrap();

    bob.say("anyone?").await.unwrap();
    assert!(is_stamped(&bob.next_line().await.unwrap(), &bob_name, "anyone?"));
}

#[tokio::test]
async fn test_oversized_message_disconnects_sender() {
    let server = TestServer::start().await.expect("Failed to start server");

    let (mut alice, alice_name) = server.join().await.unwrap();
    let (mut bob, bob_name) = server.join().await.unwrap();
    assert_eq!(alice.next_line().await.unwrap(), format!("[{bob_name}] is online"));

    bob.say(&"x".repeat(513)).await.unwrap();

    let seen = bob.closed().await.unwrap();
    assert!(seen.is_empty(), "{seen:?}");
    assert_eq!(
        alice.next_line().await.unwrap(),
        format!("[{bob_name}] went offline")
    );
    server.wait_for_sessions(1).await.unwrap();

    // Nothing was persisted: a new joiner's first line is its own notice.
    let (_carol, carol_name) = server.join().await.unwrap();
    assert_eq!(
        alice.next_line().await.unwrap(),
        format!("[{carol_name}] is online")
    );

    alice.say("still here").await.unwrap();
    assert!(is_stamped(&alice.next_line().await.unwrap(), &alice_name, "still here"));
}

#[tokio::test]
async fn test_idle_session_is_forced_offline() {
    let server = TestServer::start_with_config(HubConfig {
        liveness_timeout_ms: 500,
        ..test_hub_config()
    })
    .await
    .expect("Failed to start server");

    let (mut alice, alice_name) = server.join().await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    let (mut bob, _) = server.join().await.unwrap();

    assert_eq!(
        bob.next_line().await.unwrap(),
        format!("[{alice_name}] was inactive for more than 500 ms and has been disconnected")
    );

    let seen = alice.closed().await.unwrap();
    assert!(
        seen.iter().all(|line| !line.contains("inactive")),
        "{seen:?}"
    );
}

#[tokio::test]
async fn test_active_session_stays_connected() {
    let server = TestServer::start_with_config(HubConfig {
        liveness_timeout_ms: 400,
        ..test_hub_config()
    })
    .await
    .expect("Failed to start server");

    let (mut alice, alice_name) = server.join().await.unwrap();
    for i in 0..4 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let body = format!("ping {i}");
        alice.say(&body).await.unwrap();
        assert!(is_stamped(&alice.next_line().await.unwrap(), &alice_name, &body));
    }

    assert_eq!(server.sessions().await.unwrap(), 1);
}
