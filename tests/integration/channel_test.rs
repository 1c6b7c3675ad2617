//! Integration tests for the live notification channel.

mod helpers;

use std::time::Duration;

use quartermaster_core::AppError;
use quartermaster_realtime::{ConnectionState, DisconnectReason, Frame};

use helpers::{Script, TestChannel, leader, push, wait_for_state};

fn exhausted(state: &ConnectionState) -> bool {
    matches!(
        state,
        ConnectionState::Disconnected {
            reason: DisconnectReason::Exhausted
        }
    )
}

fn held(frames: Vec<Frame>) -> Script {
    Script::Open { frames, hold: true }
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_push_is_stored_and_alerted_once() {
    let test = TestChannel::new(vec![held(vec![
        push("7", "Request approved"),
        push("7", "Request approved"),
        push("8", "Radio issued"),
    ])]);
    let mut events = test.channel.subscribe();

    test.channel.start(&leader()).unwrap();

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();
    assert_eq!(first.id.as_str(), "7");
    assert_eq!(second.id.as_str(), "8");

    assert_eq!(test.store.len(), 2);
    assert_eq!(test.store.unread_count(), 2);
    assert_eq!(
        *test.alerts.messages.lock().unwrap(),
        vec!["Request approved".to_string(), "Radio issued".to_string()]
    );
    assert!(test.channel.state().is_connected());

    test.channel.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_five_attempts() {
    let test = TestChannel::new(Vec::new());
    let mut states = test.channel.subscribe_state();

    test.channel.start(&leader()).unwrap();
    wait_for_state(&mut states, exhausted).await;
    assert_eq!(test.connector.attempts(), 5);

    // No further attempt without an explicit restart
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(test.connector.attempts(), 5);
    assert!(exhausted(&test.channel.state()));
    assert!(test.store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delays_double() {
    let test = TestChannel::new(Vec::new());
    let mut states = test.channel.subscribe_state();

    test.channel.start(&leader()).unwrap();
    wait_for_state(&mut states, exhausted).await;

    let times = test.connector.attempt_times();
    let gaps: Vec<Duration> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let expected = [2, 4, 8, 16].map(Duration::from_secs);
    assert_eq!(gaps.len(), expected.len());
    for (gap, expected) in gaps.iter().zip(expected) {
        assert!(
            *gap >= expected && *gap < expected + Duration::from_millis(50),
            "expected a gap of {expected:?}, got {gap:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_successful_open_resets_failure_count() {
    let test = TestChannel::new(vec![
        Script::Fail(AppError::network("refused")),
        Script::Fail(AppError::network("refused")),
        Script::Open {
            frames: vec![push("1", "hello")],
            hold: false,
        },
    ]);
    let mut states = test.channel.subscribe_state();

    test.channel.start(&leader()).unwrap();
    wait_for_state(&mut states, exhausted).await;

    // Two failures, one session that dropped, then a fresh budget of five
    assert_eq!(test.connector.attempts(), 7);
    let times = test.connector.attempt_times();
    let after_drop = times[3] - times[2];
    assert!(after_drop >= Duration::from_secs(2) && after_drop < Duration::from_secs(3));
    assert_eq!(test.store.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_session_is_not_retried() {
    let test = TestChannel::new(vec![Script::Fail(AppError::auth_required(
        "handshake rejected with 401",
    ))]);
    let mut states = test.channel.subscribe_state();

    test.channel.start(&leader()).unwrap();
    let state = wait_for_state(&mut states, |s| {
        matches!(s, ConnectionState::Disconnected { .. })
    })
    .await;

    assert_eq!(
        state,
        ConnectionState::Disconnected {
            reason: DisconnectReason::AuthRejected
        }
    );
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(test.connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_reconnect() {
    let test = TestChannel::new(vec![Script::Fail(AppError::network("refused"))]);
    let mut states = test.channel.subscribe_state();

    test.channel.start(&leader()).unwrap();
    let state = wait_for_state(&mut states, |s| {
        matches!(s, ConnectionState::Backoff { .. })
    })
    .await;
    assert_eq!(
        state,
        ConnectionState::Backoff {
            failures: 1,
            delay: Duration::from_secs(2)
        }
    );

    test.channel.stop().await;
    assert_eq!(
        test.channel.state(),
        ConnectionState::Disconnected {
            reason: DisconnectReason::Stopped
        }
    );

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(test.connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_payload_keeps_connection() {
    let test = TestChannel::new(vec![held(vec![
        Frame::Text("not json".to_string()),
        Frame::Text(r#"{"message": "no id"}"#.to_string()),
        push("3", "Repair completed"),
    ])]);
    let mut events = test.channel.subscribe();

    test.channel.start(&leader()).unwrap();
    let event = events.recv().await.unwrap();

    assert_eq!(event.id.as_str(), "3");
    assert_eq!(test.store.len(), 1);
    assert!(test.channel.state().is_connected());
    assert_eq!(test.connector.attempts(), 1);

    test.channel.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_while_running_is_noop() {
    let test = TestChannel::new(vec![held(vec![push("1", "hello")])]);
    let mut events = test.channel.subscribe();

    test.channel.start(&leader()).unwrap();
    events.recv().await.unwrap();
    test.channel.start(&leader()).unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(test.connector.attempts(), 1);
    assert!(test.channel.state().is_connected());

    test.channel.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_giving_up() {
    let mut script: Vec<Script> = (0..5)
        .map(|_| Script::Fail(AppError::network("refused")))
        .collect();
    script.push(held(vec![push("9", "back online")]));
    let test = TestChannel::new(script);
    let mut states = test.channel.subscribe_state();
    let mut events = test.channel.subscribe();

    test.channel.start(&leader()).unwrap();
    wait_for_state(&mut states, exhausted).await;

    test.channel.start(&leader()).unwrap();
    let event = events.recv().await.unwrap();
    assert_eq!(event.id.as_str(), "9");
    assert_eq!(test.connector.attempts(), 6);
    assert!(test.channel.state().is_connected());

    test.channel.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_immediately_after_giving_up_reconnects() {
    for _ in 0..200 {
        let test = TestChannel::with_max_attempts(Vec::new(), 1);
        let mut states = test.channel.subscribe_state();

        test.channel.start(&leader()).unwrap();
        wait_for_state(&mut states, exhausted).await;
        assert_eq!(test.connector.attempts(), 1);

        // The driver may still be winding down here
        test.channel.start(&leader()).unwrap();
        wait_for_state(&mut states, exhausted).await;
        assert_eq!(test.connector.attempts(), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_token_sent_as_query_parameter() {
    let test = TestChannel::new(vec![held(Vec::new())]);
    let mut states = test.channel.subscribe_state();

    test.channel.start(&leader()).unwrap();
    wait_for_state(&mut states, ConnectionState::is_connected).await;

    let url = test.connector.last_url().unwrap();
    assert!(url.starts_with("ws://localhost:8000/ws/notifications/"));
    assert!(url.ends_with("?token=test-token"));

    test.channel.stop().await;
}
