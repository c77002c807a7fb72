// ABOUTME: Integration tests for bounded readiness polling on a paused clock.
// ABOUTME: Verifies attempt counts, inter-attempt sleeps, and hard-error short circuits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use sitesmith::config::PollSettings;
use sitesmith::poll::{PollError, Readiness, ReadinessPoller};
use tokio::time::Instant;

#[derive(Debug, PartialEq)]
struct ProbeFailure(&'static str);

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[tokio::test(start_paused = true)]
async fn never_ready_makes_exactly_max_attempts() {
    let calls = AtomicU32::new(0);
    let poller = ReadinessPoller::new(Duration::from_secs(2), 5);
    let started = Instant::now();

    let result = poller
        .poll("branch", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Readiness<(), &str>, ProbeFailure>(Readiness::NotReady("missing")) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    // Four sleeps between five attempts, none after the last.
    assert_eq!(started.elapsed(), Duration::from_secs(8));
    match result {
        Err(PollError::TimeoutExceeded {
            operation,
            attempts,
            last_state,
        }) => {
            assert_eq!(operation, "branch");
            assert_eq!(attempts, 5);
            assert_eq!(last_state, "missing");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn ready_on_third_attempt_stops_polling() {
    let calls = AtomicU32::new(0);
    let poller = ReadinessPoller::from(PollSettings::new(Duration::from_secs(5), 10));
    let started = Instant::now();

    let value = poller
        .poll("database", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 3 {
                    Ok::<_, ProbeFailure>(Readiness::Ready("ACTIVE_HEALTHY"))
                } else {
                    Ok(Readiness::NotReady("COMING_UP"))
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(value, "ACTIVE_HEALTHY");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn hard_error_stops_without_retrying() {
    let calls = AtomicU32::new(0);
    let poller = ReadinessPoller::new(Duration::from_secs(2), 10);

    let result = poller
        .poll("repository", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Ok::<Readiness<(), String>, _>(Readiness::NotReady("no commits".to_string()))
                } else {
                    Err(ProbeFailure("401 bad credentials"))
                }
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    match result {
        Err(PollError::Failed { attempt, source, .. }) => {
            assert_eq!(attempt, 2);
            assert_eq!(source, ProbeFailure("401 bad credentials"));
        }
        other => panic!("expected hard failure, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn zero_budget_probes_once_without_sleeping() {
    let calls = AtomicU32::new(0);
    let poller = ReadinessPoller::new(Duration::from_secs(30), 0);
    let started = Instant::now();

    let result = poller
        .poll("deployment", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<Readiness<(), &str>, ProbeFailure>(Readiness::NotReady("QUEUED")) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(matches!(result, Err(PollError::TimeoutExceeded { attempts: 1, .. })));
}

#[tokio::test(start_paused = true)]
async fn pending_callback_sees_every_not_ready_attempt() {
    let poller = ReadinessPoller::new(Duration::from_secs(1), 4);
    let mut seen = Vec::new();

    let result = poller
        .poll_with(
            "deployment",
            |attempt| async move {
                if attempt == 4 {
                    Ok::<_, ProbeFailure>(Readiness::Ready(()))
                } else {
                    Ok(Readiness::NotReady(format!("state-{attempt}")))
                }
            },
            |attempt, state: &String| seen.push((attempt, state.clone())),
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(
        seen,
        vec![
            (1, "state-1".to_string()),
            (2, "state-2".to_string()),
            (3, "state-3".to_string()),
        ]
    );
}
