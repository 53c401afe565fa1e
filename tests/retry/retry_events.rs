//! Event system tests for cloudops-retry.
//!
//! Tests event emission including:
//! - Success event on first try
//! - Retry events with attempt numbers and incremental delays
//! - Timeout event when the budget runs out
//! - NotRetried event for fatal and not-found errors
//! - Multiple listeners and panicking listeners

use cloudops_core::{ApiError, ErrorClass};
use cloudops_retry::RetryConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn success_event_on_first_try() {
    let success_count = Arc::new(AtomicUsize::new(0));
    let retry_count = Arc::new(AtomicUsize::new(0));

    let sc = Arc::clone(&success_count);
    let rc = Arc::clone(&retry_count);

    let config = RetryConfig::builder()
        .on_success(move |attempts| {
            sc.fetch_add(1, Ordering::SeqCst);
            assert_eq!(attempts, 1, "Should succeed on first attempt");
        })
        .on_retry(move |_, _| {
            rc.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    config
        .invoke("r-1", "DescribeVpcs", || async { Ok::<_, ApiError>(()) })
        .await
        .unwrap();

    assert_eq!(success_count.load(Ordering::SeqCst), 1);
    assert_eq!(retry_count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn retry_events_report_attempts_and_delays() {
    let retries = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&retries);
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);

    let config = RetryConfig::builder()
        .on_retry(move |attempt, delay| r.lock().unwrap().push((attempt, delay)))
        .build();

    config
        .invoke("r-1", "DescribeVpcs", || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(ApiError::service("ServiceUnavailable", "later"))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(
        *retries.lock().unwrap(),
        vec![
            (1, Duration::from_secs(3)),
            (2, Duration::from_secs(6)),
            (3, Duration::from_secs(9)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn timeout_event_after_budget() {
    let timeouts = Arc::new(Mutex::new(Vec::new()));
    let t = Arc::clone(&timeouts);

    let config = RetryConfig::builder()
        .timeout(Duration::from_secs(10))
        .on_timeout(move |attempts, elapsed| t.lock().unwrap().push((attempts, elapsed)))
        .build();

    let err = config
        .invoke("r-1", "DescribeVpcs", || async {
            Err::<(), _>(ApiError::service("Throttling", "slow down"))
        })
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    // sleeps 3s and 6s; a 9s sleep at 9s would cross the 10s budget
    assert_eq!(*timeouts.lock().unwrap(), vec![(3, Duration::from_secs(9))]);
}

#[tokio::test(start_paused = true)]
async fn not_retried_event_carries_class() {
    let classes = Arc::new(Mutex::new(Vec::new()));
    let cl = Arc::clone(&classes);

    let config = RetryConfig::builder()
        .on_not_retried(move |class| cl.lock().unwrap().push(class))
        .build();

    let _ = config
        .invoke("r-1", "DeleteVpc", || async {
            Err::<(), _>(ApiError::service("InvalidVpcId.NotFound", "gone"))
        })
        .await;
    let _ = config
        .invoke("r-1", "DeleteVpc", || async {
            Err::<(), _>(ApiError::service("DependencyViolation", "in use"))
        })
        .await;

    assert_eq!(
        *classes.lock().unwrap(),
        vec![ErrorClass::NotFound, ErrorClass::Fatal]
    );
}

#[tokio::test(start_paused = true)]
async fn exhausted_event_with_attempt_cap() {
    let exhausted = Arc::new(AtomicUsize::new(0));
    let e = Arc::clone(&exhausted);

    let config = RetryConfig::builder()
        .max_attempts(3)
        .on_exhausted(move |attempts| {
            e.store(attempts, Ordering::SeqCst);
        })
        .build();

    let _ = config
        .invoke("r-1", "DescribeVpcs", || async {
            Err::<(), _>(ApiError::transport("reset"))
        })
        .await;

    assert_eq!(exhausted.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn multiple_listeners_all_called() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let f = Arc::clone(&first);
    let s = Arc::clone(&second);

    let config = RetryConfig::builder()
        .on_success(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .on_success(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    config
        .invoke("r-1", "DescribeVpcs", || async { Ok::<_, ApiError>(()) })
        .await
        .unwrap();

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn panicking_listener_does_not_break_the_call() {
    let after = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&after);

    let config = RetryConfig::builder()
        .on_success(|_| panic!("listener bug"))
        .on_success(move |_| {
            a.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let result = config
        .invoke("r-1", "DescribeVpcs", || async { Ok::<_, ApiError>(7) })
        .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(after.load(Ordering::SeqCst), 1);
}
