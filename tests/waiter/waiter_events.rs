//! Event system tests for cloudops-waiter.

use cloudops_core::{ApiError, ErrorClass, ErrorSource, OperationError};
use cloudops_waiter::{CommonStatus, Refresh, WaitConfig, WaitState};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn poll_status_and_finish_events() {
    let polls = Arc::new(Mutex::new(Vec::new()));
    let changes = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(Mutex::new(Vec::new()));

    let p = Arc::clone(&polls);
    let c = Arc::clone(&changes);
    let f = Arc::clone(&finished);

    let waiter = WaitConfig::builder()
        .name("nat-gateway")
        .pending([CommonStatus::Pending, CommonStatus::Creating])
        .target([CommonStatus::Available])
        .poll_interval(Duration::from_secs(5))
        .on_poll(move |poll, status| p.lock().unwrap().push((poll, status.map(str::to_string))))
        .on_status_change(move |from, to| {
            c.lock()
                .unwrap()
                .push((from.map(str::to_string), to.map(str::to_string)))
        })
        .on_finished(move |state, polls, elapsed| f.lock().unwrap().push((state, polls, elapsed)))
        .build();

    let mut script = vec!["Available", "Creating", "Pending", "Pending"];
    waiter
        .wait_for("ngw-1", || {
            let status = script.pop().unwrap_or("Available");
            async move { Ok(Refresh::found((), status)) }
        })
        .await
        .unwrap();

    assert_eq!(
        *polls.lock().unwrap(),
        vec![
            (1, Some("Pending".to_string())),
            (2, Some("Pending".to_string())),
            (3, Some("Creating".to_string())),
        ]
    );
    assert_eq!(
        *changes.lock().unwrap(),
        vec![
            (None, Some("Pending".to_string())),
            (Some("Pending".to_string()), Some("Creating".to_string())),
            (Some("Creating".to_string()), Some("Available".to_string())),
        ]
    );
    assert_eq!(
        *finished.lock().unwrap(),
        vec![(WaitState::Target, 4, Duration::from_secs(15))]
    );
}

#[tokio::test(start_paused = true)]
async fn finished_event_on_timeout() {
    let finished = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::clone(&finished);

    let waiter = WaitConfig::builder()
        .pending([CommonStatus::Modifying])
        .target([CommonStatus::Normal])
        .timeout(Duration::from_secs(4))
        .poll_interval(Duration::from_secs(2))
        .on_finished(move |state, polls, _| f.lock().unwrap().push((state, polls)))
        .build();

    let err = waiter
        .wait_for("db-1", || async { Ok(Refresh::found((), "Modifying")) })
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(*finished.lock().unwrap(), vec![(WaitState::TimedOut, 3)]);
}

#[tokio::test(start_paused = true)]
async fn transient_describe_failure_polls_without_status() {
    let polls = Arc::new(Mutex::new(Vec::new()));
    let p = Arc::clone(&polls);

    let waiter = WaitConfig::builder()
        .pending([CommonStatus::Pending])
        .target([CommonStatus::Available])
        .poll_interval(Duration::from_secs(2))
        .on_poll(move |poll, status| p.lock().unwrap().push((poll, status.map(str::to_string))))
        .build();

    let mut call = 0;
    let result = waiter
        .wait_for("vpc-1", || {
            call += 1;
            let n = call;
            async move {
                match n {
                    1 => Ok(Refresh::found((), "Pending")),
                    2 => Err(OperationError::api(
                        "vpc-1",
                        "DescribeVpcAttribute",
                        ErrorSource::Sdk,
                        ErrorClass::Retryable,
                        ApiError::service("Throttling", "slow down"),
                    )),
                    _ => Ok(Refresh::found((), "Available")),
                }
            }
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(
        *polls.lock().unwrap(),
        vec![(1, Some("Pending".to_string())), (2, None)]
    );
}
