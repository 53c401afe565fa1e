//! Waiter metrics regression tests

use super::helpers::*;
use cloudops_waiter::{CommonStatus, Refresh, WaitConfig};
use serial_test::serial;
use std::time::Duration;

#[tokio::test(start_paused = true)]
#[serial]
async fn waiter_metrics_exist() {
    init_recorder();

    let waiter = WaitConfig::builder()
        .name("test_waiter")
        .pending([CommonStatus::Pending])
        .target([CommonStatus::Available])
        .poll_interval(Duration::from_secs(1))
        .build();

    let mut statuses = vec!["Available", "Pending"];
    let _ = waiter
        .wait_for("vpc-1", || {
            let status = statuses.pop().unwrap_or("Available");
            async move { Ok(Refresh::found((), status)) }
        })
        .await;

    assert_counter_exists("waiter_polls_total");
    assert_metric_has_label("waiter_polls_total", "waiter", "test_waiter");

    assert_counter_exists("waiter_waits_total");
    assert_metric_has_label("waiter_waits_total", "waiter", "test_waiter");
    assert_metric_has_label("waiter_waits_total", "result", "target");
}

#[tokio::test(start_paused = true)]
#[serial]
async fn waiter_result_labels() {
    init_recorder();

    let timeout = WaitConfig::builder()
        .name("timeout_waiter")
        .pending([CommonStatus::Pending])
        .target([CommonStatus::Available])
        .timeout(Duration::from_secs(2))
        .poll_interval(Duration::from_secs(1))
        .build();
    let _ = timeout
        .wait_for("vpc-1", || async { Ok(Refresh::found((), "Pending")) })
        .await;
    assert_metric_has_label("waiter_waits_total", "result", "timeout");

    let failed = WaitConfig::builder()
        .name("failed_waiter")
        .target([CommonStatus::Available])
        .failure([CommonStatus::CreateFailed])
        .build();
    let _ = failed
        .wait_for("vpc-1", || async { Ok(Refresh::found((), "CreateFailed")) })
        .await;
    assert_metric_has_label("waiter_waits_total", "result", "failed");

    let absent = WaitConfig::builder()
        .name("delete_waiter")
        .pending([CommonStatus::Deleting])
        .until_absent()
        .build();
    let _ = absent
        .wait_for("vpc-1", || async { Ok(Refresh::<()>::Absent) })
        .await;
    assert_metric_has_label("waiter_waits_total", "result", "absent");
}
