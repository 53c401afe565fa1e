//! Property tests for the waiter.
//!
//! Invariants tested:
//! - N pending polls then the target take N+1 describes and N intervals
//! - Target and failure outcomes are never both reported

use super::paused_runtime;
use cloudops_waiter::{CommonStatus, Refresh, ResourceStatus, WaitConfig};
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

fn any_status() -> impl Strategy<Value = CommonStatus> {
    (0..CommonStatus::ALL.len()).prop_map(|i| CommonStatus::ALL[i])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: the wait ends on the first target observation
    #[test]
    fn pending_polls_then_target(
        pending in 0usize..20,
        interval in 1u64..30,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let waiter = WaitConfig::builder()
                .pending([CommonStatus::Pending])
                .target([CommonStatus::Available])
                .timeout(Duration::from_secs(3600))
                .poll_interval(Duration::from_secs(interval))
                .build();

            let mut polls = 0usize;
            let start = Instant::now();
            let result = waiter
                .wait_for("r-1", || {
                    polls += 1;
                    let status = if polls > pending { "Available" } else { "Pending" };
                    async move { Ok(Refresh::found(polls, status)) }
                })
                .await;

            prop_assert_eq!(result.unwrap(), Some(pending + 1));
            prop_assert_eq!(
                start.elapsed(),
                Duration::from_secs(interval * pending as u64)
            );
            Ok(())
        })?;
    }

    /// Property: one observation yields target, failure, or neither
    #[test]
    fn target_and_failure_are_exclusive(
        observed in any_status(),
        target in any_status(),
        failure in any_status(),
    ) {
        prop_assume!(target != failure);
        let rt = paused_runtime();
        rt.block_on(async {
            let waiter = WaitConfig::builder()
                .target([target])
                .failure([failure])
                .timeout(Duration::ZERO)
                .build();

            let result = waiter
                .wait_for("r-1", || async move {
                    Ok(Refresh::found((), observed.as_str()))
                })
                .await;

            let reached = matches!(result, Ok(Some(())));
            let failed = matches!(result, Err(ref e) if e.is_failed_state());
            prop_assert!(!(reached && failed));
            prop_assert_eq!(reached, observed == target);
            prop_assert_eq!(failed, observed == failure);
            Ok(())
        })?;
    }
}
