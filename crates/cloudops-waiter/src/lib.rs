//! Poll-until-state waiter for asynchronous cloud operations.
//!
//! Many create, update and delete calls return before the resource has
//! settled. The waiter calls a describe closure on a schedule until the
//! reported status enters the target set, a failure status shows up, the
//! resource disappears, or the time budget runs out.
//!
//! Statuses are parsed into a caller-defined closed type implementing
//! [`ResourceStatus`]; a status the type does not know fails the wait
//! instead of being polled forever.
//!
//! # Examples
//!
//! ```
//! use cloudops_core::OperationError;
//! use cloudops_waiter::{CommonStatus, Refresh, WaitConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), OperationError> {
//! let waiter = WaitConfig::builder()
//!     .name("vpc-create")
//!     .resource("VPC")
//!     .pending([CommonStatus::Pending, CommonStatus::Creating])
//!     .target([CommonStatus::Available])
//!     .failure([CommonStatus::CreateFailed])
//!     .timeout(Duration::from_secs(600))
//!     .build();
//!
//! let vpc = waiter
//!     .wait_for("vpc-123", || async {
//!         Ok(Refresh::found("vpc-123".to_string(), "Available"))
//!     })
//!     .await?;
//! assert_eq!(vpc.as_deref(), Some("vpc-123"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Waiting for deletion
//!
//! ```
//! use cloudops_core::OperationError;
//! use cloudops_waiter::{CommonStatus, Refresh, WaitConfig};
//!
//! # async fn example() -> Result<(), OperationError> {
//! let waiter = WaitConfig::builder()
//!     .pending([CommonStatus::Deleting])
//!     .until_absent()
//!     .build();
//!
//! let gone: Option<()> = waiter
//!     .wait_for("vpc-123", || async { Ok(Refresh::Absent) })
//!     .await?;
//! assert!(gone.is_none());
//! # Ok(())
//! # }
//! ```

mod config;
mod events;
mod refresh;
mod status;

pub use config::{PollSchedule, WaitConfig, WaitConfigBuilder, DEFAULT_POLL_INTERVAL};
pub use events::WaitEvent;
pub use refresh::Refresh;
pub use status::{CommonStatus, ResourceStatus, WaitState};

use cloudops_core::{ErrorClass, OperationError};
use std::future::Future;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::counter;

/// Outcome of one poll.
enum Step<T> {
    Pending,
    Done(Option<T>),
}

impl<S: ResourceStatus> WaitConfig<S> {
    /// Polls `describe` until the resource reaches a target status.
    ///
    /// Returns the object from the poll that observed the target, or
    /// `None` when the wait was built with
    /// [`until_absent`](WaitConfigBuilder::until_absent) and the resource
    /// disappeared.
    ///
    /// A describe error that is not-found counts as absence; one the
    /// classifier deems retryable counts as a pending poll; any other
    /// error ends the wait.
    pub async fn wait_for<T, F, Fut>(
        &self,
        id: &str,
        mut describe: F,
    ) -> Result<Option<T>, OperationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Refresh<T>, OperationError>>,
    {
        let start = tokio::time::Instant::now();
        let mut timer = self.schedule.timer();
        let mut polls = 0usize;
        let mut absent_polls = 0usize;
        let mut last_status: Option<String> = None;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        loop {
            polls += 1;

            #[cfg(feature = "metrics")]
            counter!("waiter_polls_total", "waiter" => self.name.clone()).increment(1);

            let observed = match describe().await {
                Ok(refresh) => Some(refresh),
                Err(err) => match self.classify(&err) {
                    ErrorClass::NotFound => Some(Refresh::Absent),
                    ErrorClass::Retryable => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(waiter = %self.name, id, poll = polls, error = %err, "transient describe failure");
                        None
                    }
                    ErrorClass::Fatal => {
                        self.finish(id, WaitState::Failed, "error", polls, start.elapsed());
                        return Err(err);
                    }
                },
            };

            let transient = observed.is_none();
            let step = match observed {
                None => Step::Pending,
                Some(Refresh::Absent) => {
                    self.note_status(id, &mut last_status, None);
                    if self.until_absent {
                        self.finish(id, WaitState::NotFound, "absent", polls, start.elapsed());
                        return Ok(None);
                    }
                    absent_polls += 1;
                    if absent_polls > self.not_found_checks {
                        self.finish(id, WaitState::NotFound, "not_found", polls, start.elapsed());
                        return Err(OperationError::not_found(self.resource.clone(), id));
                    }
                    Step::Pending
                }
                Some(Refresh::Found { object, status }) => {
                    absent_polls = 0;
                    self.note_status(id, &mut last_status, Some(&status));
                    match self.assess(id, &status) {
                        Ok(WaitState::Target) => Step::Done(Some(object)),
                        Ok(_) => Step::Pending,
                        Err((state, err)) => {
                            self.finish(id, state, state.as_str(), polls, start.elapsed());
                            return Err(err);
                        }
                    }
                }
            };

            if let Step::Done(object) = step {
                if let Some(settle) = self.settle_delay {
                    tokio::time::sleep(settle).await;
                }
                self.finish(id, WaitState::Target, "target", polls, start.elapsed());
                return Ok(object);
            }

            self.event_listeners.emit(&WaitEvent::Poll {
                pattern_name: self.name.clone(),
                timestamp: Instant::now(),
                id: id.to_string(),
                poll: polls,
                status: if transient { None } else { last_status.clone() },
            });

            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                self.finish(id, WaitState::TimedOut, "timeout", polls, elapsed);
                return Err(OperationError::WaitTimeout {
                    id: id.to_string(),
                    target: self.target_names(),
                    last_status,
                    timeout: self.timeout,
                });
            }

            tokio::time::sleep(timer.next_delay()).await;
        }
    }

    fn classify(&self, err: &OperationError) -> ErrorClass {
        if err.is_not_found() {
            return ErrorClass::NotFound;
        }
        match err {
            OperationError::Api { cause, .. } => self.classifier.classify(cause),
            _ => ErrorClass::Fatal,
        }
    }

    /// Places a raw status into the configured sets.
    fn assess(&self, id: &str, raw: &str) -> Result<WaitState, (WaitState, OperationError)> {
        let Some(status) = S::parse(raw) else {
            return Err((
                WaitState::Failed,
                OperationError::UnknownState {
                    id: id.to_string(),
                    status: raw.to_string(),
                },
            ));
        };

        if self.failure.contains(&status) {
            return Err((
                WaitState::Failed,
                OperationError::FailedState {
                    id: id.to_string(),
                    status: raw.to_string(),
                    target: self.target_names(),
                },
            ));
        }

        if self.target.contains(&status) {
            return Ok(WaitState::Target);
        }

        if !self.pending.is_empty() && !self.pending.contains(&status) {
            return Err((
                WaitState::Failed,
                OperationError::UnexpectedState {
                    id: id.to_string(),
                    status: raw.to_string(),
                    target: self.target_names(),
                },
            ));
        }

        Ok(WaitState::Pending)
    }

    fn note_status(&self, id: &str, last: &mut Option<String>, current: Option<&str>) {
        if last.as_deref() == current {
            return;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(waiter = %self.name, id, from = ?last, to = ?current, "status changed");

        let to = current.map(str::to_string);
        self.event_listeners.emit(&WaitEvent::StatusChanged {
            pattern_name: self.name.clone(),
            timestamp: Instant::now(),
            id: id.to_string(),
            from: last.take(),
            to: to.clone(),
        });
        *last = to;
    }

    fn finish(&self, id: &str, state: WaitState, result: &'static str, polls: usize, elapsed: Duration) {
        #[cfg(feature = "tracing")]
        tracing::debug!(waiter = %self.name, id, state = %state, polls, elapsed_ms = elapsed.as_millis() as u64, "wait finished");

        #[cfg(feature = "metrics")]
        counter!("waiter_waits_total", "waiter" => self.name.clone(), "result" => result)
            .increment(1);
        #[cfg(not(feature = "metrics"))]
        let _ = result;

        self.event_listeners.emit(&WaitEvent::Finished {
            pattern_name: self.name.clone(),
            timestamp: Instant::now(),
            id: id.to_string(),
            state,
            polls,
            elapsed,
        });
    }
}
