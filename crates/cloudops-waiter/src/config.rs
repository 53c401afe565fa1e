use crate::events::WaitEvent;
use crate::status::{ResourceStatus, WaitState};
use cloudops_core::events::{EventListeners, FnListener};
use cloudops_core::timeouts::DEFAULT_TIMEOUT;
use cloudops_core::ErrorClassifier;
use cloudops_retry::{BackoffTimer, ExponentialBackoff, FixedInterval};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::describe_counter;
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How long to sleep between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSchedule {
    /// The same interval after every pending poll.
    Fixed(Duration),
    /// Doubling from `min` up to `max`; never faster than `min`.
    Exponential {
        /// First and smallest interval.
        min: Duration,
        /// Largest interval.
        max: Duration,
    },
}

impl Default for PollSchedule {
    fn default() -> Self {
        PollSchedule::Fixed(DEFAULT_POLL_INTERVAL)
    }
}

impl PollSchedule {
    pub(crate) fn timer(&self) -> BackoffTimer {
        match *self {
            PollSchedule::Fixed(interval) => BackoffTimer::new(Arc::new(FixedInterval::new(interval))),
            PollSchedule::Exponential { min, max } => BackoffTimer::new(Arc::new(
                ExponentialBackoff::new(min).max_interval(max.max(min)),
            )),
        }
    }
}

/// Configuration for a poll-until-state wait.
///
/// `S` is the caller's closed status type.
#[derive(Clone)]
pub struct WaitConfig<S> {
    pub(crate) name: String,
    pub(crate) resource: String,
    pub(crate) pending: Vec<S>,
    pub(crate) target: Vec<S>,
    pub(crate) failure: Vec<S>,
    pub(crate) timeout: Duration,
    pub(crate) delay: Duration,
    pub(crate) schedule: PollSchedule,
    pub(crate) settle_delay: Option<Duration>,
    pub(crate) not_found_checks: usize,
    pub(crate) until_absent: bool,
    pub(crate) classifier: ErrorClassifier,
    pub(crate) event_listeners: EventListeners<WaitEvent>,
}

impl<S: ResourceStatus> WaitConfig<S> {
    /// Creates a new builder.
    pub fn builder() -> WaitConfigBuilder<S> {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "waiter_polls_total",
                    "Total number of describe calls made while waiting"
                );
                describe_counter!(
                    "waiter_waits_total",
                    "Total number of finished waits by outcome (target, absent, failed, not_found, timeout, error)"
                );
            });
        }
        WaitConfigBuilder::new()
    }

    /// Returns a copy with a different time budget, typically the
    /// operation's entry from [`Timeouts`](cloudops_core::Timeouts).
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let mut config = self.clone();
        config.timeout = timeout;
        config
    }

    /// The name used in events and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The awaited statuses.
    pub fn target(&self) -> &[S] {
        &self.target
    }

    pub(crate) fn target_names(&self) -> Vec<String> {
        if self.until_absent && self.target.is_empty() {
            return vec!["<absent>".to_string()];
        }
        self.target.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl<S> std::fmt::Debug for WaitConfig<S>
where
    S: ResourceStatus,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitConfig")
            .field("name", &self.name)
            .field("pending", &self.pending)
            .field("target", &self.target)
            .field("failure", &self.failure)
            .field("timeout", &self.timeout)
            .field("schedule", &self.schedule)
            .field("until_absent", &self.until_absent)
            .finish_non_exhaustive()
    }
}

/// Builder for [`WaitConfig`].
pub struct WaitConfigBuilder<S> {
    name: String,
    resource: String,
    pending: Vec<S>,
    target: Vec<S>,
    failure: Vec<S>,
    timeout: Duration,
    delay: Duration,
    schedule: PollSchedule,
    settle_delay: Option<Duration>,
    not_found_checks: usize,
    until_absent: bool,
    classifier: ErrorClassifier,
    event_listeners: EventListeners<WaitEvent>,
}

impl<S: ResourceStatus> Default for WaitConfigBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResourceStatus> WaitConfigBuilder<S> {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - timeout: 10 minutes
    /// - schedule: fixed 5s
    /// - no initial delay, no settle delay
    /// - not_found_checks: 0 (absence is terminal on first sight)
    /// - empty pending, target and failure sets
    /// - name: `"<unnamed>"`, resource: `"resource"`
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            resource: "resource".to_string(),
            pending: Vec::new(),
            target: Vec::new(),
            failure: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            delay: Duration::ZERO,
            schedule: PollSchedule::default(),
            settle_delay: None,
            not_found_checks: 0,
            until_absent: false,
            classifier: ErrorClassifier::new(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name for this waiter (used in events and metrics).
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the resource kind named in not-found errors, e.g. `"VPC"`.
    pub fn resource<R: Into<String>>(mut self, resource: R) -> Self {
        self.resource = resource.into();
        self
    }

    /// Statuses that end the wait successfully.
    pub fn target<I: IntoIterator<Item = S>>(mut self, statuses: I) -> Self {
        self.target = statuses.into_iter().collect();
        self
    }

    /// Statuses that end the wait with
    /// [`OperationError::FailedState`](cloudops_core::OperationError::FailedState).
    pub fn failure<I: IntoIterator<Item = S>>(mut self, statuses: I) -> Self {
        self.failure = statuses.into_iter().collect();
        self
    }

    /// Statuses that keep the wait going.
    ///
    /// When non-empty, any known status outside pending, target and
    /// failure ends the wait with
    /// [`OperationError::UnexpectedState`](cloudops_core::OperationError::UnexpectedState).
    pub fn pending<I: IntoIterator<Item = S>>(mut self, statuses: I) -> Self {
        self.pending = statuses.into_iter().collect();
        self
    }

    /// Sets the total time budget.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sleeps `delay` before the first poll.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Polls at a fixed interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.schedule = PollSchedule::Fixed(interval);
        self
    }

    /// Polls with exponentially growing intervals between `min` and `max`.
    pub fn exponential_poll(mut self, min: Duration, max: Duration) -> Self {
        self.schedule = PollSchedule::Exponential { min, max };
        self
    }

    /// Sets the poll schedule.
    pub fn schedule(mut self, schedule: PollSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Sleeps `delay` once more after a target status is observed.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = Some(delay);
        self
    }

    /// Tolerates `checks` consecutive absent polls before reporting the
    /// resource as not found.
    pub fn not_found_checks(mut self, checks: usize) -> Self {
        self.not_found_checks = checks;
        self
    }

    /// Waits for the resource to disappear; absence ends the wait
    /// successfully with `Ok(None)`.
    pub fn until_absent(mut self) -> Self {
        self.until_absent = true;
        self
    }

    /// Replaces the classifier used on describe errors.
    pub fn classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Registers a callback after each pending poll.
    ///
    /// # Callback Signature
    /// `Fn(usize, Option<&str>)` - the poll number (1-based) and the raw
    /// status observed, `None` when the resource was absent or the describe
    /// call failed transiently.
    pub fn on_poll<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Option<&str>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let WaitEvent::Poll { poll, status, .. } = event {
                f(*poll, status.as_deref());
            }
        }));
        self
    }

    /// Registers a callback when the observed status changes.
    pub fn on_status_change<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let WaitEvent::StatusChanged { from, to, .. } = event {
                f(from.as_deref(), to.as_deref());
            }
        }));
        self
    }

    /// Registers a callback when the wait ends, successfully or not.
    ///
    /// # Callback Signature
    /// `Fn(WaitState, usize, Duration)` - final state, number of polls and
    /// time spent.
    pub fn on_finished<F>(mut self, f: F) -> Self
    where
        F: Fn(WaitState, usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let WaitEvent::Finished {
                state,
                polls,
                elapsed,
                ..
            } = event
            {
                f(*state, *polls, *elapsed);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> WaitConfig<S> {
        WaitConfig {
            name: self.name,
            resource: self.resource,
            pending: self.pending,
            target: self.target,
            failure: self.failure,
            timeout: self.timeout,
            delay: self.delay,
            schedule: self.schedule,
            settle_delay: self.settle_delay,
            not_found_checks: self.not_found_checks,
            until_absent: self.until_absent,
            classifier: self.classifier,
            event_listeners: self.event_listeners,
        }
    }
}
