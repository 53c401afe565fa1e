use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Computes the delay before a retry from its index.
///
/// Implementations are stateless; [`BackoffTimer`] carries the attempt
/// counter for one invoker session.
pub trait IntervalFunction: Send + Sync {
    /// Delay before the retry with index `attempt` (0 is the first retry).
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// The same delay every time. Used for fixed poll ticks.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    /// Creates a fixed interval.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// Linear growth: `initial`, `initial + step`, `initial + 2*step`, ...
///
/// Unbounded unless [`IncrementalInterval::max_interval`] is set. No jitter.
#[derive(Debug, Clone)]
pub struct IncrementalInterval {
    initial: Duration,
    step: Duration,
    max_interval: Option<Duration>,
}

impl IncrementalInterval {
    /// Creates an incremental interval starting at `initial`, growing by
    /// `step` per retry.
    pub fn new(initial: Duration, step: Duration) -> Self {
        Self {
            initial,
            step,
            max_interval: None,
        }
    }

    /// Caps the delay at `max_interval`.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }
}

impl IntervalFunction for IncrementalInterval {
    fn next_interval(&self, attempt: usize) -> Duration {
        let growth = self
            .step
            .saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX));
        let interval = self.initial.saturating_add(growth);
        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

/// Exponential growth with an optional cap.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff doubling from `initial_interval`.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    /// Sets the growth factor.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Caps the delay at `max_interval`.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        let interval = if factor.is_finite() {
            Duration::try_from_secs_f64(self.initial_interval.as_secs_f64() * factor)
                .unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        };

        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

/// Interval computed by a closure.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}

/// A stateful delay generator for one invoker session.
///
/// Each [`BackoffTimer::wait`] sleeps the current delay and moves on to the
/// next one. Two timers built from the same parameters produce the same
/// schedule and share nothing.
#[derive(Clone)]
pub struct BackoffTimer {
    interval: Arc<dyn IntervalFunction>,
    attempt: usize,
}

impl BackoffTimer {
    /// Creates a timer following `interval`.
    pub fn new(interval: Arc<dyn IntervalFunction>) -> Self {
        Self {
            interval,
            attempt: 0,
        }
    }

    /// The delay the next call to [`wait`](Self::wait) would sleep.
    pub fn peek(&self) -> Duration {
        self.interval.next_interval(self.attempt)
    }

    /// Returns the current delay and advances to the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.peek();
        self.attempt += 1;
        delay
    }

    /// Sleeps the current delay, then grows it for the next call.
    pub async fn wait(&mut self) {
        let delay = self.next_delay();
        tokio::time::sleep(delay).await;
    }

    /// Number of delays handed out so far.
    pub fn attempts(&self) -> usize {
        self.attempt
    }
}

impl fmt::Debug for BackoffTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackoffTimer")
            .field("attempt", &self.attempt)
            .field("next", &self.peek())
            .finish()
    }
}

/// Incremental wait generator: the Nth wait sleeps `initial + (N-1)*step`.
///
/// ```
/// use cloudops_retry::incremental_wait;
/// use std::time::Duration;
///
/// let mut wait = incremental_wait(Duration::from_secs(3), Duration::from_secs(3));
/// assert_eq!(wait.next_delay(), Duration::from_secs(3));
/// assert_eq!(wait.next_delay(), Duration::from_secs(6));
/// assert_eq!(wait.next_delay(), Duration::from_secs(9));
/// ```
pub fn incremental_wait(initial: Duration, step: Duration) -> BackoffTimer {
    BackoffTimer::new(Arc::new(IncrementalInterval::new(initial, step)))
}
