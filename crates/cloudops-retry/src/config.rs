use crate::backoff::{ExponentialBackoff, FixedInterval, IncrementalInterval, IntervalFunction};
use crate::events::RetryEvent;
use crate::policy::{ResponseCheck, RetryPolicy};
use cloudops_core::events::{EventListeners, FnListener};
use cloudops_core::{ErrorClass, ErrorClassifier, ErrorSource, TransientCode};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_histogram};
#[cfg(feature = "metrics")]
use std::sync::Once;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Default time budget of one invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default first delay and per-retry growth of the incremental backoff.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(3);

/// Configuration for the retrying invoker.
#[derive(Clone)]
pub struct RetryConfig {
    pub(crate) policy: RetryPolicy,
    pub(crate) response_check: ResponseCheck,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
    pub(crate) name: String,
}

impl RetryConfig {
    /// Creates a new builder.
    pub fn builder() -> RetryConfigBuilder {
        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "retry_calls_total",
                    "Total number of invocations by outcome (success, timeout, exhausted, not_found, fatal)"
                );
                describe_counter!(
                    "retry_attempts_total",
                    "Total number of retries performed after a retryable failure"
                );
                describe_histogram!(
                    "retry_attempts",
                    "Number of attempts made per invocation"
                );
            });
        }
        RetryConfigBuilder::new()
    }

    /// The policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The name used in events and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wraps this configuration in a [`crate::RetryLayer`].
    pub fn layer(self) -> crate::RetryLayer {
        crate::RetryLayer::new(self)
    }
}

impl std::fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("response_check", &self.response_check)
            .field("listeners", &self.event_listeners.len())
            .finish()
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder {
    timeout: Duration,
    max_attempts: Option<usize>,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    classifier: ErrorClassifier,
    source: ErrorSource,
    response_check: ResponseCheck,
    event_listeners: EventListeners<RetryEvent>,
    name: String,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - timeout: 5 minutes
    /// - backoff: incremental, 3s first delay growing by 3s
    /// - max_attempts: unbounded (time-bounded only)
    /// - classifier: generic rules, empty allow-list
    /// - source: [`ErrorSource::Sdk`]
    /// - response check: none
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: None,
            interval_fn: None,
            classifier: ErrorClassifier::new(),
            source: ErrorSource::Sdk,
            response_check: ResponseCheck::None,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the total time budget, attempts and sleeps included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caps the number of attempts, including the first.
    ///
    /// Without a cap the invoker is bounded by time alone.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Sets an incremental backoff: `initial`, `initial + step`, ...
    pub fn incremental_backoff(mut self, initial: Duration, step: Duration) -> Self {
        self.interval_fn = Some(Arc::new(IncrementalInterval::new(initial, step)));
        self
    }

    /// Sets a fixed backoff interval.
    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    /// Sets exponential backoff doubling from `initial_interval`.
    pub fn exponential_backoff(mut self, initial_interval: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial_interval)));
        self
    }

    /// Sets a custom interval function for backoff.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Replaces the error classifier.
    pub fn classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Adds `code` to the classifier's transient allow-list.
    pub fn retry_on(mut self, code: TransientCode) -> Self {
        self.classifier = self.classifier.retry_on(code);
        self
    }

    /// Adds several codes to the classifier's transient allow-list.
    pub fn retry_on_all<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = TransientCode>,
    {
        self.classifier = self.classifier.retry_on_all(codes);
        self
    }

    /// Adds an endpoint-specific code to the transient allow-list.
    pub fn retry_on_code(mut self, code: impl Into<String>) -> Self {
        self.classifier = self.classifier.retry_on_code(code);
        self
    }

    /// Sets the source tag put on errors.
    pub fn source(mut self, source: ErrorSource) -> Self {
        self.source = source;
        self
    }

    /// Sets how successful response bodies are inspected.
    pub fn response_check(mut self, check: ResponseCheck) -> Self {
        self.response_check = check;
        self
    }

    /// Rejects response bodies carrying `"Success": false`.
    pub fn check_success_flag(self) -> Self {
        self.response_check(ResponseCheck::SuccessFlag)
    }

    /// Sets the name for this invoker (used in events and metrics).
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback when a retry is about to be made.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - the number of attempts made so far and the
    /// delay before the next one.
    ///
    /// # Example
    /// ```rust
    /// use cloudops_retry::RetryConfig;
    /// use std::time::Duration;
    ///
    /// let config = RetryConfig::builder()
    ///     .name("eip")
    ///     .on_retry(|attempt, delay| {
    ///         println!("attempt {} failed, retrying in {:?}", attempt, delay);
    ///     })
    ///     .build();
    /// ```
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback when a call succeeds.
    ///
    /// # Callback Signature
    /// `Fn(usize)` - total attempts, 1 meaning success on the first try.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when the time budget runs out.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)` - attempts made and time spent.
    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::TimedOut {
                attempts, elapsed, ..
            } = event
            {
                f(*attempts, *elapsed);
            }
        }));
        self
    }

    /// Registers a callback when the attempt cap is reached.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback when a failure is returned without retrying.
    ///
    /// # Callback Signature
    /// `Fn(ErrorClass)` - [`ErrorClass::NotFound`] or [`ErrorClass::Fatal`].
    pub fn on_not_retried<F>(mut self, f: F) -> Self
    where
        F: Fn(ErrorClass) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::NotRetried { class, .. } = event {
                f(*class);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RetryConfig {
        let interval_fn = self.interval_fn.unwrap_or_else(|| {
            Arc::new(IncrementalInterval::new(
                DEFAULT_BACKOFF_STEP,
                DEFAULT_BACKOFF_STEP,
            ))
        });

        let mut policy = RetryPolicy::new(self.timeout, interval_fn);
        policy.max_attempts = self.max_attempts;
        policy.classifier = self.classifier;
        policy.source = self.source;

        RetryConfig {
            policy,
            response_check: self.response_check,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds the configuration wrapped in a [`crate::RetryLayer`].
    pub fn build_layer(self) -> crate::RetryLayer {
        crate::RetryLayer::new(self.build())
    }
}
