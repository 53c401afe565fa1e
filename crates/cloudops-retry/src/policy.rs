use crate::backoff::{BackoffTimer, IntervalFunction};
use cloudops_core::response::success_flag;
use cloudops_core::{ApiError, ErrorClass, ErrorClassifier, ErrorSource, Payload};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Custom check applied to a successful response body.
pub type ResponseCheckFn = Arc<dyn Fn(&Payload) -> Result<(), String> + Send + Sync>;

/// Whether a successful response body is inspected for embedded failure.
///
/// Some APIs answer HTTP 200 with `"Success": false` in the body. Bodies are
/// not inspected unless the call site opts in.
#[derive(Clone, Default)]
pub enum ResponseCheck {
    /// Accept every successful response.
    #[default]
    None,
    /// Reject bodies whose `Success` field is `false`.
    SuccessFlag,
    /// Reject bodies for which the closure returns an error.
    Custom(ResponseCheckFn),
}

impl ResponseCheck {
    /// Wraps a closure as a custom check.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Payload) -> Result<(), String> + Send + Sync + 'static,
    {
        ResponseCheck::Custom(Arc::new(f))
    }

    /// Applies the check, returning the failure detail on rejection.
    pub fn verify(&self, body: &Payload) -> Result<(), String> {
        match self {
            ResponseCheck::None => Ok(()),
            ResponseCheck::SuccessFlag => match success_flag(body) {
                Some(false) => Err(format!(
                    "Success=false in response {}",
                    serde_json::Value::Object(body.clone())
                )),
                _ => Ok(()),
            },
            ResponseCheck::Custom(check) => check(body),
        }
    }
}

impl fmt::Debug for ResponseCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCheck::None => f.write_str("None"),
            ResponseCheck::SuccessFlag => f.write_str("SuccessFlag"),
            ResponseCheck::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Decides whether and when a failed call is attempted again.
#[derive(Clone)]
pub struct RetryPolicy {
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) timeout: Duration,
    pub(crate) max_attempts: Option<usize>,
    pub(crate) classifier: ErrorClassifier,
    pub(crate) source: ErrorSource,
}

impl RetryPolicy {
    /// Creates a policy bounded by `timeout` using `interval_fn` between
    /// attempts and the default classifier.
    pub fn new(timeout: Duration, interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            interval_fn,
            timeout,
            max_attempts: None,
            classifier: ErrorClassifier::new(),
            source: ErrorSource::Sdk,
        }
    }

    /// Classifies a failed attempt.
    pub fn classify(&self, error: &ApiError) -> ErrorClass {
        self.classifier.classify(error)
    }

    /// Returns `true` if `error` should be retried.
    pub fn should_retry(&self, error: &ApiError) -> bool {
        self.classify(error) == ErrorClass::Retryable
    }

    /// Delay before the retry with index `attempt` (0 is the first retry).
    pub fn next_backoff(&self, attempt: usize) -> Duration {
        self.interval_fn.next_interval(attempt)
    }

    /// A fresh delay generator for one invocation.
    pub fn timer(&self) -> BackoffTimer {
        BackoffTimer::new(Arc::clone(&self.interval_fn))
    }

    /// Total time budget of one invocation.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attempt cap, if any.
    pub fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }

    /// Source tag put on errors from this policy.
    pub fn source(&self) -> ErrorSource {
        self.source
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("classifier", &self.classifier)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
