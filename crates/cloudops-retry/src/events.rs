use cloudops_core::events::OperationEvent;
use cloudops_core::ErrorClass;
use std::time::{Duration, Instant};

/// Events emitted by the retrying invoker.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// A retryable failure was observed and the call will be repeated.
    Retry {
        pattern_name: String,
        timestamp: Instant,
        action: String,
        attempt: usize,
        delay: Duration,
        code: Option<String>,
    },
    /// The call succeeded (first try or after retries).
    Success {
        pattern_name: String,
        timestamp: Instant,
        action: String,
        attempts: usize,
    },
    /// The time budget ran out while failures were still retryable.
    TimedOut {
        pattern_name: String,
        timestamp: Instant,
        action: String,
        attempts: usize,
        elapsed: Duration,
    },
    /// The attempt cap was reached on a retryable failure.
    Exhausted {
        pattern_name: String,
        timestamp: Instant,
        action: String,
        attempts: usize,
    },
    /// A failure was classified as not retryable and returned at once.
    NotRetried {
        pattern_name: String,
        timestamp: Instant,
        action: String,
        class: ErrorClass,
    },
}

impl RetryEvent {
    /// Action name of the call that produced the event.
    pub fn action(&self) -> &str {
        match self {
            RetryEvent::Retry { action, .. }
            | RetryEvent::Success { action, .. }
            | RetryEvent::TimedOut { action, .. }
            | RetryEvent::Exhausted { action, .. }
            | RetryEvent::NotRetried { action, .. } => action,
        }
    }
}

impl OperationEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "Retry",
            RetryEvent::Success { .. } => "Success",
            RetryEvent::TimedOut { .. } => "TimedOut",
            RetryEvent::Exhausted { .. } => "Exhausted",
            RetryEvent::NotRetried { .. } => "NotRetried",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::TimedOut { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::NotRetried { timestamp, .. } => *timestamp,
        }
    }

    fn helper_name(&self) -> &str {
        match self {
            RetryEvent::Retry { pattern_name, .. }
            | RetryEvent::Success { pattern_name, .. }
            | RetryEvent::TimedOut { pattern_name, .. }
            | RetryEvent::Exhausted { pattern_name, .. }
            | RetryEvent::NotRetried { pattern_name, .. } => pattern_name,
        }
    }
}
