//! Time-bounded retrying invoker for cloud API calls.
//!
//! Every remote call a resource handler makes goes through the same loop:
//! invoke, classify a failure with the shared
//! [`ErrorClassifier`](cloudops_core::ErrorClassifier), sleep an
//! incrementally growing delay on transient failures, and give up once the
//! next sleep would cross the time budget.
//!
//! # Features
//!
//! - **Incremental backoff**: `3s, 6s, 9s, ...` by default, or any
//!   [`IntervalFunction`]
//! - **Centralized classification**: transient allow-lists per call site,
//!   not-found and fatal errors returned on the first attempt
//! - **Time budget**: attempts and sleeps both count against the timeout
//! - **Tower integration**: [`RetryLayer`] wraps any API client service
//! - **Event system**: `on_retry`, `on_success`, `on_timeout`, ...
//!
//! # Examples
//!
//! ```
//! use cloudops_core::{ApiError, TransientCode};
//! use cloudops_retry::RetryConfig;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), cloudops_core::OperationError> {
//! let config = RetryConfig::builder()
//!     .name("eip")
//!     .timeout(Duration::from_secs(60))
//!     .retry_on(TransientCode::TaskConflict)
//!     .on_retry(|attempt, delay| {
//!         println!("attempt {} failed, retrying in {:?}", attempt, delay);
//!     })
//!     .build();
//!
//! let allocation_id = config
//!     .invoke("eip-123", "AllocateEipAddress", || async {
//!         Ok::<_, ApiError>("eip-123".to_string())
//!     })
//!     .await?;
//! # let _ = allocation_id;
//! # Ok(())
//! # }
//! ```

mod backoff;
mod config;
mod events;
mod layer;
mod policy;

pub use backoff::{
    incremental_wait, BackoffTimer, ExponentialBackoff, FixedInterval, FnInterval,
    IncrementalInterval, IntervalFunction,
};
pub use config::{RetryConfig, RetryConfigBuilder, DEFAULT_BACKOFF_STEP, DEFAULT_TIMEOUT};
pub use events::RetryEvent;
pub use layer::RetryLayer;
pub use policy::{ResponseCheck, ResponseCheckFn, RetryPolicy};

use cloudops_core::{ApiError, ErrorClass, Operation, OperationError, Payload};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, histogram};

impl RetryConfig {
    /// Runs `attempt` until it succeeds, fails with a non-retryable error,
    /// or the time budget runs out.
    ///
    /// `id` and `action` are carried into errors, events and logs.
    pub async fn invoke<T, F, Fut>(
        &self,
        id: &str,
        action: &str,
        mut attempt: F,
    ) -> Result<T, OperationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let policy = &self.policy;
        let start = tokio::time::Instant::now();
        let mut timer = policy.timer();
        let mut last_error: Option<ApiError> = None;
        let mut attempts = 0usize;

        loop {
            let remaining = policy.timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(self.timed_out(id, action, attempts, start.elapsed(), last_error));
            }
            attempts += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(retry = %self.name, id, action, attempt = attempts, "invoking");

            let error = match tokio::time::timeout(remaining, attempt()).await {
                Ok(Ok(response)) => {
                    self.event_listeners.emit(&RetryEvent::Success {
                        pattern_name: self.name.clone(),
                        timestamp: Instant::now(),
                        action: action.to_string(),
                        attempts,
                    });
                    self.record_outcome("success", attempts);
                    return Ok(response);
                }
                Ok(Err(error)) => error,
                Err(_) => {
                    return Err(self.timed_out(id, action, attempts, start.elapsed(), last_error));
                }
            };

            let class = policy.classify(&error);
            if class != ErrorClass::Retryable {
                #[cfg(feature = "tracing")]
                tracing::debug!(retry = %self.name, id, action, class = %class, error = %error, "not retrying");

                self.event_listeners.emit(&RetryEvent::NotRetried {
                    pattern_name: self.name.clone(),
                    timestamp: Instant::now(),
                    action: action.to_string(),
                    class,
                });
                self.record_outcome(class.as_str(), attempts);
                return Err(OperationError::api(id, action, policy.source, class, error));
            }

            if matches!(policy.max_attempts, Some(max) if attempts >= max) {
                self.event_listeners.emit(&RetryEvent::Exhausted {
                    pattern_name: self.name.clone(),
                    timestamp: Instant::now(),
                    action: action.to_string(),
                    attempts,
                });
                self.record_outcome("exhausted", attempts);
                return Err(OperationError::api(
                    id,
                    action,
                    policy.source,
                    ErrorClass::Retryable,
                    error,
                ));
            }

            let delay = timer.next_delay();
            let elapsed = start.elapsed();
            if elapsed.saturating_add(delay) >= policy.timeout {
                return Err(self.timed_out(id, action, attempts, elapsed, Some(error)));
            }

            #[cfg(feature = "tracing")]
            tracing::warn!(
                retry = %self.name,
                id,
                action,
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "retryable failure"
            );

            self.event_listeners.emit(&RetryEvent::Retry {
                pattern_name: self.name.clone(),
                timestamp: Instant::now(),
                action: action.to_string(),
                attempt: attempts,
                delay,
                code: error.code().map(str::to_string),
            });

            #[cfg(feature = "metrics")]
            counter!("retry_attempts_total", "retry" => self.name.clone()).increment(1);

            last_error = Some(error);
            tokio::time::sleep(delay).await;
        }
    }

    /// Sends `op` through `client` with retry, then applies the configured
    /// [`ResponseCheck`] to the body.
    pub async fn invoke_operation<S>(
        &self,
        client: S,
        op: Operation,
    ) -> Result<Payload, OperationError>
    where
        S: Service<Operation, Response = Payload, Error = ApiError> + Clone,
    {
        let id = op.id().to_string();
        let action = op.action().to_string();

        let body = self
            .invoke(&id, &action, move || client.clone().oneshot(op.clone()))
            .await?;

        self.response_check
            .verify(&body)
            .map_err(|detail| {
                #[cfg(feature = "tracing")]
                tracing::warn!(retry = %self.name, id = %id, action = %action, detail = %detail, "unsuccessful response");

                OperationError::Unsuccessful {
                    id: id.clone(),
                    action: action.clone(),
                    detail,
                }
            })?;

        Ok(body)
    }

    fn timed_out(
        &self,
        id: &str,
        action: &str,
        attempts: usize,
        elapsed: Duration,
        last_error: Option<ApiError>,
    ) -> OperationError {
        #[cfg(feature = "tracing")]
        tracing::warn!(retry = %self.name, id, action, attempts, elapsed_ms = elapsed.as_millis() as u64, "retry budget exhausted");

        self.event_listeners.emit(&RetryEvent::TimedOut {
            pattern_name: self.name.clone(),
            timestamp: Instant::now(),
            action: action.to_string(),
            attempts,
            elapsed,
        });
        self.record_outcome("timeout", attempts);

        OperationError::RetryTimeout {
            id: id.to_string(),
            action: action.to_string(),
            source_tag: self.policy.source,
            attempts,
            elapsed,
            last_error,
        }
    }

    fn record_outcome(&self, result: &'static str, attempts: usize) {
        #[cfg(feature = "metrics")]
        {
            counter!("retry_calls_total", "retry" => self.name.clone(), "result" => result)
                .increment(1);
            histogram!("retry_attempts", "retry" => self.name.clone()).record(attempts as f64);
        }
        #[cfg(not(feature = "metrics"))]
        let _ = (result, attempts);
    }
}

/// A Tower [`Service`] that retries failed API calls.
///
/// Wraps an API client and turns its [`ApiError`]s into
/// [`OperationError`]s according to the configured policy.
pub struct Retry<S> {
    inner: S,
    config: Arc<RetryConfig>,
}

impl<S> Retry<S> {
    /// Creates a new `Retry` service wrapping the given client.
    pub fn new(inner: S, config: Arc<RetryConfig>) -> Self {
        Self { inner, config }
    }

    /// The wrapped client.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S> Clone for Retry<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> Service<Operation> for Retry<S>
where
    S: Service<Operation, Response = Payload, Error = ApiError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Payload;
    type Error = OperationError;
    type Future = BoxFuture<'static, Result<Payload, OperationError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Each attempt drives readiness on its own clone of the client.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let client = self.inner.clone();
        let config = Arc::clone(&self.config);

        Box::pin(async move { config.invoke_operation(client, op).await })
    }
}
