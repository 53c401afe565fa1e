use crate::{Retry, RetryConfig};
use cloudops_core::{ApiError, OperationError};
use std::future::Future;
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that applies the retrying invoker to an API client.
///
/// The wrapped service must accept an [`Operation`](cloudops_core::Operation)
/// and answer with a [`Payload`](cloudops_core::Payload) or an
/// [`ApiError`]; the resulting service answers with an [`OperationError`].
///
/// # Examples
///
/// ```
/// use cloudops_core::{ApiError, Operation, Payload};
/// use cloudops_retry::RetryLayer;
/// use tower::ServiceBuilder;
/// use std::time::Duration;
///
/// # async fn example() {
/// let retry_layer = RetryLayer::builder()
///     .name("vpc")
///     .timeout(Duration::from_secs(60))
///     .incremental_backoff(Duration::from_secs(3), Duration::from_secs(3))
///     .build_layer();
///
/// let client = ServiceBuilder::new()
///     .layer(retry_layer)
///     .service(tower::service_fn(|_op: Operation| async move {
///         Ok::<_, ApiError>(Payload::new())
///     }));
/// # }
/// ```
#[derive(Clone)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

impl RetryLayer {
    /// Creates a new `RetryLayer` with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a retry layer.
    pub fn builder() -> crate::RetryConfigBuilder {
        RetryConfig::builder()
    }

    /// The shared configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `attempt` under this layer's policy without a Tower service.
    ///
    /// Shorthand for [`RetryConfig::invoke`].
    pub async fn invoke<T, F, Fut>(
        &self,
        id: &str,
        action: &str,
        attempt: F,
    ) -> Result<T, OperationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        self.config.invoke(id, action, attempt).await
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, service: S) -> Self::Service {
        Retry::new(service, Arc::clone(&self.config))
    }
}
