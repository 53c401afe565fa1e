//! Error types shared by all helpers.
//!
//! [`ApiError`] is what the API client collaborator reports for one call.
//! [`OperationError`] is what the helpers hand back to resource handlers:
//! the underlying failure wrapped with the action, the resource id and the
//! error source, so handlers can render it without further plumbing.
//!
//! ```
//! use cloudops_core::{ApiError, ErrorClass, ErrorSource, OperationError};
//!
//! let err = OperationError::api(
//!     "vpc-123",
//!     "DeleteVpc",
//!     ErrorSource::Sdk,
//!     ErrorClass::NotFound,
//!     ApiError::service("InvalidVpcId.NotFound", "The specified VPC does not exist."),
//! );
//!
//! // Handlers clear state instead of failing when the resource is gone.
//! assert!(err.is_not_found());
//! assert_eq!(err.resource_id(), Some("vpc-123"));
//! ```

use crate::classify::ErrorClass;
use std::fmt;
use std::time::Duration;

/// Where an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSource {
    /// The generic RPC/ROA SDK client.
    Sdk,
    /// The provider's own logic (state checks, timeouts, parsing).
    Provider,
    /// The object storage SDK.
    ObjectStorage,
    /// One of the older per-service SDKs.
    LegacySdk,
}

impl ErrorSource {
    /// Stable tag used in rendered messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSource::Sdk => "sdk",
            ErrorSource::Provider => "provider",
            ErrorSource::ObjectStorage => "object-storage-sdk",
            ErrorSource::LegacySdk => "legacy-sdk",
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure reported by the API client for a single call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The service answered with an error code.
    #[error("{code}: {message}")]
    Service {
        /// Service error code, e.g. `Throttling.User`.
        code: String,
        /// Human-readable message from the service.
        message: String,
        /// HTTP status of the response, when known.
        http_status: Option<u16>,
        /// Request id for support tickets, when known.
        request_id: Option<String>,
    },
    /// The request never produced a service answer (connect, TLS, reset).
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },
}

impl ApiError {
    /// Creates a service error with the given code and message.
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Service {
            code: code.into(),
            message: message.into(),
            http_status: None,
            request_id: None,
        }
    }

    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        ApiError::Transport {
            message: message.into(),
        }
    }

    /// Attaches the HTTP status. No effect on transport errors.
    pub fn with_http_status(mut self, status: u16) -> Self {
        if let ApiError::Service { http_status, .. } = &mut self {
            *http_status = Some(status);
        }
        self
    }

    /// Attaches the request id. No effect on transport errors.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        if let ApiError::Service { request_id, .. } = &mut self {
            *request_id = Some(id.into());
        }
        self
    }

    /// The service error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Service { code, .. } => Some(code),
            ApiError::Transport { .. } => None,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Service { message, .. } | ApiError::Transport { message } => message,
        }
    }

    /// The HTTP status, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Service { http_status, .. } => *http_status,
            ApiError::Transport { .. } => None,
        }
    }

    /// The request id, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ApiError::Service { request_id, .. } => request_id.as_deref(),
            ApiError::Transport { .. } => None,
        }
    }
}

fn describe_last(last: &Option<ApiError>) -> String {
    match last {
        Some(err) => err.to_string(),
        None => "no response before deadline".to_string(),
    }
}

/// An error returned by one of the helpers to a resource handler.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OperationError {
    /// A call failed with an error that is not retried.
    #[error("[{source_tag}] resource {id} {action} failed: {cause}")]
    Api {
        /// Resource the call concerned.
        id: String,
        /// Action name.
        action: String,
        /// Origin of the error.
        source_tag: ErrorSource,
        /// How the classifier labelled the error.
        class: ErrorClass,
        /// The underlying failure.
        #[source]
        cause: ApiError,
    },

    /// Retryable failures kept happening until the time budget ran out.
    #[error(
        "[{source_tag}] resource {id} {action} timed out after {elapsed:?} ({attempts} attempts): {}",
        describe_last(.last_error)
    )]
    RetryTimeout {
        /// Resource the call concerned.
        id: String,
        /// Action name.
        action: String,
        /// Origin of the error.
        source_tag: ErrorSource,
        /// Number of attempts that were started.
        attempts: usize,
        /// Time spent before giving up.
        elapsed: Duration,
        /// The last failure observed, if any attempt completed.
        last_error: Option<ApiError>,
    },

    /// The polled resource entered one of the declared failure states.
    #[error("resource {id} entered failure status {status:?} while waiting for {target:?}")]
    FailedState {
        /// Resource being polled.
        id: String,
        /// The status that was observed.
        status: String,
        /// The statuses that were awaited.
        target: Vec<String>,
    },

    /// The polled resource reported a known status outside the declared
    /// pending and target sets.
    #[error("resource {id} reported unexpected status {status:?}, wanted {target:?}")]
    UnexpectedState {
        /// Resource being polled.
        id: String,
        /// The status that was observed.
        status: String,
        /// The statuses that were awaited.
        target: Vec<String>,
    },

    /// The polled resource reported a status the caller's status type
    /// does not recognize.
    #[error("resource {id} reported unrecognized status {status:?}")]
    UnknownState {
        /// Resource being polled.
        id: String,
        /// The raw status string.
        status: String,
    },

    /// The waiter ran out of time while the resource was still pending.
    #[error(
        "timed out after {timeout:?} waiting for resource {id} to reach {target:?} (last status {last_status:?})"
    )]
    WaitTimeout {
        /// Resource being polled.
        id: String,
        /// The statuses that were awaited.
        target: Vec<String>,
        /// The last status observed, if any.
        last_status: Option<String>,
        /// The configured time budget.
        timeout: Duration,
    },

    /// The resource does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Resource kind, e.g. "VPC".
        resource: String,
        /// Resource id.
        id: String,
    },

    /// A response did not contain an attribute the handler relies on.
    #[error("resource {id}: {action} response has no value at {path}")]
    MissingAttribute {
        /// Resource the call concerned.
        id: String,
        /// Action name.
        action: String,
        /// Path that was looked up, e.g. `$.Vpcs.Vpc`.
        path: String,
    },

    /// A call returned successfully but its body reports failure.
    #[error("resource {id} {action} returned an unsuccessful response: {detail}")]
    Unsuccessful {
        /// Resource the call concerned.
        id: String,
        /// Action name.
        action: String,
        /// What the body reported.
        detail: String,
    },

    /// Enumeration could not make progress.
    #[error("pagination of {action} stopped: {reason}")]
    Pagination {
        /// Action name of the list call.
        action: String,
        /// Why enumeration stopped.
        reason: String,
    },
}

impl OperationError {
    /// Wraps a non-retried API failure with its context.
    pub fn api(
        id: impl Into<String>,
        action: impl Into<String>,
        source_tag: ErrorSource,
        class: ErrorClass,
        cause: ApiError,
    ) -> Self {
        OperationError::Api {
            id: id.into(),
            action: action.into(),
            source_tag,
            class,
            cause,
        }
    }

    /// Creates a not-found error for the given resource kind and id.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        OperationError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Returns `true` if the resource is absent.
    ///
    /// Read handlers use this to clear state rather than fail.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            OperationError::NotFound { .. }
                | OperationError::Api {
                    class: ErrorClass::NotFound,
                    ..
                }
        )
    }

    /// Returns `true` if a retry or wait budget was exhausted.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            OperationError::RetryTimeout { .. } | OperationError::WaitTimeout { .. }
        )
    }

    /// Returns `true` if the wrapped API failure was classified retryable.
    ///
    /// Only [`OperationError::Api`] can carry a retryable class, which
    /// happens when a helper stops early (e.g. an attempt cap) on a
    /// transient error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OperationError::Api {
                class: ErrorClass::Retryable,
                ..
            }
        )
    }

    /// Returns `true` if a polled resource reached a failure state.
    pub fn is_failed_state(&self) -> bool {
        matches!(self, OperationError::FailedState { .. })
    }

    /// The resource id this error concerns, if it has one.
    pub fn resource_id(&self) -> Option<&str> {
        match self {
            OperationError::Api { id, .. }
            | OperationError::RetryTimeout { id, .. }
            | OperationError::FailedState { id, .. }
            | OperationError::UnexpectedState { id, .. }
            | OperationError::UnknownState { id, .. }
            | OperationError::WaitTimeout { id, .. }
            | OperationError::NotFound { id, .. }
            | OperationError::MissingAttribute { id, .. }
            | OperationError::Unsuccessful { id, .. } => Some(id),
            OperationError::Pagination { .. } => None,
        }
    }

    /// The underlying API failure, if this error wraps one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            OperationError::Api { cause, .. } => Some(cause),
            OperationError::RetryTimeout { last_error, .. } => last_error.as_ref(),
            _ => None,
        }
    }
}
