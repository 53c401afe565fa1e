//! Centralized error classification.
//!
//! Every helper asks the same question of a failed call: try again, treat
//! the resource as gone, or give up. [`ErrorClassifier::classify`] answers
//! it in one place. Call sites extend the allow-list of transient codes for
//! their endpoint instead of matching strings inline.
//!
//! ```
//! use cloudops_core::{ApiError, ErrorClass, ErrorClassifier, TransientCode};
//!
//! let classifier = ErrorClassifier::new()
//!     .retry_on(TransientCode::IdempotenceProcessing)
//!     .retry_on_code("IncorrectBusinessStatus.LoadBalancer");
//!
//! let busy = ApiError::service("IncorrectBusinessStatus.LoadBalancer", "busy");
//! assert_eq!(classifier.classify(&busy), ErrorClass::Retryable);
//!
//! let denied = ApiError::service("Forbidden.RAM", "not authorized");
//! assert_eq!(classifier.classify(&denied), ErrorClass::Fatal);
//! ```

use crate::error::ApiError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// The outcome of classifying a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transient; the call may succeed if repeated.
    Retryable,
    /// The resource does not exist.
    NotFound,
    /// Anything else; propagate immediately.
    Fatal,
}

impl ErrorClass {
    /// Stable label used in events and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorClass::Retryable => "retryable",
            ErrorClass::NotFound => "not_found",
            ErrorClass::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side error codes that commonly mean "try again shortly".
///
/// Call sites opt into the ones their endpoint produces; none of them is
/// retried unless listed (the generic throttling and availability
/// signatures are handled by [`needs_retry`] regardless).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientCode {
    /// `Throttling`
    Throttling,
    /// `Throttling.User`
    ThrottlingUser,
    /// `Throttling.Api`
    ThrottlingApi,
    /// `Rejected.Throttling`
    RejectedThrottling,
    /// `ServiceUnavailable`
    ServiceUnavailable,
    /// `SystemBusy`
    SystemBusy,
    /// `ServiceBusy`
    ServiceBusy,
    /// `IdempotenceProcessing`: a request with the same client token is still running.
    IdempotenceProcessing,
    /// `LastTokenProcessing`
    LastTokenProcessing,
    /// `OperationConflict`: another change to the resource is in flight.
    OperationConflict,
    /// `TaskConflict`
    TaskConflict,
    /// `IncorrectStatus`: the resource is mid-transition.
    IncorrectStatus,
    /// `IncorrectInstanceStatus`
    IncorrectInstanceStatus,
    /// `IncorrectVpcStatus`
    IncorrectVpcStatus,
    /// `DependencyViolation`: dependents have not been released yet.
    DependencyViolation,
    /// `InternalError`
    InternalError,
}

impl TransientCode {
    /// Every known transient code.
    pub const ALL: [TransientCode; 16] = [
        TransientCode::Throttling,
        TransientCode::ThrottlingUser,
        TransientCode::ThrottlingApi,
        TransientCode::RejectedThrottling,
        TransientCode::ServiceUnavailable,
        TransientCode::SystemBusy,
        TransientCode::ServiceBusy,
        TransientCode::IdempotenceProcessing,
        TransientCode::LastTokenProcessing,
        TransientCode::OperationConflict,
        TransientCode::TaskConflict,
        TransientCode::IncorrectStatus,
        TransientCode::IncorrectInstanceStatus,
        TransientCode::IncorrectVpcStatus,
        TransientCode::DependencyViolation,
        TransientCode::InternalError,
    ];

    /// The wire code this variant stands for.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransientCode::Throttling => "Throttling",
            TransientCode::ThrottlingUser => "Throttling.User",
            TransientCode::ThrottlingApi => "Throttling.Api",
            TransientCode::RejectedThrottling => "Rejected.Throttling",
            TransientCode::ServiceUnavailable => "ServiceUnavailable",
            TransientCode::SystemBusy => "SystemBusy",
            TransientCode::ServiceBusy => "ServiceBusy",
            TransientCode::IdempotenceProcessing => "IdempotenceProcessing",
            TransientCode::LastTokenProcessing => "LastTokenProcessing",
            TransientCode::OperationConflict => "OperationConflict",
            TransientCode::TaskConflict => "TaskConflict",
            TransientCode::IncorrectStatus => "IncorrectStatus",
            TransientCode::IncorrectInstanceStatus => "IncorrectInstanceStatus",
            TransientCode::IncorrectVpcStatus => "IncorrectVpcStatus",
            TransientCode::DependencyViolation => "DependencyViolation",
            TransientCode::InternalError => "InternalError",
        }
    }

    /// Parses a wire code back into a variant.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }
}

impl fmt::Display for TransientCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a configured code is compared with an error code.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CodeMatch {
    Known(TransientCode),
    Exact(String),
    Prefix(String),
}

impl CodeMatch {
    fn matches(&self, code: &str) -> bool {
        match self {
            CodeMatch::Known(known) => known.as_str() == code,
            CodeMatch::Exact(exact) => exact == code,
            CodeMatch::Prefix(prefix) => code.starts_with(prefix.as_str()),
        }
    }
}

/// Decides whether a failed call is retryable, not-found or fatal.
///
/// Order of evaluation:
/// 1. the call site's transient allow-list → [`ErrorClass::Retryable`]
/// 2. extra not-found codes and [`is_not_found`] → [`ErrorClass::NotFound`]
/// 3. [`needs_retry`] (unless disabled) → [`ErrorClass::Retryable`]
/// 4. otherwise → [`ErrorClass::Fatal`]
///
/// Listing a not-found code in the allow-list therefore makes it retryable,
/// which is how create handlers ride out eventual consistency.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    retryable: Vec<CodeMatch>,
    not_found: Vec<CodeMatch>,
    generic_retry: bool,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorClassifier {
    /// A classifier with an empty allow-list and the generic rules enabled.
    pub fn new() -> Self {
        Self {
            retryable: Vec::new(),
            not_found: Vec::new(),
            generic_retry: true,
        }
    }

    /// Retries errors carrying `code`.
    pub fn retry_on(mut self, code: TransientCode) -> Self {
        self.retryable.push(CodeMatch::Known(code));
        self
    }

    /// Retries errors carrying each of `codes`.
    pub fn retry_on_all<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = TransientCode>,
    {
        self.retryable
            .extend(codes.into_iter().map(CodeMatch::Known));
        self
    }

    /// Retries errors whose code equals `code` exactly.
    ///
    /// For endpoint-specific codes that have no [`TransientCode`] variant.
    pub fn retry_on_code(mut self, code: impl Into<String>) -> Self {
        self.retryable.push(CodeMatch::Exact(code.into()));
        self
    }

    /// Retries errors whose code starts with `prefix`.
    pub fn retry_on_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.retryable.push(CodeMatch::Prefix(prefix.into()));
        self
    }

    /// Treats `code` as "resource absent" in addition to the generic rules.
    pub fn not_found_code(mut self, code: impl Into<String>) -> Self {
        self.not_found.push(CodeMatch::Exact(code.into()));
        self
    }

    /// Disables the generic [`needs_retry`] signatures, leaving only the
    /// explicit allow-list.
    pub fn without_generic_retry(mut self) -> Self {
        self.generic_retry = false;
        self
    }

    /// Classifies `err`.
    pub fn classify(&self, err: &ApiError) -> ErrorClass {
        if let Some(code) = err.code() {
            if self.retryable.iter().any(|m| m.matches(code)) {
                return ErrorClass::Retryable;
            }
            if self.not_found.iter().any(|m| m.matches(code)) {
                return ErrorClass::NotFound;
            }
        }

        if is_not_found(err) {
            return ErrorClass::NotFound;
        }

        if self.generic_retry && needs_retry(err) {
            return ErrorClass::Retryable;
        }

        ErrorClass::Fatal
    }
}

fn server_error_signature() -> &'static Regex {
    static SIGNATURE: OnceLock<Regex> = OnceLock::new();
    SIGNATURE.get_or_init(|| Regex::new(r"^code: 5\d{2}").expect("valid server error regex"))
}

/// Generic "try again" signatures every endpoint shares.
///
/// Transport failures, any `Throttling*` code, `Rejected.Throttling`,
/// `ServiceUnavailable`, and 5xx responses (by status or by the
/// `code: 5xx` message prefix some SDKs produce).
pub fn needs_retry(err: &ApiError) -> bool {
    match err {
        ApiError::Transport { .. } => true,
        ApiError::Service {
            code,
            message,
            http_status,
            ..
        } => {
            code == TransientCode::ServiceUnavailable.as_str()
                || code == TransientCode::RejectedThrottling.as_str()
                || code.starts_with(TransientCode::Throttling.as_str())
                || server_error_signature().is_match(message)
                || matches!(http_status, Some(500..=599))
        }
    }
}

/// Generic "resource absent" signatures.
///
/// Codes equal to or ending in `NotFound`, codes ending in `.NotExist`,
/// HTTP 404, or the "instance is not found" message.
pub fn is_not_found(err: &ApiError) -> bool {
    match err {
        ApiError::Transport { .. } => false,
        ApiError::Service {
            code,
            message,
            http_status,
            ..
        } => {
            code.ends_with("NotFound")
                || code.ends_with(".NotExist")
                || code.starts_with("EntityNotExist")
                || *http_status == Some(404)
                || message.to_lowercase().contains("instance is not found")
        }
    }
}
