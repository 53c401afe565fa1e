//! Error classification tests for cloudops-retry.
//!
//! Tests classification including:
//! - Per-call-site transient allow-lists
//! - Generic throttling and 5xx signatures
//! - Not-found returned on the first attempt
//! - Fatal errors returned without sleeping
//! - Allow-listed not-found codes (eventual consistency on create)

use cloudops_core::{ApiError, ErrorClass, ErrorClassifier, ErrorSource, OperationError, TransientCode};
use cloudops_retry::RetryConfig;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

async fn attempts_until_done(config: &RetryConfig, error: ApiError) -> (usize, Result<(), OperationError>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let result = config
        .invoke("r-1", "CreateNatGateway", || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            let error = error.clone();
            async move { if n == 0 { Err(error) } else { Ok(()) } }
        })
        .await;
    (calls.load(Ordering::SeqCst), result)
}

#[tokio::test(start_paused = true)]
async fn allow_listed_codes_are_retried() {
    let config = RetryConfig::builder()
        .retry_on_all([TransientCode::TaskConflict, TransientCode::IncorrectVpcStatus])
        .build();

    for code in ["TaskConflict", "IncorrectVpcStatus"] {
        let (calls, result) = attempts_until_done(&config, ApiError::service(code, "busy")).await;
        assert!(result.is_ok(), "{code} should be retried");
        assert_eq!(calls, 2);
    }
}

#[tokio::test(start_paused = true)]
async fn unlisted_code_is_fatal() {
    let config = RetryConfig::builder().retry_on(TransientCode::TaskConflict).build();

    let start = Instant::now();
    let (calls, result) =
        attempts_until_done(&config, ApiError::service("IncorrectVpcStatus", "busy")).await;

    assert_eq!(calls, 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        OperationError::Api {
            class: ErrorClass::Fatal,
            ..
        }
    ));
    assert_eq!(err.resource_id(), Some("r-1"));
    assert_eq!(err.api_error().and_then(ApiError::code), Some("IncorrectVpcStatus"));
}

#[tokio::test(start_paused = true)]
async fn generic_signatures_retry_everywhere() {
    let config = RetryConfig::builder().build();

    let transient = [
        ApiError::service("Throttling.Api", "slow down"),
        ApiError::service("ServiceUnavailable", "try later"),
        ApiError::service("Anything", "code: 503, gateway unavailable"),
        ApiError::service("Anything", "oops").with_http_status(502),
        ApiError::transport("connection reset by peer"),
    ];

    for error in transient {
        let (calls, result) = attempts_until_done(&config, error.clone()).await;
        assert!(result.is_ok(), "{error} should be retried");
        assert_eq!(calls, 2);
    }
}

#[tokio::test(start_paused = true)]
async fn generic_signatures_can_be_disabled() {
    let config = RetryConfig::builder()
        .classifier(ErrorClassifier::new().without_generic_retry())
        .build();

    let (calls, result) =
        attempts_until_done(&config, ApiError::service("Throttling", "slow down")).await;
    assert_eq!(calls, 1);
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn not_found_returns_immediately() {
    let config = RetryConfig::builder().build();

    for error in [
        ApiError::service("InvalidVpcId.NotFound", "vpc missing"),
        ApiError::service("Forbidden.NotExist", "gone"),
        ApiError::service("Other", "missing").with_http_status(404),
    ] {
        let (calls, result) = attempts_until_done(&config, error).await;
        assert_eq!(calls, 1);
        assert!(result.unwrap_err().is_not_found());
    }
}

#[tokio::test(start_paused = true)]
async fn allow_listed_not_found_is_retried() {
    let config = RetryConfig::builder()
        .retry_on_code("InvalidVSwitchId.NotFound")
        .build();

    let (calls, result) = attempts_until_done(
        &config,
        ApiError::service("InvalidVSwitchId.NotFound", "not visible yet"),
    )
    .await;
    assert!(result.is_ok());
    assert_eq!(calls, 2);
}

#[tokio::test(start_paused = true)]
async fn extra_not_found_codes() {
    let config = RetryConfig::builder()
        .classifier(ErrorClassifier::new().not_found_code("InvalidInstance.Released"))
        .build();

    let (_, result) =
        attempts_until_done(&config, ApiError::service("InvalidInstance.Released", "gone")).await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test(start_paused = true)]
async fn source_tag_is_carried_into_errors() {
    let config = RetryConfig::builder().source(ErrorSource::ObjectStorage).build();

    let (_, result) = attempts_until_done(&config, ApiError::service("AccessDenied", "no")).await;
    match result.unwrap_err() {
        OperationError::Api { source_tag, .. } => assert_eq!(source_tag, ErrorSource::ObjectStorage),
        other => panic!("unexpected error: {other}"),
    }
}
