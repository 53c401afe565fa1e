//! Resilience helpers for cloud resource handlers.
//!
//! `cloudops-resilience` bundles the helpers every create, read, update and
//! delete handler leans on when talking to an eventually consistent cloud
//! API. Each helper is available as an individual crate and as a feature in
//! this meta-crate.
//!
//! # Helpers
//!
//! - **Retry** (`retry` feature): time-bounded retries with incremental
//!   backoff and centralized error classification
//! - **Waiter** (`waiter` feature): poll a describe call until the resource
//!   reaches a target status
//! - **Paginator** (`paginator` feature): page-number and next-token
//!   enumeration with per-page filtering
//!
//! With both `retry` and `waiter` enabled, [`flow::invoke_then_wait`]
//! composes a mutating call with the wait that follows it.
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! cloudops-resilience = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Individual Crates
//!
//! - `cloudops-retry`
//! - `cloudops-waiter`
//! - `cloudops-paginator`
//! - `cloudops-core` (shared infrastructure)

// Re-export core (always available)
pub use cloudops_core as core;
pub use cloudops_core::{ApiError, ErrorClass, ErrorClassifier, Operation, OperationError, Payload};

#[cfg(feature = "retry")]
pub use cloudops_retry as retry;

#[cfg(feature = "waiter")]
pub use cloudops_waiter as waiter;

#[cfg(feature = "paginator")]
pub use cloudops_paginator as paginator;

#[cfg(all(feature = "retry", feature = "waiter"))]
pub mod flow;
