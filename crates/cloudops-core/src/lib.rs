//! Shared infrastructure for the cloudops helper layer.
//!
//! Every resource handler of the provider goes through the same few steps:
//! build an [`Operation`], invoke it against the API client with retry,
//! optionally poll a describe call until the resource settles, and page
//! through list calls. This crate holds the pieces those helpers share:
//!
//! - [`Operation`]: the request descriptor handed to the API client
//! - [`ApiError`] and [`OperationError`]: collaborator and helper errors
//! - [`ErrorClassifier`]: the single place transient, not-found and fatal
//!   errors are told apart
//! - [`events`]: listener plumbing used by every helper for observability
//! - [`response`]: `$.A.B` path lookups into JSON responses
//! - [`Timeouts`]: per-operation time budgets

pub mod classify;
pub mod error;
pub mod events;
pub mod operation;
pub mod response;
pub mod timeouts;

pub use classify::{ErrorClass, ErrorClassifier, TransientCode};
pub use error::{ApiError, ErrorSource, OperationError};
pub use events::{EventListener, EventListeners, FnListener, OperationEvent};
pub use operation::{Method, Operation, Payload};
pub use timeouts::Timeouts;
