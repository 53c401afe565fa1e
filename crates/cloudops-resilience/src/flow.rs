//! Composed invoke-then-wait flow used by create, update and delete
//! handlers.

use cloudops_core::response::string_at;
use cloudops_core::{ApiError, Operation, OperationError, Payload};
use cloudops_retry::RetryConfig;
use cloudops_waiter::{Refresh, ResourceStatus, WaitConfig};
use serde_json::Value;
use std::future::Future;
use tower::Service;

/// Result of [`invoke_then_wait`].
#[derive(Debug, Clone)]
pub struct Settled<T> {
    /// Id of the resource the wait was keyed on.
    pub id: String,
    /// Response body of the mutating call.
    pub response: Payload,
    /// Object from the poll that observed the target status, or `None`
    /// when the wait ended on absence.
    pub object: Option<T>,
}

/// Reads the resource id from `path` in the response body.
///
/// A response without a string or number at `path` fails with
/// [`OperationError::MissingAttribute`].
pub fn id_at(
    path: impl Into<String>,
) -> impl FnOnce(&Operation, &Payload) -> Result<String, OperationError> {
    let path = path.into();
    move |op: &Operation, body: &Payload| {
        string_at(&Value::Object(body.clone()), &path).ok_or_else(|| OperationError::MissingAttribute {
            id: op.id().to_string(),
            action: op.action().to_string(),
            path: path.clone(),
        })
    }
}

/// Uses the id the operation was built with.
pub fn operation_id() -> impl FnOnce(&Operation, &Payload) -> Result<String, OperationError> {
    |op: &Operation, _: &Payload| Ok(op.id().to_string())
}

/// Sends `op` through `client` under `retry`, then waits with `waiter`
/// until the resource named by `resource_id` settles.
///
/// `describe` receives the resource id on every poll. Errors from either
/// phase are returned as is.
///
/// # Examples
///
/// ```
/// use cloudops_core::{ApiError, Operation, OperationError, Payload};
/// use cloudops_resilience::flow::{id_at, invoke_then_wait};
/// use cloudops_resilience::retry::RetryConfig;
/// use cloudops_resilience::waiter::{CommonStatus, Refresh, WaitConfig};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), OperationError> {
/// let client = tower::service_fn(|_op: Operation| async {
///     let mut body = Payload::new();
///     body.insert("VpcId".into(), json!("vpc-1"));
///     Ok::<_, ApiError>(body)
/// });
///
/// let retry = RetryConfig::builder().name("create-vpc").build();
/// let waiter = WaitConfig::builder()
///     .pending([CommonStatus::Pending])
///     .target([CommonStatus::Available])
///     .build();
///
/// let settled = invoke_then_wait(
///     &retry,
///     client,
///     Operation::new("CreateVpc", "2016-04-28"),
///     &waiter,
///     id_at("$.VpcId"),
///     |id| async move { Ok(Refresh::found(id, "Available")) },
/// )
/// .await?;
/// assert_eq!(settled.id, "vpc-1");
/// # Ok(())
/// # }
/// ```
pub async fn invoke_then_wait<C, S, T, I, F, Fut>(
    retry: &RetryConfig,
    client: C,
    op: Operation,
    waiter: &WaitConfig<S>,
    resource_id: I,
    mut describe: F,
) -> Result<Settled<T>, OperationError>
where
    C: Service<Operation, Response = Payload, Error = ApiError> + Clone,
    S: ResourceStatus,
    I: FnOnce(&Operation, &Payload) -> Result<String, OperationError>,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Refresh<T>, OperationError>>,
{
    let response = retry.invoke_operation(client, op.clone()).await?;
    let id = resource_id(&op, &response)?;

    #[cfg(feature = "tracing")]
    tracing::info!(action = op.action(), id = %id, waiter = waiter.name(), "operation accepted, waiting");

    let object = waiter.wait_for(&id, || describe(id.clone())).await?;

    Ok(Settled {
        id,
        response,
        object,
    })
}
