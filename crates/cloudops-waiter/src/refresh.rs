use cloudops_core::response::string_at;
use cloudops_core::OperationError;
use serde_json::Value;

/// What one call of a describe closure observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh<T> {
    /// The resource exists and reports `status`.
    Found {
        /// The described object, handed back when a target is reached.
        object: T,
        /// The raw status string.
        status: String,
    },
    /// The resource does not exist.
    Absent,
}

impl<T> Refresh<T> {
    /// A resource that exists with the given status.
    pub fn found(object: T, status: impl Into<String>) -> Self {
        Refresh::Found {
            object,
            status: status.into(),
        }
    }

    /// The raw status, if the resource exists.
    pub fn status(&self) -> Option<&str> {
        match self {
            Refresh::Found { status, .. } => Some(status),
            Refresh::Absent => None,
        }
    }

    /// Normalizes a describe result: not-found errors become
    /// [`Refresh::Absent`], other errors pass through.
    pub fn from_result(result: Result<Refresh<T>, OperationError>) -> Result<Self, OperationError> {
        match result {
            Err(err) if err.is_not_found() => Ok(Refresh::Absent),
            other => other,
        }
    }
}

impl Refresh<Value> {
    /// Builds a refresh from a describe response, reading the status at
    /// `status_path` (`$.A.B` form). A response without a status counts
    /// as an empty status string.
    pub fn from_json(object: Value, status_path: &str) -> Self {
        let status = string_at(&object, status_path).unwrap_or_default();
        Refresh::Found { object, status }
    }
}
