//! Lookups into JSON responses by `$.A.B` path.
//!
//! Handlers address nested response fields with the dotted form the API
//! documentation uses (`$.Vpcs.Vpc`). Array elements are addressed by
//! index (`$.Vpcs.Vpc.0.VpcId`).

use crate::error::OperationError;
use crate::operation::Payload;
use serde_json::Value;

/// Converts `$.A.B` into the JSON pointer `/A/B`.
fn to_pointer(path: &str) -> String {
    let trimmed = path
        .strip_prefix("$.")
        .or_else(|| path.strip_prefix('$'))
        .unwrap_or(path);
    if trimmed.is_empty() {
        return String::new();
    }
    trimmed
        .split('.')
        .map(|segment| segment.replace('~', "~0").replace('/', "~1"))
        .fold(String::new(), |mut pointer, segment| {
            pointer.push('/');
            pointer.push_str(&segment);
            pointer
        })
}

/// Returns the value at `path`, if present.
///
/// ```
/// use cloudops_core::response::value_at;
/// use serde_json::json;
///
/// let body = json!({"Vpcs": {"Vpc": [{"VpcId": "vpc-1"}]}});
/// assert_eq!(value_at(&body, "$.Vpcs.Vpc.0.VpcId"), Some(&json!("vpc-1")));
/// assert_eq!(value_at(&body, "$.Vpcs.Missing"), None);
/// ```
pub fn value_at<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    body.pointer(&to_pointer(path))
}

/// Returns the value at `path` or a [`OperationError::MissingAttribute`].
pub fn require<'a>(
    body: &'a Value,
    path: &str,
    id: &str,
    action: &str,
) -> Result<&'a Value, OperationError> {
    value_at(body, path).ok_or_else(|| OperationError::MissingAttribute {
        id: id.to_string(),
        action: action.to_string(),
        path: path.to_string(),
    })
}

/// Returns the array at `path`; a missing path or `null` yields an empty
/// slice, anything else that is not an array is an error.
pub fn array_at<'a>(
    body: &'a Value,
    path: &str,
    id: &str,
    action: &str,
) -> Result<&'a [Value], OperationError> {
    match value_at(body, path) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(OperationError::MissingAttribute {
            id: id.to_string(),
            action: action.to_string(),
            path: path.to_string(),
        }),
    }
}

/// Renders the value at `path` as a string: strings verbatim, numbers and
/// booleans in their JSON form, anything else `None`.
pub fn string_at(body: &Value, path: &str) -> Option<String> {
    match value_at(body, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads the `Success` flag some APIs embed in otherwise successful
/// responses. `None` when the body carries no such flag.
pub fn success_flag(body: &Payload) -> Option<bool> {
    match body.get("Success")? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
