//! The request descriptor handed to the API client.

use serde_json::{Map, Value};
use std::fmt;

/// A JSON object used for request parameters and response bodies.
pub type Payload = Map<String, Value>;

/// HTTP method of a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`, the default for RPC-style actions.
    #[default]
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote call: action, method, API version and parameters.
///
/// Built once per call and treated as immutable afterwards; helpers that
/// need a variant (the paginator advancing a cursor) derive a new
/// descriptor with [`Operation::with_param`].
///
/// ```
/// use cloudops_core::{Method, Operation};
///
/// let op = Operation::new("DescribeVpcs", "2016-04-28")
///     .method(Method::Post)
///     .resource_id("vpc-123")
///     .param("RegionId", "cn-hangzhou")
///     .param("VpcId", "vpc-123");
///
/// assert_eq!(op.action(), "DescribeVpcs");
/// assert_eq!(op.params()["VpcId"], "vpc-123");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    action: String,
    version: String,
    method: Method,
    query: Payload,
    params: Payload,
    resource_id: Option<String>,
    client_token: Option<String>,
}

impl Operation {
    /// Starts a descriptor for `action` at API `version`, method POST.
    pub fn new(action: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            version: version.into(),
            method: Method::default(),
            query: Payload::new(),
            params: Payload::new(),
            resource_id: None,
            client_token: None,
        }
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Records which resource the call concerns. Context only; not sent.
    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    /// Adds a body parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds a query-string parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Attaches an idempotency token so retried mutations are safe to
    /// resend. Generating and honouring the token is up to the caller and
    /// the API.
    pub fn client_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.params
            .insert("ClientToken".to_string(), Value::String(token.clone()));
        self.client_token = Some(token);
        self
    }

    /// Returns a copy with `key` set to `value`, leaving `self` untouched.
    pub fn with_param(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clone().param(key, value)
    }

    /// Returns a copy without `key`.
    pub fn without_param(&self, key: &str) -> Self {
        let mut op = self.clone();
        op.params.remove(key);
        op
    }

    /// Action name.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// API version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// HTTP method.
    pub fn http_method(&self) -> Method {
        self.method
    }

    /// Body parameters.
    pub fn params(&self) -> &Payload {
        &self.params
    }

    /// Query-string parameters.
    pub fn query_params(&self) -> &Payload {
        &self.query
    }

    /// Resource id this call concerns, or `""` when unset.
    pub fn id(&self) -> &str {
        self.resource_id.as_deref().unwrap_or("")
    }

    /// Idempotency token, if one was attached.
    pub fn token(&self) -> Option<&str> {
        self.client_token.as_deref()
    }
}
