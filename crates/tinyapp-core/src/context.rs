//! Per-request values shared with handlers and middleware.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tinyapp_router::Params;
use uuid::Uuid;

use crate::error::{DispatchError, DispatchResult};

/// A time-ordered request identifier (UUID v7).
///
/// # Example
///
/// ```
/// use tinyapp_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().parse::<RequestId>().unwrap(), id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Request extension holding the params of the matched route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(pub Params);

impl std::ops::Deref for RouteParams {
    type Target = Params;

    fn deref(&self) -> &Params {
        &self.0
    }
}

/// The request as seen by a handler.
///
/// Provided to handlers through the request scope, so a parameter declared
/// with `Param::inject::<InvocationContext>` receives it.
///
/// # Example
///
/// ```
/// use tinyapp_core::InvocationContext;
/// use http::{Method, Uri};
///
/// let ctx = InvocationContext::new(Method::GET, Uri::from_static("/users/7?full=1"))
///     .with_header("accept", "application/json")
///     .with_route_param("id", "7");
///
/// assert_eq!(ctx.path(), "/users/7");
/// assert_eq!(ctx.query_string(), Some("full=1"));
/// assert_eq!(ctx.route_params().get("id"), Some("7"));
/// assert_eq!(ctx.header("accept"), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct InvocationContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    route_params: Params,
    route_name: Option<String>,
}

impl InvocationContext {
    /// A context with no headers, body or params.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            route_params: Params::new(),
            route_name: None,
        }
    }

    /// Builds a context from request parts and the collected body.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts, body: Bytes) -> Self {
        let route_params = parts
            .extensions
            .get::<RouteParams>()
            .map(|params| params.0.clone())
            .unwrap_or_default();

        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            body,
            route_params,
            route_name: None,
        }
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the route params.
    #[must_use]
    pub fn with_route_params(mut self, params: Params) -> Self {
        self.route_params = params;
        self
    }

    /// Adds a route param.
    #[must_use]
    pub fn with_route_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_params.insert(name, value);
        self
    }

    /// Sets the matched route name.
    #[must_use]
    pub fn with_route_name(mut self, name: Option<String>) -> Self {
        self.route_name = name;
        self
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidArgument`] when the body is not valid JSON
    /// for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> DispatchResult<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            DispatchError::invalid_argument("body", std::any::type_name::<T>(), err.to_string())
        })
    }

    /// Params of the matched route.
    #[must_use]
    pub fn route_params(&self) -> &Params {
        &self.route_params
    }

    /// Name of the matched route.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }
}
