//! Test request construction.

use bytes::Bytes;
use http::header::{self, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde::Serialize;
use tinyapp_core::{body, Request};

use crate::error::TestError;

/// Builder for requests fed straight into [`App::dispatch`].
///
/// Invalid headers or unserializable bodies do not panic while building;
/// the first such failure is reported by [`build`](Self::build).
///
/// [`App::dispatch`]: tinyapp_server::App::dispatch
///
/// # Example
///
/// ```
/// use http::Method;
/// use tinyapp_test::TestRequestBuilder;
///
/// let request = TestRequestBuilder::new(Method::GET, "/search")
///     .query("q", "rust web")
///     .query("page", "2")
///     .header("x-request-id", "abc")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.uri(), "/search?q=rust%20web&page=2");
/// assert_eq!(request.headers()["x-request-id"], "abc");
/// ```
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    uri: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Creates a builder for `method` and `uri`.
    ///
    /// The uri may already carry a query string; pairs added with
    /// [`query`](Self::query) are appended to it.
    pub fn new(method: Method, uri: impl AsRef<str>) -> Self {
        Self {
            method,
            uri: uri.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Sets a header, replacing any previous value.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        let parsed = HeaderName::try_from(name)
            .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))
            .and_then(|n| {
                HeaderValue::try_from(value.as_ref())
                    .map(|v| (n, v))
                    .map_err(|e| TestError::InvalidHeader(format!("{name}: {e}")))
            });

        match parsed {
            Ok((name, value)) => {
                self.headers.insert(name, value);
            }
            Err(err) => self.fail(err),
        }
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Appends a percent-encoded query pair.
    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a JSON body and `Content-Type: application/json`.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(Bytes::from(bytes));
                self.content_type("application/json")
            }
            Err(err) => {
                self.fail(err.into());
                self
            }
        }
    }

    /// Sets a form body and `Content-Type: application/x-www-form-urlencoded`.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(encoded) => {
                self.body = Some(Bytes::from(encoded));
                self.content_type("application/x-www-form-urlencoded")
            }
            Err(err) => {
                self.fail(TestError::RequestBuild(format!("form encoding: {err}")));
                self
            }
        }
    }

    /// Builds the request.
    pub fn build(self) -> Result<Request, TestError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let uri = with_query(self.uri, &self.query);
        let mut request = http::Request::builder()
            .method(self.method)
            .uri(uri.as_str())
            .body(body(self.body.unwrap_or_default()))
            .map_err(|e| TestError::RequestBuild(format!("invalid request '{uri}': {e}")))?;
        *request.headers_mut() = self.headers;
        Ok(request)
    }

    fn fail(&mut self, err: TestError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}

fn with_query(uri: String, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return uri;
    }

    let encoded = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = match uri.find('?') {
        None => '?',
        Some(i) if i + 1 == uri.len() => return format!("{uri}{encoded}"),
        Some(_) => '&',
    };
    format!("{uri}{separator}{encoded}")
}
