//! HTTP message and future aliases shared across the workspace.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::Full;

/// Body type of requests and responses handled by the kernel.
pub type Body = Full<Bytes>;

/// Request type flowing through the middleware chain.
pub type Request = http::Request<Body>;

/// Response type produced by handlers and middleware.
pub type Response = http::Response<Body>;

/// A boxed future that can be sent across threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Creates a body from anything convertible to [`Bytes`].
pub fn body(content: impl Into<Bytes>) -> Body {
    Full::new(content.into())
}

/// Creates an empty body.
#[must_use]
pub fn empty_body() -> Body {
    Full::new(Bytes::new())
}
