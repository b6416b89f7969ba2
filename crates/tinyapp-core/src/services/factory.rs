//! HTTP message factories.

use http::{StatusCode, Uri};

use crate::error::DispatchResult;
use crate::types::{empty_body, Request, Response};

/// Creates responses.
pub trait ResponseFactory: Send + Sync {
    /// An empty response with the given status.
    fn create_response(&self, status: StatusCode) -> Response;
}

/// Creates the request being served from the hosting environment.
pub trait ServerRequestFactory: Send + Sync {
    /// The URI of the current request.
    fn create_uri(&self) -> DispatchResult<Uri>;

    /// The current request.
    fn create_server_request(&self) -> DispatchResult<Request>;
}

/// The default [`ResponseFactory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFactory;

impl ResponseFactory for HttpFactory {
    fn create_response(&self, status: StatusCode) -> Response {
        let mut response = Response::new(empty_body());
        *response.status_mut() = status;
        response
    }
}
