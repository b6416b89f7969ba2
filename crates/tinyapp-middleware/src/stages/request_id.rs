//! Request ID middleware.
//!
//! Assigns every request a [`RequestId`] (UUID v7, time-ordered) and echoes
//! it in the `x-request-id` response header so clients can quote it when
//! reporting problems.

use http::HeaderValue;
use tinyapp_core::{DispatchResult, RequestId};
use tracing::debug;

use crate::context::MiddlewareContext;
use crate::middleware::{Middleware, Next};
use crate::types::{BoxFuture, Request, Response};

/// The header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or adopts request IDs.
///
/// # Behavior
///
/// 1. If incoming IDs are trusted and the header holds a valid UUID, adopt it
/// 2. Otherwise generate a new one
/// 3. Store the ID in the [`MiddlewareContext`]
/// 4. Set the header on the response
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// A middleware that always generates a fresh ID.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A middleware that adopts a valid incoming `x-request-id`.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    fn incoming(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, DispatchResult<Response>> {
        Box::pin(async move {
            let request_id = self.incoming(&request).unwrap_or_else(RequestId::new);
            ctx.set_request_id(request_id);

            let mut response = next.run(ctx, request).await?;

            match HeaderValue::from_str(&request_id.to_string()) {
                Ok(value) => {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }
                Err(err) => debug!(error = %err, "request id is not a valid header value"),
            }
            Ok(response)
        })
    }
}
