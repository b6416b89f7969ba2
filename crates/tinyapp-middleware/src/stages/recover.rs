//! Error recovery middleware.
//!
//! Turns a [`DispatchError`] coming back up the chain into a JSON error
//! envelope response:
//!
//! ```json
//! {
//!   "error": { "code": "INVALID_ARGUMENT", "message": "...", "status": 400 },
//!   "request_id": "0190..."
//! }
//! ```
//!
//! Middleware outside this one see a normal response. Server-side failures
//! are reported with a generic message unless internal errors are exposed.

use http::StatusCode;
use tinyapp_core::{DispatchError, DispatchResult};
use tracing::error;

use crate::context::MiddlewareContext;
use crate::middleware::{Middleware, Next};
use crate::types::{BoxFuture, Request, Response, ResponseExt};

/// Middleware that renders errors as JSON envelopes.
#[derive(Debug, Clone, Default)]
pub struct RecoverMiddleware {
    expose_internal_errors: bool,
}

impl RecoverMiddleware {
    /// A recovery middleware hiding internal error details.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether 5xx messages are passed to the client verbatim.
    ///
    /// Enable in development only.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Renders `err` for the request in `ctx`.
    #[must_use]
    pub fn render(&self, ctx: &MiddlewareContext, err: &DispatchError) -> Response {
        let status = err.status_code();
        let request_id = ctx.request_id().to_string();
        let envelope = err.to_envelope(Some(&request_id), self.expose_internal_errors);

        match serde_json::to_vec(&envelope) {
            Ok(json) => Response::json_bytes(status, json),
            Err(_) => Response::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
            ),
        }
    }
}

impl Middleware for RecoverMiddleware {
    fn name(&self) -> &'static str {
        "recover"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, DispatchResult<Response>> {
        Box::pin(async move {
            match next.run(ctx, request).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    if err.status_code().is_server_error() {
                        error!(error = %err, code = err.code(), request_id = %ctx.request_id(), "request error");
                    }
                    Ok(self.render(ctx, &err))
                }
            }
        })
    }
}
