//! Tracing middleware.
//!
//! Opens a span per request and records the outcome when the response
//! comes back through the chain.

use tinyapp_core::DispatchResult;
use tracing::{info, info_span, warn, Instrument};

use crate::context::MiddlewareContext;
use crate::middleware::{Middleware, Next};
use crate::types::{BoxFuture, Request, Response};

/// Middleware that wraps the rest of the chain in a `request` span.
///
/// Span fields: `service`, `method`, `path`, `request_id`. Place it after
/// [`RequestIdMiddleware`](super::RequestIdMiddleware) so the span carries
/// the final ID.
#[derive(Debug, Clone)]
pub struct TraceMiddleware {
    service: String,
}

impl TraceMiddleware {
    /// A tracing middleware for `service`.
    #[must_use]
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// The service name recorded on each span.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl Default for TraceMiddleware {
    fn default() -> Self {
        Self::new("tinyapp")
    }
}

impl Middleware for TraceMiddleware {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, DispatchResult<Response>> {
        let span = info_span!(
            "request",
            service = %self.service,
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %ctx.request_id(),
        );

        Box::pin(
            async move {
                let result = next.run(ctx, request).await;
                let latency_ms = ctx.elapsed().as_secs_f64() * 1000.0;
                match &result {
                    Ok(response) => info!(
                        status = response.status().as_u16(),
                        latency_ms,
                        route = ctx.route_name().unwrap_or("-"),
                        "request completed"
                    ),
                    Err(err) => warn!(
                        status = err.status_code().as_u16(),
                        code = err.code(),
                        error = %err,
                        latency_ms,
                        "request failed"
                    ),
                }
                result
            }
            .instrument(span),
        )
    }
}
