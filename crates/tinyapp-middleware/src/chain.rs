//! Per-request middleware chain.
//!
//! A [`Chain`] is assembled for every dispatched request, in a fixed order:
//!
//! 1. application middleware, in registration order;
//! 2. the route's middleware, outer groups first, route-specific last;
//! 3. the handler, wrapped last.
//!
//! Assembly appends; once [`process`](Chain::process) starts, the chain is
//! only borrowed and cannot change. Requests travel through the middleware
//! in assembly order and responses travel back in reverse.
//!
//! ```text
//! request ─▶ global A ─▶ group G ─▶ route R ─▶ handler
//!                                                 │
//! response ◀─ global A ◀─ group G ◀─ route R ◀────┘
//! ```

use std::fmt;
use std::sync::Arc;

use tinyapp_core::{Container, DispatchResult};
use tracing::trace;

use crate::context::MiddlewareContext;
use crate::middleware::{Middleware, Next};
use crate::reference::MiddlewareRef;
use crate::types::{BoxFuture, Request, Response};

/// An ordered list of middleware wrapped around a terminal handler.
///
/// # Example
///
/// ```
/// use tinyapp_core::{empty_body, Container};
/// use tinyapp_middleware::{Chain, MiddlewareContext, MiddlewareRef, RequestIdMiddleware, Response};
///
/// let container = Container::new();
/// let mut chain = Chain::new();
/// chain
///     .extend_resolved(&[MiddlewareRef::instance(RequestIdMiddleware::new())], &container)
///     .unwrap();
/// assert_eq!(chain.names(), ["request_id"]);
///
/// let request = http::Request::builder().uri("/").body(empty_body()).unwrap();
/// let mut ctx = MiddlewareContext::new();
/// let response = tokio_test::block_on(chain.process(&mut ctx, request, |_, _| {
///     Box::pin(async { Ok(Response::new(empty_body())) })
/// }))
/// .unwrap();
/// assert!(response.headers().contains_key("x-request-id"));
/// ```
#[derive(Clone, Default)]
pub struct Chain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Chain {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    pub fn push<M: Middleware>(&mut self, middleware: M) -> &mut Self {
        self.append(Arc::new(middleware))
    }

    /// Appends a shared middleware.
    pub fn append(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        trace!(
            middleware = middleware.name(),
            position = self.middlewares.len(),
            "middleware appended"
        );
        self.middlewares.push(middleware);
        self
    }

    /// Appends several middleware, keeping their order.
    pub fn extend<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        for middleware in middlewares {
            self.append(middleware);
        }
        self
    }

    /// Resolves references through the registry and appends them in order.
    ///
    /// # Errors
    ///
    /// The first registry error; nothing after it is appended.
    pub fn extend_resolved<'r, I>(
        &mut self,
        references: I,
        container: &Container,
    ) -> DispatchResult<&mut Self>
    where
        I: IntoIterator<Item = &'r MiddlewareRef>,
    {
        for reference in references {
            self.append(reference.resolve(container)?);
        }
        Ok(self)
    }

    /// Number of middleware.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// True if no middleware was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Middleware names, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Runs the request through every middleware and then `handler`.
    pub async fn process<'a, H>(
        &'a self,
        ctx: &mut MiddlewareContext,
        request: Request,
        handler: H,
    ) -> DispatchResult<Response>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, DispatchResult<Response>>
            + Send
            + 'a,
    {
        self.build(handler).run(ctx, request).await
    }

    fn build<'a, H>(&'a self, handler: H) -> Next<'a>
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, DispatchResult<Response>>
            + Send
            + 'a,
    {
        let mut next = Next::handler(handler);
        for middleware in self.middlewares.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middlewares", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::sync::Mutex;
    use tinyapp_core::{empty_body, DispatchError};

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<String>>>);

    impl Log {
        fn push(&self, entry: impl Into<String>) {
            self.0.lock().unwrap().push(entry.into());
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    struct Layer {
        name: &'static str,
        log: Log,
    }

    impl Middleware for Layer {
        fn name(&self) -> &'static str {
            self.name
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, DispatchResult<Response>> {
            Box::pin(async move {
                self.log.push(format!("{}:in", self.name));
                let response = next.run(ctx, request).await;
                self.log.push(format!("{}:out", self.name));
                response
            })
        }
    }

    fn request() -> Request {
        http::Request::builder().uri("/").body(empty_body()).unwrap()
    }

    fn layer(name: &'static str, log: &Log) -> Arc<dyn Middleware> {
        Arc::new(Layer {
            name,
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn test_onion_order() {
        let log = Log::default();
        let mut chain = Chain::new();
        chain.append(layer("A", &log)).append(layer("B", &log));
        chain.extend([layer("C", &log)]);

        let handler_log = log.clone();
        let mut ctx = MiddlewareContext::new();
        chain
            .process(&mut ctx, request(), move |_, _| {
                handler_log.push("handler");
                Box::pin(async { Ok(Response::new(empty_body())) })
            })
            .await
            .unwrap();

        assert_eq!(
            log.entries(),
            ["A:in", "B:in", "C:in", "handler", "C:out", "B:out", "A:out"]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_runs_handler() {
        let chain = Chain::new();
        assert!(chain.is_empty());

        let mut ctx = MiddlewareContext::new();
        let response = chain
            .process(&mut ctx, request(), |_, _| {
                Box::pin(async {
                    let mut response = Response::new(empty_body());
                    *response.status_mut() = StatusCode::ACCEPTED;
                    Ok(response)
                })
            })
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_error_unwinds_through_layers() {
        let log = Log::default();
        let mut chain = Chain::new();
        chain.append(layer("A", &log));

        let mut ctx = MiddlewareContext::new();
        let err = chain
            .process(&mut ctx, request(), |_, _| {
                Box::pin(async { Err(DispatchError::internal("boom")) })
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert_eq!(log.entries(), ["A:in", "A:out"]);
    }

    #[test]
    fn test_extend_resolved_stops_at_first_error() {
        struct Unbound;

        impl Middleware for Unbound {
            fn name(&self) -> &'static str {
                "unbound"
            }

            fn process<'a>(
                &'a self,
                ctx: &'a mut MiddlewareContext,
                request: Request,
                next: Next<'a>,
            ) -> BoxFuture<'a, DispatchResult<Response>> {
                Box::pin(next.run(ctx, request))
            }
        }

        let log = Log::default();
        let references = [
            MiddlewareRef::shared(layer("A", &log)),
            MiddlewareRef::registry::<Unbound>(),
            MiddlewareRef::shared(layer("B", &log)),
        ];

        let mut chain = Chain::new();
        assert!(chain.extend_resolved(&references, &Container::new()).is_err());
        assert_eq!(chain.names(), ["A"]);
    }
}
