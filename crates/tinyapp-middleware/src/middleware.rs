//! The middleware trait and the `next` continuation.
//!
//! Middleware wrap the handler like layers of an onion: each receives the
//! request and a [`Next`] standing for the rest of the chain. It may change
//! the request before calling `next`, change the response after, or return
//! a response of its own without calling `next` at all.
//!
//! # Example
//!
//! ```
//! use tinyapp_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
//! use tinyapp_core::DispatchResult;
//!
//! struct PoweredBy;
//!
//! impl Middleware for PoweredBy {
//!     fn name(&self) -> &'static str {
//!         "powered_by"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, DispatchResult<Response>> {
//!         Box::pin(async move {
//!             let mut response = next.run(ctx, request).await?;
//!             response
//!                 .headers_mut()
//!                 .insert("x-powered-by", http::HeaderValue::from_static("tinyapp"));
//!             Ok(response)
//!         })
//!     }
//! }
//! ```

use std::fmt;

use tinyapp_core::DispatchResult;

use crate::context::MiddlewareContext;
use crate::types::{BoxFuture, Request, Response};

/// A unit of request/response interception.
///
/// # Invariants
///
/// - `next` is called at most once; not calling it short-circuits the chain
/// - errors from downstream propagate unless the middleware turns them into
///   a response on purpose
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, DispatchResult<Response>>;
}

/// The handler at the end of the chain; its future must not borrow the context.
type Terminal<'a> = Box<
    dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, DispatchResult<Response>>
        + Send
        + 'a,
>;

/// The remainder of the chain.
///
/// Consumed by [`run`](Self::run), so it can only be invoked once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Handler(Terminal<'a>),
}

impl<'a> Next<'a> {
    /// A continuation that runs `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// A terminal continuation that runs the handler.
    pub fn handler<F>(f: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, DispatchResult<Response>>
            + Send
            + 'a,
    {
        Self {
            inner: NextInner::Handler(Box::new(f)),
        }
    }

    /// Runs the rest of the chain.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> DispatchResult<Response> {
        match self.inner {
            NextInner::Chain { middleware, next } => {
                middleware.process(ctx, request, *next).await
            }
            NextInner::Handler(handler) => handler(ctx, request).await,
        }
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            NextInner::Chain { middleware, .. } => {
                f.debug_tuple("Next").field(&middleware.name()).finish()
            }
            NextInner::Handler(_) => f.write_str("Next(handler)"),
        }
    }
}

/// A middleware built from a closure.
///
/// Created with [`from_fn`].
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut MiddlewareContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, DispatchResult<Response>>
        + Send
        + Sync
        + 'static,
{
    /// Wraps `func` under `name`.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

/// Builds a middleware from a closure.
///
/// # Example
///
/// ```
/// use tinyapp_middleware::from_fn;
///
/// let timing = from_fn("timing", |ctx, request, next| {
///     Box::pin(async move {
///         let response = next.run(ctx, request).await;
///         tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
///         response
///     })
/// });
/// ```
pub fn from_fn<F>(name: &'static str, func: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut MiddlewareContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, DispatchResult<Response>>
        + Send
        + Sync
        + 'static,
{
    FnMiddleware::new(name, func)
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(
            &'a mut MiddlewareContext,
            Request,
            Next<'a>,
        ) -> BoxFuture<'a, DispatchResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, DispatchResult<Response>> {
        (self.func)(ctx, request, next)
    }
}

impl<F> fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use tinyapp_core::{body, empty_body, DispatchError};

    struct Visit(&'static str);

    impl Middleware for Visit {
        fn name(&self) -> &'static str {
            self.0
        }

        fn process<'a>(
            &'a self,
            ctx: &'a mut MiddlewareContext,
            request: Request,
            next: Next<'a>,
        ) -> BoxFuture<'a, DispatchResult<Response>> {
            Box::pin(async move {
                let mut seen = ctx.remove_extension::<Vec<&'static str>>().unwrap_or_default();
                seen.push(self.0);
                ctx.set_extension(seen);
                next.run(ctx, request).await
            })
        }
    }

    fn request() -> Request {
        http::Request::builder().uri("/").body(empty_body()).unwrap()
    }

    fn ok_handler<'a>() -> Next<'a> {
        Next::handler(|_, _| Box::pin(async { Ok(Response::new(body("OK"))) }))
    }

    #[tokio::test]
    async fn test_next_handler() {
        let mut ctx = MiddlewareContext::new();
        let response = ok_handler().run(&mut ctx, request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_nested_order() {
        let first = Visit("first");
        let second = Visit("second");
        let next = Next::new(&first, Next::new(&second, ok_handler()));

        let mut ctx = MiddlewareContext::new();
        next.run(&mut ctx, request()).await.unwrap();
        assert_eq!(
            ctx.get_extension::<Vec<&'static str>>().unwrap(),
            &vec!["first", "second"]
        );
    }

    #[tokio::test]
    async fn test_context_usable_after_next() {
        let stamp = from_fn("stamp", |ctx, request, next| {
            Box::pin(async move {
                let response = next.run(ctx, request).await;
                ctx.set_extension(response.as_ref().map(|r| r.status()).ok());
                response
            })
        });
        let next = Next::new(&stamp, ok_handler());

        let mut ctx = MiddlewareContext::new();
        next.run(&mut ctx, request()).await.unwrap();
        assert_eq!(
            ctx.get_extension::<Option<StatusCode>>(),
            Some(&Some(StatusCode::OK))
        );
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let visit = Visit("outer");
        let next = Next::new(
            &visit,
            Next::handler(|_, _| {
                Box::pin(async { Err(DispatchError::handler(StatusCode::CONFLICT, "taken")) })
            }),
        );

        let mut ctx = MiddlewareContext::new();
        let err = next.run(&mut ctx, request()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_fn_middleware_short_circuits() {
        let deny = from_fn("deny", |_ctx, _request, _next| {
            Box::pin(async {
                let mut response = Response::new(empty_body());
                *response.status_mut() = StatusCode::UNAUTHORIZED;
                Ok(response)
            })
        });
        assert_eq!(deny.name(), "deny");

        let next = Next::new(
            &deny,
            Next::handler(|_, _| {
                Box::pin(async { Err(DispatchError::internal("handler must not run")) })
            }),
        );

        let mut ctx = MiddlewareContext::new();
        let response = next.run(&mut ctx, request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
