//! The dispatch orchestrator.
//!
//! [`App`] owns the registry, the router and the application middleware,
//! and turns one request into one response:
//!
//! 1. compute the absolute URI and resolve the route
//! 2. answer 404 / 405 through a built-in handler, skipping the chain
//! 3. merge query and route params into the pending arguments
//! 4. assemble the chain: application middleware, then the route's
//! 5. run the chain around the handler, resolving its arguments
//! 6. coerce the reply into a response

use std::fmt;
use std::sync::Arc;

use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use tinyapp_config::TinyAppConfig;
use tinyapp_core::services::{
    Cache, EventBus, HttpFactory, Logger, MemoryCache, ResponseFactory, ServerRequestFactory,
    TracingLogger,
};
use tinyapp_core::{
    coerce, Args, Container, DispatchError, DispatchResult, HandlerRef, InvocationContext, Param,
    PendingArgs, Reply, Request, RequestId, Response, RouteParams, Scope, Signature,
};
use tinyapp_middleware::{
    Chain, MiddlewareContext, MiddlewareRef, RecoverMiddleware, RequestIdMiddleware,
    TraceMiddleware,
};
use tinyapp_router::{Methods, Params, RouteError, RouteStatus, Router};
use tracing::debug;

use crate::cgi::CgiRequestFactory;
use crate::emitter::{CgiEmitter, Emitter};
use crate::options::{GroupOptions, RouteCollector, RouteOptions};
use crate::uri::absolute_uri;

/// A TinyApp application.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use tinyapp_core::{empty_body, HandlerRef, Param, Signature};
/// use tinyapp_server::App;
///
/// # tokio_test::block_on(async {
/// let hello = HandlerRef::function(
///     Signature::new().param(Param::string("name")),
///     |args| async move { Ok(format!("hello {}", args.get::<String>("name")?)) },
/// );
///
/// let mut app = App::new();
/// app.get("/hello/{name}", hello);
///
/// let request = http::Request::get("/hello/ada").body(empty_body()).unwrap();
/// let response = app.dispatch(request).await.unwrap();
/// assert_eq!(response.status(), StatusCode::OK);
/// # });
/// ```
pub struct App {
    container: Arc<Container>,
    router: Router<HandlerRef, MiddlewareRef>,
    middlewares: Vec<MiddlewareRef>,
    site_path: String,
    not_found: HandlerRef,
    method_not_allowed: HandlerRef,
}

macro_rules! method_routes {
    ($($method:ident, $with:ident => $verb:expr;)*) => {
        $(
            #[doc = concat!("Registers a `", stringify!($method), "` route.")]
            pub fn $method(&mut self, pattern: &str, handler: HandlerRef) -> &mut Self {
                self.route($verb, pattern, handler, RouteOptions::default())
            }

            #[doc = concat!("Registers a `", stringify!($method), "` route with options.")]
            pub fn $with(
                &mut self,
                pattern: &str,
                handler: HandlerRef,
                options: RouteOptions,
            ) -> &mut Self {
                self.route($verb, pattern, handler, options)
            }
        )*
    };
}

impl App {
    /// An application with the default capabilities bound.
    ///
    /// | Capability | Provider |
    /// |---|---|
    /// | `dyn ResponseFactory` | [`HttpFactory`] |
    /// | `dyn ServerRequestFactory` | [`CgiRequestFactory::from_process`], built on first use |
    /// | `dyn Emitter` | [`CgiEmitter::stdout`] |
    /// | `dyn Logger` | [`TracingLogger`] |
    /// | `dyn Cache` | [`MemoryCache`] |
    /// | [`EventBus`] | empty bus |
    ///
    /// Handlers additionally see `Container` (the registry itself),
    /// [`InvocationContext`] and [`RequestId`] as request-local services.
    #[must_use]
    pub fn new() -> Self {
        let mut container = Container::new();
        container
            .register::<dyn ResponseFactory>(Arc::new(HttpFactory))
            .factory::<dyn ServerRequestFactory, _>(|_| {
                Ok(Arc::new(CgiRequestFactory::from_process()))
            })
            .register::<dyn Emitter>(Arc::new(CgiEmitter::stdout()))
            .register::<dyn Logger>(Arc::new(TracingLogger::default()))
            .register::<dyn Cache>(Arc::new(MemoryCache::new()))
            .register(Arc::new(EventBus::new()));

        Self {
            container: Arc::new(container),
            router: Router::new(),
            middlewares: Vec::new(),
            site_path: String::new(),
            not_found: fallback(StatusCode::NOT_FOUND).named("not_found"),
            method_not_allowed: fallback(StatusCode::METHOD_NOT_ALLOWED)
                .named("method_not_allowed"),
        }
    }

    /// An application set up from configuration: the configured site path
    /// and the request ID, trace and recover middleware.
    #[must_use]
    pub fn from_config(config: &TinyAppConfig) -> Self {
        let request_id = if config.app.trust_request_id {
            RequestIdMiddleware::trust_incoming()
        } else {
            RequestIdMiddleware::new()
        };

        let mut app = Self::new().with_site_path(config.app.site_path.clone());
        app.bind_middleware(request_id)
            .bind_middleware(TraceMiddleware::default())
            .bind_middleware(
                RecoverMiddleware::new().expose_internal_errors(config.app.expose_errors),
            );
        app
    }

    /// Sets the base path for routes registered from now on.
    #[must_use]
    pub fn with_site_path(mut self, site_path: impl Into<String>) -> Self {
        self.site_path = site_path.into().trim_end_matches('/').to_string();
        self
    }

    /// The base path routes are registered under.
    #[must_use]
    pub fn site_path(&self) -> &str {
        &self.site_path
    }

    /// The registry.
    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The registry, for binding or overriding capabilities.
    ///
    /// # Panics
    ///
    /// Panics when called while a dispatch is in progress. Handlers receive
    /// the registry as a shared `Arc<Container>` capability; if one keeps
    /// that `Arc` past its call, this panics for as long as the clone lives.
    pub fn container_mut(&mut self) -> &mut Container {
        match Arc::get_mut(&mut self.container) {
            Some(container) => container,
            None => panic!("the registry cannot be modified while requests are in flight"),
        }
    }

    /// The router.
    #[must_use]
    pub fn router(&self) -> &Router<HandlerRef, MiddlewareRef> {
        &self.router
    }

    /// Appends application middleware; it runs before any route middleware,
    /// in binding order.
    pub fn bind_middleware(&mut self, middleware: impl Into<MiddlewareRef>) -> &mut Self {
        self.middlewares.push(middleware.into());
        self
    }

    /// Registers a route for `methods`.
    ///
    /// # Panics
    ///
    /// Panics if the pattern contains a wildcard that is not its last segment.
    pub fn route(
        &mut self,
        methods: impl Into<Methods>,
        pattern: &str,
        handler: HandlerRef,
        options: RouteOptions,
    ) -> &mut Self {
        let RouteOptions {
            middlewares,
            params,
            name,
        } = options;
        self.router.add_group(
            &self.site_path,
            |root| {
                root.add_route(methods, pattern, handler, middlewares, params, name.as_deref());
            },
            Vec::new(),
            Params::new(),
        );
        self
    }

    method_routes! {
        get, get_with => Method::GET;
        post, post_with => Method::POST;
        put, put_with => Method::PUT;
        delete, delete_with => Method::DELETE;
        patch, patch_with => Method::PATCH;
        head, head_with => Method::HEAD;
        any, any_with => Methods::any();
    }

    /// Registers a group of routes under `prefix`.
    ///
    /// Group middleware runs after the application middleware and before
    /// that of nested groups and routes; group params are inherited.
    pub fn add_group<F>(&mut self, prefix: &str, builder: F, options: GroupOptions) -> &mut Self
    where
        F: FnOnce(&mut RouteCollector),
    {
        let GroupOptions {
            middlewares,
            params,
        } = options;
        self.router.add_group(
            &self.site_path,
            |root| {
                root.add_group(prefix, builder, middlewares, params);
            },
            Vec::new(),
            Params::new(),
        );
        self
    }

    /// The path of the route named `name`.
    ///
    /// # Errors
    ///
    /// Unknown name or a missing param.
    pub fn url_for(&self, name: &str, params: &Params) -> Result<String, RouteError> {
        self.router.url_for(name, params)
    }

    /// Dispatches one request.
    ///
    /// # Errors
    ///
    /// Failures not turned into a response by middleware: registry errors
    /// while assembling the chain, argument resolution, the handler itself,
    /// or coercion.
    pub async fn dispatch(&self, mut request: Request) -> DispatchResult<Response> {
        let uri = absolute_uri(&request);
        let method = request.method().clone();
        let route = self.router.dispatch(&method, &uri);

        let endpoint = match (route.status(), route.endpoint()) {
            (RouteStatus::Found, Some(endpoint)) => endpoint,
            (RouteStatus::MethodNotAllowed, _) => {
                let allow = route
                    .allowed_methods()
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                debug!(%method, %uri, %allow, "method not allowed");
                let reply = self
                    .execute(&self.method_not_allowed, PendingArgs::new().with("allow", allow))
                    .await?;
                return coerce(reply);
            }
            _ => {
                debug!(%method, %uri, "no route");
                let reply = self.execute(&self.not_found, PendingArgs::new()).await?;
                return coerce(reply);
            }
        };

        let mut pending = PendingArgs::from_query(request.uri().query().unwrap_or_default());
        pending.merge_route_params(route.params());
        request
            .extensions_mut()
            .insert(RouteParams(route.params().clone()));
        request.extensions_mut().insert(pending);

        let mut chain = Chain::new();
        chain
            .extend_resolved(&self.middlewares, &self.container)?
            .extend_resolved(endpoint.middlewares(), &self.container)?;

        let mut ctx = MiddlewareContext::new();
        if let Some(name) = endpoint.name() {
            ctx.set_route_name(name);
        }

        let handler = endpoint.handler();
        debug!(
            %method,
            %uri,
            handler = handler.name(),
            middleware = ?chain.names(),
            "dispatching"
        );

        let container = Arc::clone(&self.container);
        let handler = handler.clone();
        let route_name = endpoint.name().map(str::to_string);
        chain
            .process(&mut ctx, request, move |ctx, request| {
                let request_id = ctx.request_id();
                Box::pin(async move {
                    invoke(&container, &handler, request_id, route_name, request).await
                })
            })
            .await
    }

    /// Calls `handler` with arguments resolved from `defaults` and the
    /// registry.
    ///
    /// ```rust
    /// use tinyapp_core::{HandlerRef, Param, PendingArgs, Reply, Signature};
    /// use tinyapp_server::App;
    ///
    /// # tokio_test::block_on(async {
    /// let add = HandlerRef::function(
    ///     Signature::new().param(Param::int("a")).param(Param::int("b").with_default(1)),
    ///     |args| async move { Ok(args.get::<i64>("a")? + args.get::<i64>("b")?) },
    /// );
    ///
    /// let app = App::new();
    /// let reply = app.execute(&add, PendingArgs::new().with("a", "41")).await.unwrap();
    /// assert!(matches!(reply, Reply::Text(text) if text == "42"));
    /// # });
    /// ```
    ///
    /// # Errors
    ///
    /// Argument resolution or handler failures.
    pub async fn execute(&self, handler: &HandlerRef, defaults: PendingArgs) -> DispatchResult<Reply> {
        let scope = Scope::new(&self.container).with(Arc::clone(&self.container));
        handler.call(&defaults, &scope).await
    }

    /// Serves the current request of the hosting environment: reads it
    /// through `dyn ServerRequestFactory`, dispatches it and emits the
    /// response through `dyn Emitter`.
    ///
    /// # Errors
    ///
    /// Request creation, dispatch or emission failures.
    pub async fn run(&self) -> DispatchResult<()> {
        let factory = self.container.get::<dyn ServerRequestFactory>()?;
        let request = factory.create_server_request()?;
        self.run_request(request).await
    }

    /// Dispatches `request` and emits the response.
    ///
    /// # Errors
    ///
    /// Dispatch or emission failures.
    pub async fn run_request(&self, request: Request) -> DispatchResult<()> {
        let response = self.dispatch(request).await?;
        let emitter = self.container.get::<dyn Emitter>()?;
        emitter.emit(response).await
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("site_path", &self.site_path)
            .field("routes", &self.router.len())
            .field("middlewares", &self.middlewares)
            .field("capabilities", &self.container.len())
            .finish_non_exhaustive()
    }
}

/// The innermost step of the chain: resolves arguments and calls the
/// handler.
async fn invoke(
    container: &Arc<Container>,
    handler: &HandlerRef,
    request_id: RequestId,
    route_name: Option<String>,
    request: Request,
) -> DispatchResult<Response> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };

    let pending = parts
        .extensions
        .get::<PendingArgs>()
        .cloned()
        .unwrap_or_default();
    let context = InvocationContext::from_parts(&parts, body).with_route_name(route_name);

    let scope = Scope::new(container)
        .with(Arc::clone(container))
        .with(Arc::new(context))
        .with(Arc::new(request_id));
    let reply = handler.call(&pending, &scope).await?;
    coerce(reply)
}

/// The handler answering unmatched requests with `status`.
fn fallback(status: StatusCode) -> HandlerRef {
    HandlerRef::function(
        Signature::new()
            .param(Param::inject::<dyn ResponseFactory>("factory"))
            .param(Param::string("allow").with_default("")),
        move |args| reject(args, status),
    )
}

async fn reject(args: Args, status: StatusCode) -> DispatchResult<Response> {
    let factory = args.service::<dyn ResponseFactory>("factory")?;
    let allow = args.get::<String>("allow")?;

    let mut response = factory.create_response(status);
    if !allow.is_empty() {
        let value = HeaderValue::from_str(&allow).map_err(|e| DispatchError::Http(e.into()))?;
        response.headers_mut().insert(ALLOW, value);
    }
    Ok(response)
}
