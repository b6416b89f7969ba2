//! Per-route and per-group registration options.

use http::Method;
use tinyapp_core::HandlerRef;
use tinyapp_middleware::MiddlewareRef;
use tinyapp_router::{Collector, Methods, Params};

/// The collector passed to [`App::add_group`](crate::App::add_group) builders.
pub type RouteCollector = Collector<HandlerRef, MiddlewareRef>;

/// Middleware, static params and name of one route.
///
/// ```rust
/// use tinyapp_middleware::RequestIdMiddleware;
/// use tinyapp_server::RouteOptions;
///
/// let options = RouteOptions::new()
///     .middleware(RequestIdMiddleware::new())
///     .param("format", "json")
///     .name("users.show");
/// assert_eq!(options.name.as_deref(), Some("users.show"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    /// Middleware run after the application and group middleware.
    pub middlewares: Vec<MiddlewareRef>,
    /// Static params; matched path params override them.
    pub params: Params,
    /// Name for URL generation.
    pub name: Option<String>,
}

impl RouteOptions {
    /// No middleware, params or name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middlewares.push(middleware.into());
        self
    }

    /// Adds a static param.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name, value);
        self
    }

    /// Names the route.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Middleware and static params shared by a group of routes.
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    /// Middleware run before the middleware of nested groups and routes.
    pub middlewares: Vec<MiddlewareRef>,
    /// Params inherited by every route of the group.
    pub params: Params,
}

impl GroupOptions {
    /// No middleware or params.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middlewares.push(middleware.into());
        self
    }

    /// Adds a static param.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name, value);
        self
    }
}

/// Method shortcuts for registering routes inside a group.
///
/// ```rust
/// use tinyapp_core::{HandlerRef, Signature};
/// use tinyapp_server::{App, GroupOptions, GroupRoutes};
///
/// let list = HandlerRef::function(Signature::new(), |_| async { Ok("users") });
///
/// let mut app = App::new();
/// app.add_group("/api", |api| {
///     api.get("/users", list);
/// }, GroupOptions::new());
/// assert_eq!(app.router().len(), 1);
/// ```
pub trait GroupRoutes {
    /// Registers a route with options.
    fn route(
        &mut self,
        methods: impl Into<Methods>,
        pattern: &str,
        handler: HandlerRef,
        options: RouteOptions,
    ) -> &mut Self;

    /// Registers a `GET` route.
    fn get(&mut self, pattern: &str, handler: HandlerRef) -> &mut Self {
        self.route(Method::GET, pattern, handler, RouteOptions::default())
    }

    /// Registers a `POST` route.
    fn post(&mut self, pattern: &str, handler: HandlerRef) -> &mut Self {
        self.route(Method::POST, pattern, handler, RouteOptions::default())
    }

    /// Registers a `PUT` route.
    fn put(&mut self, pattern: &str, handler: HandlerRef) -> &mut Self {
        self.route(Method::PUT, pattern, handler, RouteOptions::default())
    }

    /// Registers a `DELETE` route.
    fn delete(&mut self, pattern: &str, handler: HandlerRef) -> &mut Self {
        self.route(Method::DELETE, pattern, handler, RouteOptions::default())
    }

    /// Registers a `PATCH` route.
    fn patch(&mut self, pattern: &str, handler: HandlerRef) -> &mut Self {
        self.route(Method::PATCH, pattern, handler, RouteOptions::default())
    }
}

impl GroupRoutes for RouteCollector {
    fn route(
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
        self.add_route(methods, pattern, handler, middlewares, params, name.as_deref())
    }
}
