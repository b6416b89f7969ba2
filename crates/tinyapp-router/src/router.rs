//! High-level router API.
//!
//! [`Router`] owns the radix tree, registers routes and groups through a
//! [`Collector`], and turns a method and URI into a [`Route`] descriptor.

use std::collections::HashMap;

use http::Method;

use crate::collector::{Collector, PendingRoute};
use crate::error::RouteError;
use crate::method_router::MethodRouter;
use crate::node::{parse_path, Node, SegmentKind};
use crate::params::Params;
use crate::route::{Endpoint, Methods, Route};

/// A radix tree router over handlers `H` and middleware references `M`.
///
/// # Example
///
/// ```rust
/// use tinyapp_router::{Params, RouteStatus, Router};
/// use http::Method;
///
/// let mut router: Router<&str, ()> = Router::new();
/// router.add_route(Method::GET, "/users/{id}", "getUser", vec![], Params::new(), Some("user"));
///
/// let route = router.dispatch(&Method::GET, "http://example.com/users/7?tab=posts");
/// assert_eq!(route.status(), RouteStatus::Found);
/// assert_eq!(route.params().get("id"), Some("7"));
///
/// let route = router.dispatch(&Method::POST, "/users/7");
/// assert_eq!(route.status(), RouteStatus::MethodNotAllowed);
///
/// assert_eq!(router.url_for("user", &Params::new().with("id", "9")).unwrap(), "/users/9");
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router uses the following priority:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
///
/// Registering the same method twice on one path keeps the first entry.
#[derive(Debug, Clone)]
pub struct Router<H, M> {
    root: Node<Endpoint<H, M>>,
    names: HashMap<String, String>,
    route_count: usize,
}

impl<H: Clone, M: Clone> Default for Router<H, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone, M: Clone> Router<H, M> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            names: HashMap::new(),
            route_count: 0,
        }
    }

    /// Registers a single route.
    ///
    /// # Panics
    ///
    /// Panics if the pattern contains a wildcard that is not its last segment.
    pub fn add_route(
        &mut self,
        methods: impl Into<Methods>,
        pattern: &str,
        handler: H,
        middlewares: Vec<M>,
        params: Params,
        name: Option<&str>,
    ) -> &mut Self {
        let mut collector = Collector::new(String::new(), Vec::new(), Params::new());
        collector.add_route(methods, pattern, handler, middlewares, params, name);
        self.absorb(collector);
        self
    }

    /// Registers a group of routes sharing a prefix, middleware and params.
    ///
    /// # Panics
    ///
    /// Panics if a collected pattern contains a wildcard that is not its
    /// last segment.
    pub fn add_group<F>(
        &mut self,
        prefix: &str,
        builder: F,
        middlewares: Vec<M>,
        params: Params,
    ) -> &mut Self
    where
        F: FnOnce(&mut Collector<H, M>),
    {
        let mut collector = Collector::new(String::new(), Vec::new(), Params::new());
        collector.add_group(prefix, builder, middlewares, params);
        self.absorb(collector);
        self
    }

    fn absorb(&mut self, collector: Collector<H, M>) {
        for route in collector.into_routes() {
            self.insert(route);
        }
    }

    fn insert(&mut self, route: PendingRoute<H, M>) {
        let PendingRoute { methods, endpoint } = route;
        let pattern = endpoint.pattern().to_string();
        if let Some(name) = endpoint.name() {
            self.names
                .entry(name.to_string())
                .or_insert_with(|| pattern.clone());
        }

        let entries = match methods {
            Methods::Any => MethodRouter::new().any(endpoint),
            Methods::Only(list) => list
                .iter()
                .fold(MethodRouter::new(), |entries, method| {
                    entries.method(method, endpoint.clone())
                }),
        };
        self.root.insert(&pattern, entries);
        self.route_count += 1;
    }

    /// Resolves a method and URI into a route descriptor.
    ///
    /// `uri` may be absolute (`scheme://host[:port]/path?query`) or a bare
    /// path; only the path takes part in matching.
    #[must_use]
    pub fn dispatch(&self, method: &Method, uri: &str) -> Route<'_, H, M> {
        let Some((entries, matched)) = self.root.match_path(request_path(uri)) else {
            return Route::not_found();
        };
        match entries.get_route(method) {
            Some(endpoint) => Route::found(endpoint, &matched),
            None => Route::method_not_allowed(entries.allowed_methods()),
        }
    }

    /// Matches a path without considering the method.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<Endpoint<H, M>>, Params)> {
        self.root.match_path(path)
    }

    /// Builds the path of a named route.
    pub fn url_for(&self, name: &str, params: &Params) -> Result<String, RouteError> {
        let pattern = self
            .names
            .get(name)
            .ok_or_else(|| RouteError::UnknownRoute(name.to_string()))?;

        let mut path = String::with_capacity(pattern.len());
        for (segment, kind) in parse_path(pattern) {
            let value = match &kind {
                SegmentKind::Static => segment.as_str(),
                SegmentKind::Param(param) | SegmentKind::Wildcard(param) => {
                    params.get(param).ok_or_else(|| RouteError::MissingParam {
                        route: name.to_string(),
                        param: param.clone(),
                    })?
                }
            };
            path.push('/');
            path.push_str(value);
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}

/// Extracts the path component of an absolute or relative URI.
fn request_path(uri: &str) -> &str {
    let rest = match uri.find("://") {
        Some(index) => {
            let after_scheme = &uri[index + 3..];
            after_scheme
                .find('/')
                .map_or("/", |slash| &after_scheme[slash..])
        }
        None => uri,
    };
    rest.split(&['?', '#'][..]).next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::RouteStatus;

    fn router() -> Router<&'static str, &'static str> {
        let mut router = Router::new();
        router
            .add_route(Method::GET, "/", "home", vec![], Params::new(), Some("home"))
            .add_route(Method::GET, "/item", "getItem", vec![], Params::new(), None)
            .add_route(
                [Method::GET, Method::PUT],
                "/users/{id}",
                "user",
                vec!["route-mw"],
                Params::new().with("id", "static").with("tab", "profile"),
                Some("user.show"),
            )
            .add_route(Methods::any(), "/ping", "ping", vec![], Params::new(), None)
            .add_route(Method::GET, "/files/*path", "file", vec![], Params::new(), Some("file"));
        router
    }

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/users/1"), "/users/1");
        assert_eq!(request_path("/users/1?x=1"), "/users/1");
        assert_eq!(request_path("https://example.com:8443/a/b?x#frag"), "/a/b");
        assert_eq!(request_path("http://example.com"), "/");
        assert_eq!(request_path("/page#top"), "/page");
    }

    #[test]
    fn test_dispatch_found() {
        let router = router();
        let route = router.dispatch(&Method::GET, "http://localhost/users/42?id=7");

        assert_eq!(route.status(), RouteStatus::Found);
        assert!(route.is_found());
        assert!(route.is_allowed());
        assert_eq!(route.handler(), Some(&"user"));
        assert_eq!(route.middlewares(), ["route-mw"]);
        assert_eq!(route.name(), Some("user.show"));
    }

    #[test]
    fn test_matched_params_override_static_params() {
        let router = router();
        let route = router.dispatch(&Method::PUT, "/users/42");

        assert_eq!(route.params().get("id"), Some("42"));
        assert_eq!(route.params().get("tab"), Some("profile"));
    }

    #[test]
    fn test_dispatch_not_found() {
        let router = router();
        let route = router.dispatch(&Method::GET, "/missing");

        assert_eq!(route.status(), RouteStatus::NotFound);
        assert!(!route.is_found());
        assert!(route.handler().is_none());
        assert!(route.middlewares().is_empty());
    }

    #[test]
    fn test_dispatch_method_not_allowed() {
        let router = router();
        let route = router.dispatch(&Method::POST, "/item");

        assert_eq!(route.status(), RouteStatus::MethodNotAllowed);
        assert!(route.is_found());
        assert!(!route.is_allowed());
        assert_eq!(route.allowed_methods(), [Method::GET]);
    }

    #[test]
    fn test_any_route_matches_every_method() {
        let router = router();
        for method in [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS] {
            let route = router.dispatch(&method, "/ping");
            assert!(route.is_allowed(), "{method} should match");
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let mut router: Router<&str, ()> = Router::new();
        router
            .add_route(Method::GET, "/dup", "first", vec![], Params::new(), None)
            .add_route(Method::GET, "/dup", "second", vec![], Params::new(), None);

        assert_eq!(router.dispatch(&Method::GET, "/dup").handler(), Some(&"first"));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_duplicate_name_keeps_first_route() {
        let mut router: Router<&str, ()> = Router::new();
        router.add_route(Method::GET, "/old/{id}", "old", vec![], Params::new(), Some("item"));
        router.add_route(Method::GET, "/new/{id}", "new", vec![], Params::new(), Some("item"));

        let url = router.url_for("item", &Params::new().with("id", "7")).unwrap();
        assert_eq!(url, "/old/7");
        assert_eq!(router.dispatch(&Method::GET, &url).handler(), Some(&"old"));
    }

    #[test]
    fn test_url_for() {
        let router = router();

        assert_eq!(router.url_for("home", &Params::new()).unwrap(), "/");
        assert_eq!(
            router
                .url_for("user.show", &Params::new().with("id", "5"))
                .unwrap(),
            "/users/5"
        );
        assert_eq!(
            router
                .url_for("file", &Params::new().with("path", "a/b.txt"))
                .unwrap(),
            "/files/a/b.txt"
        );
    }

    #[test]
    fn test_url_for_errors() {
        let router = router();

        assert_eq!(
            router.url_for("nope", &Params::new()),
            Err(RouteError::UnknownRoute("nope".to_string()))
        );
        assert_eq!(
            router.url_for("user.show", &Params::new()),
            Err(RouteError::MissingParam {
                route: "user.show".to_string(),
                param: "id".to_string(),
            })
        );
    }

    #[test]
    fn test_group_routes_are_dispatched() {
        let mut router: Router<&str, &str> = Router::new();
        router.add_group(
            "/v1",
            |v1| {
                v1.add_route(Method::GET, "/status", "status", vec!["r"], Params::new(), None);
            },
            vec!["g"],
            Params::new(),
        );

        let route = router.dispatch(&Method::GET, "/v1/status");
        assert_eq!(route.handler(), Some(&"status"));
        assert_eq!(route.middlewares(), ["g", "r"]);
        assert!(router.dispatch(&Method::GET, "/status").handler().is_none());
    }
}
