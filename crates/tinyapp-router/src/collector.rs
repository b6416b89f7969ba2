//! Route collection with nested groups.
//!
//! A [`Collector`] accumulates routes under a prefix. Groups open a child
//! collector whose prefix, middleware and static params extend the parent's;
//! routes registered inside it inherit all three.

use crate::params::Params;
use crate::route::{Endpoint, Methods};

/// A route waiting to be inserted into the tree.
#[derive(Debug)]
pub(crate) struct PendingRoute<H, M> {
    pub(crate) methods: Methods,
    pub(crate) endpoint: Endpoint<H, M>,
}

/// Collects routes for a group.
///
/// # Example
///
/// ```rust
/// use tinyapp_router::{Params, Router};
/// use http::Method;
///
/// let mut router: Router<&str, &str> = Router::new();
/// router.add_group(
///     "/api",
///     |api| {
///         api.add_route(Method::GET, "/users", "listUsers", vec!["users"], Params::new(), None);
///     },
///     vec!["auth"],
///     Params::new().with("version", "1"),
/// );
///
/// let route = router.dispatch(&Method::GET, "/api/users");
/// assert_eq!(route.handler(), Some(&"listUsers"));
/// assert_eq!(route.middlewares(), ["auth", "users"]);
/// assert_eq!(route.params().get("version"), Some("1"));
/// ```
#[derive(Debug)]
pub struct Collector<H, M> {
    prefix: String,
    middlewares: Vec<M>,
    params: Params,
    routes: Vec<PendingRoute<H, M>>,
}

impl<H, M: Clone> Collector<H, M> {
    pub(crate) fn new(prefix: String, middlewares: Vec<M>, params: Params) -> Self {
        Self {
            prefix,
            middlewares,
            params,
            routes: Vec::new(),
        }
    }

    /// Prefix applied to every route of this collector.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Registers a route.
    ///
    /// The route's middleware runs after the middleware inherited from the
    /// enclosing groups; its static params override inherited ones.
    pub fn add_route(
        &mut self,
        methods: impl Into<Methods>,
        pattern: &str,
        handler: H,
        middlewares: Vec<M>,
        params: Params,
        name: Option<&str>,
    ) -> &mut Self {
        let mut chain = self.middlewares.clone();
        chain.extend(middlewares);

        let mut merged = self.params.clone();
        merged.extend_overriding(&params);

        self.routes.push(PendingRoute {
            methods: methods.into(),
            endpoint: Endpoint::new(
                join_path(&self.prefix, pattern),
                handler,
                chain,
                merged,
                name.map(str::to_string),
            ),
        });
        self
    }

    /// Registers a nested group of routes.
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
        let mut chain = self.middlewares.clone();
        chain.extend(middlewares);

        let mut merged = self.params.clone();
        merged.extend_overriding(&params);

        let mut group = Collector::new(join_path(&self.prefix, prefix), chain, merged);
        builder(&mut group);
        self.routes.extend(group.routes);
        self
    }

    /// Number of routes collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True if no route has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn into_routes(self) -> Vec<PendingRoute<H, M>> {
        self.routes
    }
}

/// Joins a prefix and a pattern with exactly one slash between them.
pub(crate) fn join_path(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let pattern = pattern.trim_start_matches('/');
    if prefix.is_empty() && pattern.is_empty() {
        return "/".to_string();
    }
    if prefix.is_empty() || prefix.starts_with('/') {
        format!("{prefix}/{pattern}")
    } else {
        format!("/{prefix}/{pattern}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("", "/users"), "/users");
        assert_eq!(join_path("/api/", "/users"), "/api/users");
        assert_eq!(join_path("api", "users"), "/api/users");
        assert_eq!(join_path("/api", "/"), "/api/");
    }

    #[test]
    fn test_nested_groups_inherit_prefix_middleware_and_params() {
        let mut root: Collector<&str, &str> = Collector::new(String::new(), vec![], Params::new());
        root.add_group(
            "/admin",
            |admin| {
                admin.add_group(
                    "/users",
                    |users| {
                        users.add_route(
                            Method::GET,
                            "/{id}",
                            "show",
                            vec!["route"],
                            Params::new().with("scope", "route"),
                            Some("admin.users.show"),
                        );
                    },
                    vec!["inner"],
                    Params::new().with("scope", "inner").with("kind", "user"),
                );
            },
            vec!["outer"],
            Params::new().with("scope", "outer").with("area", "admin"),
        );

        let routes = root.into_routes();
        assert_eq!(routes.len(), 1);

        let endpoint = &routes[0].endpoint;
        assert_eq!(endpoint.pattern(), "/admin/users/{id}");
        assert_eq!(endpoint.middlewares(), ["outer", "inner", "route"]);
        assert_eq!(endpoint.params().get("scope"), Some("route"));
        assert_eq!(endpoint.params().get("kind"), Some("user"));
        assert_eq!(endpoint.params().get("area"), Some("admin"));
        assert_eq!(endpoint.name(), Some("admin.users.show"));
    }

    #[test]
    fn test_sibling_groups_do_not_share_middleware() {
        let mut root: Collector<&str, &str> = Collector::new(String::new(), vec![], Params::new());
        root.add_group(
            "/a",
            |a| {
                a.add_route(Method::GET, "/", "a", vec![], Params::new(), None);
            },
            vec!["only-a"],
            Params::new(),
        );
        root.add_route(Method::GET, "/b", "b", vec![], Params::new(), None);

        let routes = root.into_routes();
        assert_eq!(routes[0].endpoint.middlewares(), ["only-a"]);
        assert!(routes[1].endpoint.middlewares().is_empty());
    }
}
