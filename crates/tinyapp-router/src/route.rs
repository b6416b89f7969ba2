//! Route entries and the per-request route descriptor.

use http::Method;

use crate::params::Params;

/// The set of methods a route answers.
///
/// # Example
///
/// ```rust
/// use tinyapp_router::Methods;
/// use http::Method;
///
/// assert!(Methods::any().is_any());
/// assert_eq!(Methods::from(Method::GET), Methods::only([Method::GET]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Methods {
    /// Every method not explicitly registered on the same path.
    Any,
    /// Exactly these methods.
    Only(Vec<Method>),
}

impl Methods {
    /// Matches any method.
    #[must_use]
    pub fn any() -> Self {
        Self::Any
    }

    /// Matches the given methods.
    #[must_use]
    pub fn only(methods: impl IntoIterator<Item = Method>) -> Self {
        Self::Only(methods.into_iter().collect())
    }

    /// Returns true for [`Methods::Any`].
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }
}

impl From<Method> for Methods {
    fn from(method: Method) -> Self {
        Self::Only(vec![method])
    }
}

impl From<Vec<Method>> for Methods {
    fn from(methods: Vec<Method>) -> Self {
        Self::Only(methods)
    }
}

impl<const N: usize> From<[Method; N]> for Methods {
    fn from(methods: [Method; N]) -> Self {
        Self::only(methods)
    }
}

/// A registered route: handler, middleware, static params and name.
#[derive(Debug, Clone)]
pub struct Endpoint<H, M> {
    pattern: String,
    handler: H,
    middlewares: Vec<M>,
    params: Params,
    name: Option<String>,
}

impl<H, M> Endpoint<H, M> {
    pub(crate) fn new(
        pattern: String,
        handler: H,
        middlewares: Vec<M>,
        params: Params,
        name: Option<String>,
    ) -> Self {
        Self {
            pattern,
            handler,
            middlewares,
            params,
            name,
        }
    }

    /// Full pattern, including group prefixes.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The route's handler.
    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Group middleware (outermost group first) followed by route middleware.
    #[must_use]
    pub fn middlewares(&self) -> &[M] {
        &self.middlewares
    }

    /// Static params declared on the route and its enclosing groups.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Route name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Outcome of a route lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteStatus {
    /// Path and method matched.
    Found,
    /// Path matched but the method is not registered on it.
    MethodNotAllowed,
    /// No registered path matched.
    NotFound,
}

/// The route descriptor produced for one request.
///
/// Immutable once built by [`Router::dispatch`](crate::Router::dispatch).
#[derive(Debug)]
pub struct Route<'r, H, M> {
    status: RouteStatus,
    endpoint: Option<&'r Endpoint<H, M>>,
    params: Params,
    allowed: Vec<Method>,
}

impl<'r, H, M> Route<'r, H, M> {
    pub(crate) fn found(endpoint: &'r Endpoint<H, M>, matched: &Params) -> Self {
        let mut params = endpoint.params().clone();
        params.extend_overriding(matched);
        Self {
            status: RouteStatus::Found,
            endpoint: Some(endpoint),
            params,
            allowed: Vec::new(),
        }
    }

    pub(crate) fn method_not_allowed(allowed: Vec<Method>) -> Self {
        Self {
            status: RouteStatus::MethodNotAllowed,
            endpoint: None,
            params: Params::new(),
            allowed,
        }
    }

    pub(crate) fn not_found() -> Self {
        Self {
            status: RouteStatus::NotFound,
            endpoint: None,
            params: Params::new(),
            allowed: Vec::new(),
        }
    }

    /// The lookup outcome.
    #[must_use]
    pub fn status(&self) -> RouteStatus {
        self.status
    }

    /// True when the path exists, whatever the method.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.status != RouteStatus::NotFound
    }

    /// True when both the path and the method matched.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.status == RouteStatus::Found
    }

    /// The matched endpoint.
    #[must_use]
    pub fn endpoint(&self) -> Option<&'r Endpoint<H, M>> {
        self.endpoint
    }

    /// The matched handler.
    #[must_use]
    pub fn handler(&self) -> Option<&'r H> {
        self.endpoint.map(Endpoint::handler)
    }

    /// Static params overlaid with the params extracted from the path.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Middleware declared on the matched route and its groups.
    #[must_use]
    pub fn middlewares(&self) -> &'r [M] {
        match self.endpoint {
            Some(endpoint) => endpoint.middlewares(),
            None => &[],
        }
    }

    /// Name of the matched route.
    #[must_use]
    pub fn name(&self) -> Option<&'r str> {
        self.endpoint.and_then(Endpoint::name)
    }

    /// Methods registered on the path, for method-not-allowed outcomes.
    #[must_use]
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed
    }
}
