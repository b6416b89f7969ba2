//! Middleware references.

use std::fmt;
use std::sync::Arc;

use tinyapp_core::{Capability, Container, DispatchResult};

use crate::middleware::Middleware;

type ResolveFn = fn(&Container) -> DispatchResult<Arc<dyn Middleware>>;

/// A middleware as declared on the application, a group or a route.
///
/// Either an instance supplied directly or a type looked up in the
/// registry when the chain is assembled. Registry lookups are memoized by
/// the registry, so a registry-resolved middleware is built once.
///
/// # Example
///
/// ```
/// use tinyapp_core::Container;
/// use tinyapp_middleware::{MiddlewareRef, RequestIdMiddleware};
/// use std::sync::Arc;
///
/// let direct = MiddlewareRef::instance(RequestIdMiddleware::new());
/// let lazy = MiddlewareRef::registry::<RequestIdMiddleware>();
///
/// let mut container = Container::new();
/// container.register(Arc::new(RequestIdMiddleware::trust_incoming()));
///
/// assert_eq!(direct.resolve(&container).unwrap().name(), "request_id");
/// assert_eq!(lazy.resolve(&container).unwrap().name(), "request_id");
/// ```
#[derive(Clone)]
pub enum MiddlewareRef {
    /// A ready instance.
    Instance(Arc<dyn Middleware>),
    /// A middleware type resolved through the registry.
    Registry {
        /// The capability it is bound under.
        capability: Capability,
        /// Lookup and upcast.
        resolve: ResolveFn,
    },
}

impl MiddlewareRef {
    /// Wraps an instance.
    #[must_use]
    pub fn instance<M: Middleware>(middleware: M) -> Self {
        Self::Instance(Arc::new(middleware))
    }

    /// Wraps a shared instance.
    #[must_use]
    pub fn shared(middleware: Arc<dyn Middleware>) -> Self {
        Self::Instance(middleware)
    }

    /// Refers to the middleware bound under `M` in the registry.
    #[must_use]
    pub fn registry<M: Middleware>() -> Self {
        Self::Registry {
            capability: Capability::of::<M>(),
            resolve: resolve_as::<M>,
        }
    }

    /// The registry capability, for registry references.
    #[must_use]
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Self::Instance(_) => None,
            Self::Registry { capability, .. } => Some(*capability),
        }
    }

    /// Produces the middleware.
    ///
    /// # Errors
    ///
    /// Registry errors for registry references.
    pub fn resolve(&self, container: &Container) -> DispatchResult<Arc<dyn Middleware>> {
        match self {
            Self::Instance(middleware) => Ok(Arc::clone(middleware)),
            Self::Registry { resolve, .. } => resolve(container),
        }
    }
}

fn resolve_as<M: Middleware>(container: &Container) -> DispatchResult<Arc<dyn Middleware>> {
    container
        .get::<M>()
        .map(|middleware| middleware as Arc<dyn Middleware>)
}

impl<M: Middleware> From<M> for MiddlewareRef {
    fn from(middleware: M) -> Self {
        Self::instance(middleware)
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        Self::shared(middleware)
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(middleware) => {
                f.debug_tuple("Instance").field(&middleware.name()).finish()
            }
            Self::Registry { capability, .. } => {
                f.debug_tuple("Registry").field(capability).finish()
            }
        }
    }
}
