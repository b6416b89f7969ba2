//! State carried alongside the request through the chain.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use tinyapp_core::RequestId;

/// Context that flows through the middleware chain.
///
/// Middleware may enrich it on the way in; values stored as extensions are
/// visible to every later middleware.
///
/// # Example
///
/// ```
/// use tinyapp_middleware::MiddlewareContext;
///
/// struct Tenant(&'static str);
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.set_extension(Tenant("acme"));
///
/// assert_eq!(ctx.get_extension::<Tenant>().unwrap().0, "acme");
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    request_id: RequestId,
    route_name: Option<String>,
    started_at: Instant,
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// A context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// A context with a known request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            route_name: None,
            started_at: Instant::now(),
            extensions: HashMap::new(),
        }
    }

    /// The request ID.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Name of the matched route, if it has one.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    /// Sets the matched route name.
    pub fn set_route_name(&mut self, name: impl Into<String>) {
        self.route_name = Some(name.into());
    }

    /// When the chain started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Time since the chain started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stores a typed extension, replacing one of the same type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Returns a typed extension.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// True if an extension of type `T` is stored.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Quota(u32);

    #[test]
    fn test_extensions() {
        let mut ctx = MiddlewareContext::new();
        assert!(!ctx.has_extension::<Quota>());

        ctx.set_extension(Quota(10));
        ctx.set_extension(Quota(5));
        assert_eq!(ctx.get_extension::<Quota>(), Some(&Quota(5)));

        assert_eq!(ctx.remove_extension::<Quota>(), Some(Quota(5)));
        assert!(ctx.get_extension::<Quota>().is_none());
    }

    #[test]
    fn test_request_id_and_route_name() {
        let id = RequestId::new();
        let mut ctx = MiddlewareContext::with_request_id(id);
        assert_eq!(ctx.request_id(), id);
        assert!(ctx.route_name().is_none());

        ctx.set_route_name("users.show");
        assert_eq!(ctx.route_name(), Some("users.show"));
    }

    #[test]
    fn test_elapsed() {
        let ctx = MiddlewareContext::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(ctx.elapsed() >= Duration::from_millis(5));
    }
}
