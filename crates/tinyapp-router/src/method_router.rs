//! HTTP method-based routing.
//!
//! [`MethodRouter`] maps HTTP methods to route entries for a single path.
//! An entry registered with [`MethodRouter::any`] answers every method that
//! has no explicit entry.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to entries for a single path.
///
/// # Example
///
/// ```rust
/// use tinyapp_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .get("listUsers")
///     .post("createUser");
///
/// assert_eq!(router.get_route(&Method::GET), Some(&"listUsers"));
/// assert_eq!(router.get_route(&Method::POST), Some(&"createUser"));
/// assert_eq!(router.get_route(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    routes: SmallVec<[(Method, T); 2]>,
    any: Option<T>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            routes: SmallVec::new(),
            any: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET entry.
    #[must_use]
    pub fn get(self, entry: T) -> Self {
        self.method(&Method::GET, entry)
    }

    /// Registers a POST entry.
    #[must_use]
    pub fn post(self, entry: T) -> Self {
        self.method(&Method::POST, entry)
    }

    /// Registers a PUT entry.
    #[must_use]
    pub fn put(self, entry: T) -> Self {
        self.method(&Method::PUT, entry)
    }

    /// Registers a DELETE entry.
    #[must_use]
    pub fn delete(self, entry: T) -> Self {
        self.method(&Method::DELETE, entry)
    }

    /// Registers a PATCH entry.
    #[must_use]
    pub fn patch(self, entry: T) -> Self {
        self.method(&Method::PATCH, entry)
    }

    /// Registers a HEAD entry.
    #[must_use]
    pub fn head(self, entry: T) -> Self {
        self.method(&Method::HEAD, entry)
    }

    /// Registers an entry answering every method without an explicit entry.
    #[must_use]
    pub fn any(mut self, entry: T) -> Self {
        self.any = Some(entry);
        self
    }

    /// Registers an entry for an arbitrary method, replacing any previous one.
    #[must_use]
    pub fn method(mut self, method: &Method, entry: T) -> Self {
        match self.routes.iter_mut().find(|(m, _)| m == method) {
            Some(slot) => slot.1 = entry,
            None => self.routes.push((method.clone(), entry)),
        }
        self
    }

    /// Returns the entry for a method, falling back to the `any` entry.
    #[must_use]
    pub fn get_route(&self, method: &Method) -> Option<&T> {
        self.routes
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, entry)| entry)
            .or(self.any.as_ref())
    }

    /// Merges another method router into this one.
    ///
    /// Entries already present in this router are kept; the first
    /// registration for a method wins.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tinyapp_router::MethodRouter;
    /// use http::Method;
    ///
    /// let mut router = MethodRouter::new().get("getUsers");
    /// router.merge(MethodRouter::new().get("shadowed").post("createUser"));
    ///
    /// assert_eq!(router.get_route(&Method::GET), Some(&"getUsers"));
    /// assert_eq!(router.get_route(&Method::POST), Some(&"createUser"));
    /// ```
    pub fn merge(&mut self, other: MethodRouter<T>) {
        for (method, entry) in other.routes {
            if !self.routes.iter().any(|(m, _)| *m == method) {
                self.routes.push((method, entry));
            }
        }
        if self.any.is_none() {
            self.any = other.any;
        }
    }

    /// Returns true if any entry is registered.
    #[must_use]
    pub fn has_any_method(&self) -> bool {
        !self.routes.is_empty() || self.any.is_some()
    }

    /// Returns true if an `any` entry is registered.
    #[must_use]
    pub fn accepts_any(&self) -> bool {
        self.any.is_some()
    }

    /// Returns the explicitly registered methods, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.routes.iter().map(|(m, _)| m.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_router_new() {
        let router: MethodRouter<&str> = MethodRouter::new();
        assert!(!router.has_any_method());
    }

    #[test]
    fn test_method_router_verbs() {
        let router = MethodRouter::new()
            .get("get")
            .post("post")
            .put("put")
            .delete("delete")
            .patch("patch")
            .head("head");

        assert_eq!(router.get_route(&Method::GET), Some(&"get"));
        assert_eq!(router.get_route(&Method::POST), Some(&"post"));
        assert_eq!(router.get_route(&Method::PUT), Some(&"put"));
        assert_eq!(router.get_route(&Method::DELETE), Some(&"delete"));
        assert_eq!(router.get_route(&Method::PATCH), Some(&"patch"));
        assert_eq!(router.get_route(&Method::HEAD), Some(&"head"));
        assert_eq!(router.get_route(&Method::OPTIONS), None);
    }

    #[test]
    fn test_method_router_custom_method() {
        let propfind = Method::from_bytes(b"PROPFIND").unwrap();
        let router = MethodRouter::new().method(&propfind, "dav");
        assert_eq!(router.get_route(&propfind), Some(&"dav"));
    }

    #[test]
    fn test_method_router_any_is_fallback() {
        let router = MethodRouter::new().get("get").any("fallback");

        assert_eq!(router.get_route(&Method::GET), Some(&"get"));
        assert_eq!(router.get_route(&Method::DELETE), Some(&"fallback"));
        assert!(router.accepts_any());
    }

    #[test]
    fn test_method_router_allowed_methods() {
        let router = MethodRouter::new().get("get").post("post").delete("delete");

        let allowed = router.allowed_methods();
        assert_eq!(allowed, vec![Method::GET, Method::POST, Method::DELETE]);
    }

    #[test]
    fn test_method_router_merge_does_not_overwrite() {
        let mut router = MethodRouter::new().get("originalGet");
        router.merge(MethodRouter::new().get("newGet").post("createUser"));

        assert_eq!(router.get_route(&Method::GET), Some(&"originalGet"));
        assert_eq!(router.get_route(&Method::POST), Some(&"createUser"));
    }

    #[test]
    fn test_method_router_merge_any() {
        let mut router = MethodRouter::new().get("get");
        router.merge(MethodRouter::new().any("any"));
        assert_eq!(router.get_route(&Method::PUT), Some(&"any"));
    }
}
