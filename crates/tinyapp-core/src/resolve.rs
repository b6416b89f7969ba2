//! Argument resolution.
//!
//! Binds each declared parameter of a callable, in order, by the first rule
//! that applies:
//!
//! 1. a capability parameter takes the service from the request scope or
//!    the registry, when one is bound;
//! 2. the pending value of the same name, coerced when the parameter
//!    declares a scalar type (an unbound capability takes it as is);
//! 3. the declared default;
//! 4. otherwise resolution fails with
//!    [`DispatchError::UnresolvableArgument`].

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::args::{Arg, Args, PendingArgs};
use crate::capability::{downcast, share, Capability, Shared};
use crate::di::Container;
use crate::error::{DispatchError, DispatchResult};
use crate::signature::{ParamKind, Signature};

/// The services visible to a single invocation.
///
/// Request-local values (the current request, the registry handle) are
/// consulted before the registry itself.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tinyapp_core::{Container, Scope};
///
/// struct CurrentUser(String);
///
/// let container = Container::new();
/// let scope = Scope::new(&container).with(Arc::new(CurrentUser("ada".into())));
///
/// assert_eq!(scope.get::<CurrentUser>().unwrap().0, "ada");
/// ```
pub struct Scope<'a> {
    container: &'a Container,
    locals: HashMap<TypeId, (Capability, Shared)>,
}

impl<'a> Scope<'a> {
    /// A scope backed by `container` only.
    #[must_use]
    pub fn new(container: &'a Container) -> Self {
        Self {
            container,
            locals: HashMap::new(),
        }
    }

    /// Adds a request-local service under capability `T`.
    #[must_use]
    pub fn with<T: ?Sized + Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.provide(value);
        self
    }

    /// Adds a request-local service under capability `T`.
    pub fn provide<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) {
        let capability = Capability::of::<T>();
        self.locals
            .insert(capability.id(), (capability, share(value)));
    }

    /// The backing registry.
    #[must_use]
    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// True if `capability` is provided locally or bound in the registry.
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        self.locals.contains_key(&capability.id()) || self.container.contains_capability(capability)
    }

    /// Looks a capability up.
    ///
    /// Returns `None` when nothing provides it, and the registry's error
    /// when a bound provider fails.
    #[must_use]
    pub fn lookup(&self, capability: Capability) -> Option<DispatchResult<Shared>> {
        if let Some((_, value)) = self.locals.get(&capability.id()) {
            return Some(Ok(Arc::clone(value)));
        }
        if self.container.contains_capability(capability) {
            return Some(self.container.get_shared(capability));
        }
        None
    }

    /// Resolves a service by type.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DispatchResult<Arc<T>> {
        let capability = Capability::of::<T>();
        let shared = self
            .lookup(capability)
            .unwrap_or_else(|| Err(DispatchError::unresolved(capability)))?;
        downcast::<T>(&shared).ok_or_else(|| DispatchError::unresolved(capability))
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locals: Vec<_> = self.locals.values().map(|(cap, _)| cap.name()).collect();
        f.debug_struct("Scope")
            .field("container", self.container)
            .field("locals", &locals)
            .finish()
    }
}

/// Produces one argument per declared parameter, in declaration order.
///
/// # Errors
///
/// - [`DispatchError::UnresolvableArgument`] when no rule binds a parameter
/// - [`DispatchError::InvalidArgument`] when a pending value does not coerce
/// - any registry error raised while building a capability
///
/// # Example
///
/// ```
/// use tinyapp_core::{resolve_arguments, Container, Param, PendingArgs, Scope, Signature};
///
/// let signature = Signature::new()
///     .param(Param::int("id"))
///     .param(Param::string("format").with_default("json"));
/// let pending = PendingArgs::new().with("id", "42");
/// let container = Container::new();
///
/// let args = resolve_arguments(&signature, &pending, &Scope::new(&container)).unwrap();
/// assert_eq!(args.get::<i64>("id").unwrap(), 42);
/// assert_eq!(args.get::<String>("format").unwrap(), "json");
/// ```
pub fn resolve_arguments(
    signature: &Signature,
    pending: &PendingArgs,
    scope: &Scope<'_>,
) -> DispatchResult<Args> {
    let mut args = Args::with_capacity(signature.len());

    for param in signature.params() {
        let name = param.name();

        let bound = match param.kind() {
            ParamKind::Capability(capability) => match scope.lookup(*capability) {
                Some(service) => {
                    trace!(param = name, capability = capability.name(), "bound from registry");
                    Some(Arg::Service(service?))
                }
                None => pending.get(name).map(|value| {
                    trace!(param = name, "capability unbound, bound from pending arguments");
                    Arg::Value(value.clone())
                }),
            },
            ParamKind::Scalar(ty) => match pending.get(name) {
                Some(value) => {
                    trace!(param = name, ty = ty.name(), "bound from pending arguments");
                    Some(Arg::Value(ty.coerce(name, value)?))
                }
                None => None,
            },
            ParamKind::Untyped => pending.get(name).map(|value| {
                trace!(param = name, "bound from pending arguments");
                Arg::Value(value.clone())
            }),
        };

        let arg = match bound {
            Some(arg) => arg,
            None => match param.default() {
                Some(default) => {
                    trace!(param = name, "bound from default");
                    Arg::Value(default.clone())
                }
                None => return Err(DispatchError::unresolvable(name)),
            },
        };

        args.push(name.to_string(), arg);
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Param;
    use serde_json::{json, Value};

    struct Mailer {
        from: String,
    }

    struct RequestStamp(u32);

    fn container_with_mailer() -> Container {
        let mut container = Container::new();
        container.register(Arc::new(Mailer {
            from: "noreply@example.com".into(),
        }));
        container
    }

    #[test]
    fn test_registry_binding_wins() {
        let container = container_with_mailer();
        let signature = Signature::new().param(Param::inject::<Mailer>("mailer"));
        let pending = PendingArgs::new().with("mailer", "spoofed");

        let args = resolve_arguments(&signature, &pending, &Scope::new(&container)).unwrap();
        assert_eq!(args.service::<Mailer>("mailer").unwrap().from, "noreply@example.com");
    }

    #[test]
    fn test_scope_local_shadows_registry() {
        let mut container = Container::new();
        container.register(Arc::new(RequestStamp(1)));
        let scope = Scope::new(&container).with(Arc::new(RequestStamp(2)));

        let signature = Signature::new().param(Param::inject::<RequestStamp>("stamp"));
        let args = resolve_arguments(&signature, &PendingArgs::new(), &scope).unwrap();
        assert_eq!(args.service::<RequestStamp>("stamp").unwrap().0, 2);
    }

    #[test]
    fn test_pending_value_is_coerced() {
        let container = Container::new();
        let signature = Signature::new()
            .param(Param::int("id"))
            .param(Param::bool("draft"))
            .param(Param::untyped("raw"));
        let pending = PendingArgs::new()
            .with("id", "42")
            .with("draft", "yes")
            .with("raw", "42");

        let args = resolve_arguments(&signature, &pending, &Scope::new(&container)).unwrap();
        assert_eq!(args.value("id"), Some(&json!(42)));
        assert_eq!(args.value("draft"), Some(&json!(true)));
        assert_eq!(args.value("raw"), Some(&json!("42")));
    }

    #[test]
    fn test_default_used_when_missing() {
        let container = Container::new();
        let signature = Signature::new()
            .param(Param::int("page").with_default(1))
            .param(Param::inject::<Mailer>("mailer").optional());

        let args =
            resolve_arguments(&signature, &PendingArgs::new(), &Scope::new(&container)).unwrap();
        assert_eq!(args.get::<i64>("page").unwrap(), 1);
        assert_eq!(args.value("mailer"), Some(&Value::Null));
        assert!(args.try_service::<Mailer>("mailer").is_none());
    }

    #[test]
    fn test_unresolvable_argument() {
        let container = Container::new();
        let signature = Signature::new()
            .param(Param::int("page").with_default(1))
            .param(Param::string("slug"));

        let err = resolve_arguments(&signature, &PendingArgs::new(), &Scope::new(&container))
            .unwrap_err();
        match err {
            DispatchError::UnresolvableArgument { name } => assert_eq!(name, "slug"),
            other => panic!("expected unresolvable argument, got {other:?}"),
        }
    }

    #[test]
    fn test_unbound_capability_falls_back_to_pending_value() {
        let container = Container::new();
        let signature =
            Signature::new().param(Param::inject::<Mailer>("mailer").with_default("fallback"));
        let pending = PendingArgs::new().with("mailer", "from-query");

        let args = resolve_arguments(&signature, &pending, &Scope::new(&container)).unwrap();
        assert_eq!(args.value("mailer"), Some(&json!("from-query")));
    }

    #[test]
    fn test_bound_capability_ignores_pending_value() {
        let container = container_with_mailer();
        let signature = Signature::new().param(Param::inject::<Mailer>("mailer"));
        let pending = PendingArgs::new().with("mailer", "from-query");

        let args = resolve_arguments(&signature, &pending, &Scope::new(&container)).unwrap();
        assert_eq!(args.service::<Mailer>("mailer").unwrap().from, "noreply@example.com");
        assert!(args.value("mailer").is_none());
    }

    #[test]
    fn test_unbound_capability_without_value_or_default() {
        let container = Container::new();
        let signature = Signature::new().param(Param::inject::<Mailer>("mailer"));

        let err = resolve_arguments(&signature, &PendingArgs::new(), &Scope::new(&container))
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnresolvableArgument { .. }));
    }

    #[test]
    fn test_invalid_pending_value() {
        let container = Container::new();
        let signature = Signature::new().param(Param::int("id").with_default(0));
        let pending = PendingArgs::new().with("id", "abc");

        let err = resolve_arguments(&signature, &pending, &Scope::new(&container)).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArgument { .. }));
    }

    #[test]
    fn test_registry_error_propagates() {
        let mut container = Container::new();
        container.factory::<Mailer, _>(|_| Err(DispatchError::internal("smtp down")));
        let signature = Signature::new().param(Param::inject::<Mailer>("mailer").optional());

        let err = resolve_arguments(&signature, &PendingArgs::new(), &Scope::new(&container))
            .unwrap_err();
        assert_eq!(err.to_string(), "smtp down");
    }

    #[test]
    fn test_declaration_order_preserved() {
        let container = container_with_mailer();
        let signature = Signature::new()
            .param(Param::string("b"))
            .param(Param::inject::<Mailer>("m"))
            .param(Param::string("a"));
        let pending = PendingArgs::new().with("a", "1").with("b", "2");

        let args = resolve_arguments(&signature, &pending, &Scope::new(&container)).unwrap();
        assert_eq!(args.names().collect::<Vec<_>>(), ["b", "m", "a"]);
    }

    #[test]
    fn test_scope_lookup_missing() {
        let container = Container::new();
        let scope = Scope::new(&container);
        assert!(scope.lookup(Capability::of::<Mailer>()).is_none());
        assert!(scope.get::<Mailer>().is_err());
        assert!(!scope.contains(Capability::of::<Mailer>()));
    }
}
