//! Handler references.
//!
//! A [`HandlerRef`] pairs a callable with the [`Signature`] the argument
//! resolver binds against. The callable is either a free function, a method
//! on a receiver supplied at registration time, or a method on a receiver
//! obtained from the registry when the handler runs.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::args::{Args, PendingArgs};
use crate::capability::{downcast, share, Capability, Shared};
use crate::error::{DispatchError, DispatchResult};
use crate::reply::{IntoReply, Reply};
use crate::resolve::{resolve_arguments, Scope};
use crate::signature::Signature;
use crate::types::BoxFuture;

type CallFn =
    Arc<dyn Fn(Option<Shared>, Args) -> BoxFuture<'static, DispatchResult<Reply>> + Send + Sync>;

/// A handler object that declares its own parameters.
///
/// # Example
///
/// ```rust
/// use tinyapp_core::{Args, BoxFuture, DispatchResult, Invocable, Param, Reply, Signature};
///
/// struct ShowUser;
///
/// impl Invocable for ShowUser {
///     fn signature() -> Signature {
///         Signature::new().param(Param::int("id"))
///     }
///
///     fn invoke(&self, args: Args) -> BoxFuture<'_, DispatchResult<Reply>> {
///         Box::pin(async move {
///             let id: i64 = args.get("id")?;
///             Ok(Reply::text(format!("user {id}")))
///         })
///     }
/// }
/// ```
pub trait Invocable: Send + Sync + 'static {
    /// Parameters the handler expects.
    fn signature() -> Signature
    where
        Self: Sized;

    /// Runs the handler with resolved arguments.
    fn invoke(&self, args: Args) -> BoxFuture<'_, DispatchResult<Reply>>;
}

/// Where a handler's receiver comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    /// No receiver.
    Static,
    /// An instance supplied at registration.
    Bound,
    /// Resolved from the registry on every call.
    Registry,
}

#[derive(Clone)]
enum Receiver {
    Static,
    Bound(Shared),
    Registry(Capability),
}

/// A reference to a handler callable.
///
/// # Example
///
/// ```rust
/// use tinyapp_core::{Container, HandlerRef, Param, PendingArgs, Reply, Scope, Signature};
///
/// let handler = HandlerRef::function(
///     Signature::new().param(Param::string("name")),
///     |args| async move {
///         let name: String = args.get("name")?;
///         Ok(format!("hello {name}"))
///     },
/// );
///
/// let container = Container::new();
/// let pending = PendingArgs::new().with("name", "ada");
/// let reply = tokio_test::block_on(handler.call(&pending, &Scope::new(&container))).unwrap();
/// assert!(matches!(reply, Reply::Text(text) if text == "hello ada"));
/// ```
#[derive(Clone)]
pub struct HandlerRef {
    name: &'static str,
    signature: Arc<Signature>,
    receiver: Receiver,
    call: CallFn,
}

impl HandlerRef {
    /// A free function.
    #[must_use]
    pub fn function<F, Fut, R>(signature: Signature, f: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<R>> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self {
            name: std::any::type_name::<F>(),
            signature: Arc::new(signature),
            receiver: Receiver::Static,
            call: Arc::new(
                move |_: Option<Shared>, args: Args| -> BoxFuture<'static, DispatchResult<Reply>> {
                    let fut = f(args);
                    Box::pin(async move { fut.await.map(IntoReply::into_reply) })
                },
            ),
        }
    }

    /// A method whose receiver `C` is resolved from the registry per call.
    #[must_use]
    pub fn method<C, F, Fut, R>(signature: Signature, f: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<R>> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::with_receiver(Receiver::Registry(Capability::of::<C>()), signature, f)
    }

    /// A method on an instance supplied now.
    #[must_use]
    pub fn bound<C, F, Fut, R>(instance: Arc<C>, signature: Signature, f: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<R>> + Send + 'static,
        R: IntoReply + 'static,
    {
        Self::with_receiver(Receiver::Bound(share(instance)), signature, f)
    }

    /// An [`Invocable`] instance.
    #[must_use]
    pub fn invocable<I: Invocable>(instance: Arc<I>) -> Self {
        Self::bound(instance, I::signature(), invoke_owned::<I>)
    }

    /// An [`Invocable`] resolved from the registry per call.
    #[must_use]
    pub fn resolve<I: Invocable>() -> Self {
        Self::method::<I, _, _, _>(I::signature(), invoke_owned::<I>)
    }

    fn with_receiver<C, F, Fut, R>(receiver: Receiver, signature: Signature, f: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<C>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DispatchResult<R>> + Send + 'static,
        R: IntoReply + 'static,
    {
        let capability = Capability::of::<C>();
        Self {
            name: capability.name(),
            signature: Arc::new(signature),
            receiver,
            call: Arc::new(
                move |receiver: Option<Shared>, args: Args| -> BoxFuture<'static, DispatchResult<Reply>> {
                    let Some(this) = receiver.as_ref().and_then(downcast::<C>) else {
                        return Box::pin(async move { Err(DispatchError::unresolved(capability)) });
                    };
                    let fut = f(this, args);
                    Box::pin(async move { fut.await.map(IntoReply::into_reply) })
                },
            ),
        }
    }

    /// Overrides the name used in logs.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// The handler name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parameters.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Receiver kind.
    #[must_use]
    pub fn receiver(&self) -> ReceiverKind {
        match self.receiver {
            Receiver::Static => ReceiverKind::Static,
            Receiver::Bound(_) => ReceiverKind::Bound,
            Receiver::Registry(_) => ReceiverKind::Registry,
        }
    }

    /// True for free functions.
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.receiver, Receiver::Static)
    }

    /// Resolves the receiver and the arguments, returning the call future.
    ///
    /// The receiver is looked up before the arguments; a registry receiver
    /// is instantiated on first use and memoized by the registry.
    ///
    /// # Errors
    ///
    /// Registry and argument resolution errors.
    pub fn prepare(
        &self,
        pending: &PendingArgs,
        scope: &Scope<'_>,
    ) -> DispatchResult<BoxFuture<'static, DispatchResult<Reply>>> {
        let receiver = match &self.receiver {
            Receiver::Static => None,
            Receiver::Bound(instance) => Some(Arc::clone(instance)),
            Receiver::Registry(capability) => Some(
                scope
                    .lookup(*capability)
                    .unwrap_or_else(|| Err(DispatchError::unresolved(*capability)))?,
            ),
        };
        let args = resolve_arguments(&self.signature, pending, scope)?;
        Ok((self.call)(receiver, args))
    }

    /// Resolves and runs the handler.
    pub async fn call(&self, pending: &PendingArgs, scope: &Scope<'_>) -> DispatchResult<Reply> {
        self.prepare(pending, scope)?.await
    }
}

fn invoke_owned<I: Invocable>(this: Arc<I>, args: Args) -> BoxFuture<'static, DispatchResult<Reply>> {
    Box::pin(async move { this.invoke(args).await })
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRef")
            .field("name", &self.name)
            .field("receiver", &self.receiver())
            .field("params", &self.signature.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Container;
    use crate::signature::Param;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Greeter {
        greeting: String,
    }

    impl Greeter {
        async fn greet(self: Arc<Self>, args: Args) -> DispatchResult<String> {
            let name: String = args.get("name")?;
            Ok(format!("{} {name}", self.greeting))
        }
    }

    struct Counter;

    impl Invocable for Counter {
        fn signature() -> Signature {
            Signature::new().param(Param::int("n").with_default(1))
        }

        fn invoke(&self, args: Args) -> BoxFuture<'_, DispatchResult<Reply>> {
            Box::pin(async move {
                let n: i64 = args.get("n")?;
                Ok((n * 2).into_reply())
            })
        }
    }

    fn text(reply: Reply) -> String {
        match reply {
            Reply::Text(text) => text,
            other => panic!("expected text, got {other:?}"),
        }
    }

    fn name_signature() -> Signature {
        Signature::new().param(Param::string("name"))
    }

    #[tokio::test]
    async fn test_function_handler() {
        let handler = HandlerRef::function(Signature::new(), |_| async { Ok("pong") });
        let container = Container::new();

        assert!(handler.is_static());
        let reply = handler
            .call(&PendingArgs::new(), &Scope::new(&container))
            .await
            .unwrap();
        assert_eq!(text(reply), "pong");
    }

    #[tokio::test]
    async fn test_bound_method() {
        let greeter = Arc::new(Greeter {
            greeting: "hi".into(),
        });
        let handler = HandlerRef::bound(greeter, name_signature(), Greeter::greet);
        let container = Container::new();

        assert_eq!(handler.receiver(), ReceiverKind::Bound);
        let pending = PendingArgs::new().with("name", "bob");
        let reply = handler
            .call(&pending, &Scope::new(&container))
            .await
            .unwrap();
        assert_eq!(text(reply), "hi bob");
    }

    #[tokio::test]
    async fn test_registry_method_instantiates_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);

        let mut container = Container::new();
        container.factory(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Greeter {
                greeting: "hello".into(),
            }))
        });

        let handler = HandlerRef::method::<Greeter, _, _, _>(name_signature(), Greeter::greet);
        assert_eq!(handler.receiver(), ReceiverKind::Registry);
        assert_eq!(builds.load(Ordering::SeqCst), 0);

        let pending = PendingArgs::new().with("name", "eve");
        for _ in 0..2 {
            let reply = handler
                .call(&pending, &Scope::new(&container))
                .await
                .unwrap();
            assert_eq!(text(reply), "hello eve");
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registry_method_without_binding() {
        let handler = HandlerRef::method::<Greeter, _, _, _>(name_signature(), Greeter::greet);
        let container = Container::new();

        let err = handler
            .call(&PendingArgs::new(), &Scope::new(&container))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnresolvedCapability { .. }));
    }

    #[tokio::test]
    async fn test_invocable_handlers() {
        let mut container = Container::new();
        container.register(Arc::new(Counter));
        let scope = Scope::new(&container);
        let pending = PendingArgs::new().with("n", "21");

        let bound = HandlerRef::invocable(Arc::new(Counter));
        assert_eq!(text(bound.call(&pending, &scope).await.unwrap()), "42");

        let resolved = HandlerRef::resolve::<Counter>();
        assert_eq!(resolved.receiver(), ReceiverKind::Registry);
        assert_eq!(
            text(resolved.call(&PendingArgs::new(), &scope).await.unwrap()),
            "2"
        );
    }

    #[tokio::test]
    async fn test_argument_error_skips_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler = HandlerRef::function(name_signature(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });
        let container = Container::new();

        let err = handler
            .prepare(&PendingArgs::new(), &Scope::new(&container))
            .err()
            .unwrap();
        assert!(matches!(err, DispatchError::UnresolvableArgument { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_named() {
        let handler =
            HandlerRef::function(Signature::new(), |_| async { Ok(()) }).named("health");
        assert_eq!(handler.name(), "health");
        assert!(format!("{handler:?}").contains("health"));
    }
}
