//! Service registry.
//!
//! The [`Container`] maps capabilities to providers. A provider is either a
//! ready instance or a factory; factories run at most once per binding and
//! their result is memoized for the lifetime of the binding. Factories
//! receive a [`Resolver`] so they can depend on other capabilities; the
//! resolver tracks the capabilities under construction and reports cycles
//! as [`DispatchError::CircularResolution`].
//!
//! # Example
//!
//! ```rust
//! use tinyapp_core::di::{Container, Provider};
//! use std::sync::Arc;
//!
//! struct Config {
//!     dsn: String,
//! }
//!
//! struct Database {
//!     dsn: String,
//! }
//!
//! let mut container = Container::new();
//! container.register(Arc::new(Config { dsn: "postgres://localhost/db".into() }));
//! container.set(Provider::factory(|resolver| {
//!     let config = resolver.get::<Config>()?;
//!     Ok(Arc::new(Database { dsn: config.dsn.clone() }))
//! }));
//!
//! let first = container.get::<Database>().unwrap();
//! let second = container.get::<Database>().unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! ```

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::capability::{downcast, share, Capability, Shared};
use crate::error::{DispatchError, DispatchResult};

type Factory = Box<dyn Fn(&Resolver<'_>) -> DispatchResult<Shared> + Send + Sync>;

enum Binding {
    Instance(Shared),
    Factory {
        build: Factory,
        memo: Mutex<Option<Shared>>,
    },
}

struct Entry {
    capability: Capability,
    binding: Binding,
}

/// How a capability is satisfied.
pub struct Provider<T: ?Sized> {
    binding: Binding,
    _capability: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Provider<T> {
    /// A ready-made instance, returned as is on every lookup.
    #[must_use]
    pub fn instance(value: Arc<T>) -> Self {
        Self {
            binding: Binding::Instance(share(value)),
            _capability: PhantomData,
        }
    }

    /// A factory invoked on first lookup; its result is memoized.
    #[must_use]
    pub fn factory<F>(build: F) -> Self
    where
        F: Fn(&Resolver<'_>) -> DispatchResult<Arc<T>> + Send + Sync + 'static,
    {
        Self {
            binding: Binding::Factory {
                build: Box::new(move |resolver: &Resolver<'_>| build(resolver).map(share)),
                memo: Mutex::new(None),
            },
            _capability: PhantomData,
        }
    }

    /// Satisfies `T` by resolving `U` through the registry and converting it.
    ///
    /// Typically binds a trait object to a concrete service, so both
    /// capabilities share one instance.
    ///
    /// ```rust
    /// use tinyapp_core::di::{Container, Provider};
    /// use std::sync::Arc;
    ///
    /// trait Clock: Send + Sync {}
    /// struct SystemClock;
    /// impl Clock for SystemClock {}
    ///
    /// let mut container = Container::new();
    /// container.set(Provider::factory(|_| Ok(Arc::new(SystemClock))));
    /// container.set(Provider::<dyn Clock>::alias(|clock: Arc<SystemClock>| clock as Arc<dyn Clock>));
    ///
    /// assert!(container.get::<dyn Clock>().is_ok());
    /// ```
    #[must_use]
    pub fn alias<U>(convert: fn(Arc<U>) -> Arc<T>) -> Self
    where
        U: ?Sized + Send + Sync + 'static,
    {
        Self::factory(move |resolver| resolver.get::<U>().map(convert))
    }
}

impl<T: ?Sized> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.binding {
            Binding::Instance(_) => "instance",
            Binding::Factory { .. } => "factory",
        };
        f.debug_struct("Provider").field("kind", &kind).finish()
    }
}

/// The service registry.
///
/// Bindings are registered at setup time through `&mut self`; lookups take
/// `&self` and may run concurrently.
///
/// # Thread Safety
///
/// The container is `Send + Sync`. Memoization holds a per-binding lock while
/// the factory runs, so two threads resolving the same capability build it
/// once. Two threads resolving opposite ends of a dependency cycle at the
/// same moment can block each other; a single thread reports the cycle.
#[derive(Default)]
pub struct Container {
    entries: HashMap<TypeId, Entry>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Binds a provider, replacing any previous binding and its memoized
    /// instance.
    pub fn set<T: ?Sized + Send + Sync + 'static>(&mut self, provider: Provider<T>) -> &mut Self {
        let capability = Capability::of::<T>();
        let replaced = self
            .entries
            .insert(
                capability.id(),
                Entry {
                    capability,
                    binding: provider.binding,
                },
            )
            .is_some();
        debug!(capability = capability.name(), replaced, "capability bound");
        self
    }

    /// Binds a ready-made instance.
    ///
    /// ```rust
    /// use tinyapp_core::di::Container;
    /// use std::sync::Arc;
    ///
    /// struct MyService;
    ///
    /// let mut container = Container::new();
    /// container.register(Arc::new(MyService));
    /// assert!(container.contains::<MyService>());
    /// ```
    pub fn register<T: ?Sized + Send + Sync + 'static>(&mut self, service: Arc<T>) -> &mut Self {
        self.set(Provider::instance(service))
    }

    /// Binds a memoized factory.
    pub fn factory<T, F>(&mut self, build: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Resolver<'_>) -> DispatchResult<Arc<T>> + Send + Sync + 'static,
    {
        self.set(Provider::factory(build))
    }

    /// Binds `T` as an alias of `U`.
    pub fn alias<T, U>(&mut self, convert: fn(Arc<U>) -> Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        U: ?Sized + Send + Sync + 'static,
    {
        self.set(Provider::<T>::alias(convert))
    }

    /// Resolves a capability.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnresolvedCapability`] when nothing is bound,
    /// [`DispatchError::CircularResolution`] on dependency cycles, and any
    /// error raised by a factory.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DispatchResult<Arc<T>> {
        Resolver::new(self).get::<T>()
    }

    /// Resolves a capability, discarding the error.
    #[must_use]
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.get().ok()
    }

    /// Resolves a capability in erased form.
    pub fn get_shared(&self, capability: Capability) -> DispatchResult<Shared> {
        Resolver::new(self).resolve(capability)
    }

    /// Checks if a capability is bound.
    #[must_use]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Checks if a capability is bound.
    #[must_use]
    pub fn contains_capability(&self, capability: Capability) -> bool {
        self.entries.contains_key(&capability.id())
    }

    /// Removes a binding. Returns true if one existed.
    pub fn remove<T: ?Sized + 'static>(&mut self) -> bool {
        self.entries.remove(&TypeId::of::<T>()).is_some()
    }

    /// Bound capabilities, in no particular order.
    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.entries.values().map(|entry| entry.capability)
    }

    /// Returns the number of bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("service_count", &self.entries.len())
            .finish()
    }
}

/// Resolution handle passed to factories.
///
/// Tracks the chain of capabilities being built so that cycles fail fast.
pub struct Resolver<'c> {
    container: &'c Container,
    chain: RefCell<Vec<Capability>>,
}

impl<'c> Resolver<'c> {
    fn new(container: &'c Container) -> Self {
        Self {
            container,
            chain: RefCell::new(Vec::new()),
        }
    }

    /// The registry being resolved from.
    #[must_use]
    pub fn container(&self) -> &'c Container {
        self.container
    }

    /// Resolves a dependency.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> DispatchResult<Arc<T>> {
        let capability = Capability::of::<T>();
        let shared = self.resolve(capability)?;
        downcast::<T>(&shared).ok_or_else(|| DispatchError::unresolved(capability))
    }

    /// Resolves a dependency in erased form.
    pub fn resolve(&self, capability: Capability) -> DispatchResult<Shared> {
        let entry = self
            .container
            .entries
            .get(&capability.id())
            .ok_or_else(|| DispatchError::unresolved(capability))?;

        match &entry.binding {
            Binding::Instance(value) => Ok(Arc::clone(value)),
            Binding::Factory { build, memo } => {
                if self.chain.borrow().contains(&capability) {
                    let mut chain: Vec<&'static str> =
                        self.chain.borrow().iter().map(Capability::name).collect();
                    chain.push(capability.name());
                    return Err(DispatchError::CircularResolution { chain });
                }

                let mut slot = memo.lock();
                if let Some(value) = slot.as_ref() {
                    return Ok(Arc::clone(value));
                }

                self.chain.borrow_mut().push(capability);
                let built = build(self);
                self.chain.borrow_mut().pop();

                let value = built?;
                trace!(capability = capability.name(), "capability materialized");
                *slot = Some(Arc::clone(&value));
                Ok(value)
            }
        }
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("chain", &self.chain.borrow())
            .finish()
    }
}

/// A wrapper for injected services.
pub struct Inject<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Inject<T> {
    /// Creates a new `Inject` wrapper.
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    /// Returns a reference to the inner service.
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Converts into the inner `Arc`.
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: ?Sized> std::ops::Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Inject").field(&&*self.0).finish()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Inject<T> {
    /// Extracts the service from a container.
    pub fn from_container(container: &Container) -> DispatchResult<Self> {
        container.get::<T>().map(Inject)
    }
}
