//! Capability identifiers and type-erased service values.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifies an abstract service in the registry.
///
/// A capability is the type (concrete or `dyn Trait`) a service is bound
/// and looked up under. Equality and hashing use the `TypeId` only.
///
/// # Example
///
/// ```
/// use tinyapp_core::Capability;
///
/// trait Mailer {}
///
/// let cap = Capability::of::<dyn Mailer>();
/// assert!(cap.name().contains("Mailer"));
/// assert_eq!(cap, Capability::of::<dyn Mailer>());
/// ```
#[derive(Clone, Copy)]
pub struct Capability {
    id: TypeId,
    name: &'static str,
}

impl Capability {
    /// Returns the capability identifying `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.name).finish()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A type-erased service: an `Arc<Arc<T>>` behind `dyn Any`.
///
/// The double `Arc` lets unsized capabilities such as `dyn Trait` travel
/// through `Any`, which only accepts sized types.
pub type Shared = Arc<dyn Any + Send + Sync>;

/// Erases a service.
pub fn share<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Shared {
    Arc::new(value)
}

/// Recovers a service erased with [`share`].
#[must_use]
pub fn downcast<T: ?Sized + Send + Sync + 'static>(shared: &Shared) -> Option<Arc<T>> {
    shared.downcast_ref::<Arc<T>>().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_capability_identity() {
        assert_eq!(Capability::of::<English>(), Capability::of::<English>());
        assert_ne!(Capability::of::<English>(), Capability::of::<dyn Greeter>());
    }

    #[test]
    fn test_share_and_downcast_trait_object() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let shared = share(Arc::clone(&greeter));

        let back = downcast::<dyn Greeter>(&shared).unwrap();
        assert_eq!(back.greet(), "hello");
        assert!(Arc::ptr_eq(&back, &greeter));
        assert!(downcast::<English>(&shared).is_none());
    }
}
