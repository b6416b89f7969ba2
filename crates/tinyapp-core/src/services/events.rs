//! Typed in-process event dispatcher.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

type Listener = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Dispatches events to listeners registered for their type.
///
/// Listeners run synchronously in registration order. A listener may
/// register further listeners; they are seen by the next dispatch.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tinyapp_core::services::EventBus;
///
/// struct UserCreated(u64);
///
/// let bus = EventBus::new();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
/// bus.listen(move |event: &UserCreated| {
///     counter.store(event.0 as usize, Ordering::SeqCst);
/// });
///
/// assert_eq!(bus.dispatch(&UserCreated(7)), 1);
/// assert_eq!(seen.load(Ordering::SeqCst), 7);
/// ```
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<TypeId, Vec<Listener>>>,
}

impl EventBus {
    /// A bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for events of type `E`.
    pub fn listen<E, F>(&self, listener: F)
    where
        E: Any,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let erased: Listener = Arc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                listener(event);
            }
        });
        self.listeners
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(erased);
    }

    /// Delivers `event` to its listeners. Returns how many ran.
    pub fn dispatch<E: Any>(&self, event: &E) -> usize {
        let listeners = self
            .listeners
            .read()
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();

        for listener in &listeners {
            listener(event);
        }
        trace!(
            event = std::any::type_name::<E>(),
            listeners = listeners.len(),
            "event dispatched"
        );
        listeners.len()
    }

    /// Number of listeners for `E`.
    #[must_use]
    pub fn listener_count<E: Any>(&self) -> usize {
        self.listeners
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: usize = self.listeners.read().values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("listeners", &listeners)
            .finish()
    }
}
