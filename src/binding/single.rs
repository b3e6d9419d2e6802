use crate::channel::Subscription;
use crate::error::Result;
use crate::store::{listener, Listener, Store};
use parking_lot::Mutex;
use std::sync::Arc;

/// A view that can be told to redraw itself.
pub trait View: Send + Sync {
    /// Redraw from whatever state the view reads.
    fn refresh(&self) -> Result<()>;
}

/// Ties one listener to one store for the span between
/// [`attach`](StoreBinding::attach) and [`detach`](StoreBinding::detach).
///
/// Dropping the binding detaches it.
pub struct StoreBinding {
    store: Store,
    listener: Listener,
    subscription: Mutex<Option<Subscription>>,
}

impl StoreBinding {
    pub(crate) fn new(store: Store, listener: Listener) -> Self {
        Self {
            store,
            listener,
            subscription: Mutex::new(None),
        }
    }

    /// Subscribe the listener. Attaching an attached binding does nothing.
    pub fn attach(&self) {
        let mut subscription = self.subscription.lock();
        if subscription.is_none() {
            *subscription = Some(self.store.add_listener(Arc::clone(&self.listener)));
            tracing::trace!(store = %self.store.name(), "binding attached");
        }
    }

    /// Remove the subscription made by [`attach`](StoreBinding::attach).
    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.remove();
            tracing::trace!(store = %self.store.name(), "binding detached");
        }
    }

    /// Whether the listener is still subscribed to the store.
    pub fn is_attached(&self) -> bool {
        self.subscription
            .lock()
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// The store this binding listens to.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl Drop for StoreBinding {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Bind `view` so it refreshes whenever `store` changes.
///
/// The binding holds the view weakly; once the view is gone the listener
/// does nothing.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use serde_json::json;
/// use unicycle::{bind_single, Dispatcher, StoreDefinition, View};
///
/// struct Badge(AtomicUsize);
///
/// impl View for Badge {
///     fn refresh(&self) -> unicycle::Result<()> {
///         self.0.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// let store = Dispatcher::new().create_store(StoreDefinition::new()).unwrap();
/// let badge = Arc::new(Badge(AtomicUsize::new(0)));
///
/// let binding = bind_single(&store, &badge);
/// binding.attach();
/// store.set(json!({ "unread": 3 })).unwrap();
/// binding.detach();
/// store.set(json!({ "unread": 4 })).unwrap();
///
/// assert_eq!(badge.0.load(Ordering::SeqCst), 1);
/// ```
pub fn bind_single<V>(store: &Store, view: &Arc<V>) -> StoreBinding
where
    V: View + 'static,
{
    let view = Arc::downgrade(view);
    let refresh = listener(move || match view.upgrade() {
        Some(view) => view.refresh(),
        None => Ok(()),
    });
    StoreBinding::new(store.clone(), refresh)
}

/// Bind an explicit `listener` to `store` instead of a view's refresh.
pub fn bind_listener(store: &Store, listener: Listener) -> StoreBinding {
    StoreBinding::new(store.clone(), listener)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dispatcher, StoreDefinition};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    impl View for Counter {
        fn refresh(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn store() -> Store {
        Dispatcher::new()
            .create_store(StoreDefinition::named("bound"))
            .unwrap()
    }

    #[test]
    fn attach_and_detach() {
        let store = store();
        let view = Arc::new(Counter(AtomicUsize::new(0)));
        let binding = bind_single(&store, &view);

        store.notify_listeners().unwrap();
        assert_eq!(view.0.load(Ordering::SeqCst), 0);

        binding.attach();
        binding.attach();
        assert!(binding.is_attached());
        assert_eq!(store.listener_count(), 1);

        store.set(json!({ "x": 1 })).unwrap();
        assert_eq!(view.0.load(Ordering::SeqCst), 1);

        binding.detach();
        binding.detach();
        assert!(!binding.is_attached());
        store.set(json!({ "x": 2 })).unwrap();
        assert_eq!(view.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_binding_detaches() {
        let store = store();
        let view = Arc::new(Counter(AtomicUsize::new(0)));
        {
            let binding = bind_single(&store, &view);
            binding.attach();
            assert_eq!(store.listener_count(), 1);
        }
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn dropped_view_is_skipped() {
        let store = store();
        let view = Arc::new(Counter(AtomicUsize::new(0)));
        let binding = bind_single(&store, &view);
        binding.attach();
        drop(view);
        assert!(store.set(json!({ "x": 1 })).is_ok());
        assert!(binding.is_attached());
    }

    #[test]
    fn tell_uses_explicit_listener() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let binding = store.tell(listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));

        binding.attach();
        store.clear().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(binding.store().ptr_eq(&store));
    }
}
