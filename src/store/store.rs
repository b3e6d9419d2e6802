use super::definition::{Method, StoreDefinition};
use crate::binding::StoreBinding;
use crate::channel::{EventChannel, Subscription};
use crate::dispatch::{Args, Dispatcher};
use crate::error::{Result, StoreError};
use crate::state::ImmutableMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Callback notified after every store change.
pub type Listener = Arc<dyn Fn() -> Result<()> + Send + Sync>;

/// Wrap a closure as a [`Listener`].
///
/// Keep the returned `Arc` around to remove the listener later with
/// [`Store::remove_listener`]; listeners are identified by pointer.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

const CHANGE_EVENT: &str = "change";

fn listener_key(listener: &Listener) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

struct StoreInner {
    name: String,
    state: Mutex<ImmutableMap>,
    changes: EventChannel<()>,
    // Listener identity -> its registration on `changes`
    subscriptions: Mutex<HashMap<usize, Subscription>>,
    methods: HashMap<String, Method>,
    actions: Mutex<Vec<Subscription>>,
}

/// A unit of immutable state plus the behavior that changes it.
///
/// State only changes through [`set`](Store::set), [`set_with`](Store::set_with)
/// and [`clear`](Store::clear), which always notify listeners. Handlers and
/// methods receive the owning store as their first argument.
///
/// `Store` is a handle: clones share the same state, listeners and
/// registrations. The dispatcher keeps the store alive through its action
/// handlers, so a store keeps receiving actions after every handle is
/// dropped. Call [`detach_actions`](Store::detach_actions) to take it off
/// the dispatcher.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Build a store from `definition` and register its actions on `dispatcher`.
    ///
    /// The `init` hook runs last, once actions and methods are installed. If
    /// it fails, the error is returned and the store's handlers are removed.
    pub fn new(dispatcher: &Dispatcher, definition: StoreDefinition) -> Result<Self> {
        let StoreDefinition {
            name,
            actions,
            methods,
            init,
        } = definition;

        let store = Store {
            inner: Arc::new(StoreInner {
                name,
                state: Mutex::new(ImmutableMap::new()),
                changes: EventChannel::new(),
                subscriptions: Mutex::new(HashMap::new()),
                methods,
                actions: Mutex::new(Vec::with_capacity(actions.len())),
            }),
        };

        for (action, handler) in actions {
            // Subscriptions only hold the channel weakly, so this is not a cycle
            let owner = store.clone();
            let subscription = dispatcher.register(action, move |args| handler(&owner, args));
            store.inner.actions.lock().push(subscription);
        }

        tracing::debug!(
            store = %store.inner.name,
            actions = store.inner.actions.lock().len(),
            methods = store.inner.methods.len(),
            "store created"
        );

        if let Some(init) = init {
            if let Err(err) = init(&store) {
                store.detach_actions();
                return Err(err);
            }
        }
        Ok(store)
    }

    /// The name given in the definition.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.state.lock().get(key).cloned()
    }

    /// Snapshot of the whole current state.
    pub fn state(&self) -> ImmutableMap {
        self.inner.state.lock().clone()
    }

    /// Shallow-merge `diff` into the state, then notify listeners.
    ///
    /// `diff` must be a JSON object. If it is not, the state is left as is,
    /// nobody is notified and [`StoreError::InvalidDiff`] is returned.
    pub fn set(&self, diff: impl Into<Value>) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            let next = state.merge(diff)?;
            *state = next;
        }
        tracing::trace!(store = %self.inner.name, "state updated");
        self.notify_listeners()
    }

    /// Like [`set`](Store::set), then run `callback` once listeners were notified.
    pub fn set_with<F>(&self, diff: impl Into<Value>, callback: F) -> Result<()>
    where
        F: FnOnce() -> Result<()>,
    {
        self.set(diff)?;
        callback()
    }

    /// Reset the state to empty, then notify listeners.
    pub fn clear(&self) -> Result<()> {
        *self.inner.state.lock() = ImmutableMap::empty();
        tracing::trace!(store = %self.inner.name, "state cleared");
        self.notify_listeners()
    }

    /// Notify every listener without changing state.
    pub fn notify_listeners(&self) -> Result<()> {
        self.inner.changes.emit(CHANGE_EVENT, &())
    }

    /// Subscribe `listener` to changes.
    ///
    /// The registration is also recorded by listener identity, so
    /// [`remove_listener`](Store::remove_listener) can undo it. Adding the
    /// same `Listener` again replaces its previous registration.
    pub fn add_listener(&self, listener: Listener) -> Subscription {
        let key = listener_key(&listener);
        let callback = Arc::clone(&listener);
        let subscription = self
            .inner
            .changes
            .add_listener(CHANGE_EVENT, move |_: &()| callback());

        let mut subscriptions = self.inner.subscriptions.lock();
        // Registrations removed through their own handle leave stale entries
        subscriptions.retain(|_, existing| existing.is_active());
        if let Some(previous) = subscriptions.insert(key, subscription.clone()) {
            previous.remove();
        }
        subscription
    }

    /// Subscribe a closure to changes.
    pub fn subscribe<F>(&self, f: F) -> Subscription
    where
        F: Fn() -> Result<()> + Send + Sync + 'static,
    {
        self.add_listener(listener(f))
    }

    /// Remove the registration made for exactly this `listener`.
    ///
    /// Does nothing if the listener is not registered.
    pub fn remove_listener(&self, listener: &Listener) {
        let removed = self
            .inner
            .subscriptions
            .lock()
            .remove(&listener_key(listener));
        if let Some(subscription) = removed {
            subscription.remove();
        }
    }

    /// Number of listeners currently subscribed.
    pub fn listener_count(&self) -> usize {
        self.inner.changes.listener_count(CHANGE_EVENT)
    }

    /// Check whether exactly this `listener` is currently subscribed.
    pub fn has_listener(&self, listener: &Listener) -> bool {
        self.inner
            .subscriptions
            .lock()
            .get(&listener_key(listener))
            .is_some_and(Subscription::is_active)
    }

    /// Call a plain method declared in the definition.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        let method = self
            .inner
            .methods
            .get(method)
            .cloned()
            .ok_or_else(|| StoreError::UnknownMethod(method.to_string()))?;
        method(self, Args::new(args))
    }

    /// Check whether the definition declared `method`.
    pub fn has_method(&self, method: &str) -> bool {
        self.inner.methods.contains_key(method)
    }

    /// Bind `listener` to this store with explicit attach/detach.
    pub fn tell(&self, listener: Listener) -> StoreBinding {
        StoreBinding::new(self.clone(), listener)
    }

    /// Remove this store's action handlers from the dispatcher.
    ///
    /// The store keeps working for reads, writes and listeners but no
    /// longer receives actions. Calling this twice is a no-op.
    pub fn detach_actions(&self) {
        let actions = std::mem::take(&mut *self.inner.actions.lock());
        for subscription in &actions {
            subscription.remove();
        }
        if !actions.is_empty() {
            tracing::debug!(store = %self.inner.name, handlers = actions.len(), "action handlers removed");
        }
    }

    /// Check whether two handles point to the same store.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("state", &*self.inner.state.lock())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
