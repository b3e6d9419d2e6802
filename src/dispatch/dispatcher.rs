use super::args::Args;
use crate::channel::{EventChannel, Subscription};
use crate::error::Result;
use crate::store::{Store, StoreDefinition};
use serde_json::Value;
use std::cell::RefCell;
use std::sync::OnceLock;

/// Broadcasts named actions to the store handlers registered for them.
///
/// A dispatcher is an explicit context: stores created from it receive its
/// actions and nobody else's. Cloning yields another handle to the same
/// routing table.
///
/// Code that prefers the free functions [`create_store`](crate::create_store)
/// and [`exec`](crate::exec) uses [`Dispatcher::current`], which resolves to
/// the innermost dispatcher installed with [`Dispatcher::scope`] or
/// [`Dispatcher::with`] on this thread, and otherwise to the process-wide
/// [`Dispatcher::global`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use unicycle::{Dispatcher, StoreDefinition};
///
/// let dispatcher = Dispatcher::new();
/// let store = dispatcher
///     .create_store(StoreDefinition::new().action("rename", |store, args| {
///         store.set(json!({ "name": args.str(0)? }))
///     }))
///     .unwrap();
///
/// dispatcher.exec("rename", &[json!("ada")]).unwrap();
/// assert_eq!(store.get("name"), Some(json!("ada")));
/// ```
#[derive(Clone, Default)]
pub struct Dispatcher {
    channel: EventChannel<[Value]>,
}

// Thread-local stack for scoped dispatchers
thread_local! {
    static DISPATCHER_STACK: RefCell<Vec<Dispatcher>> = const { RefCell::new(Vec::new()) };
}

impl Dispatcher {
    /// Create a dispatcher with no registered handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the process-wide dispatcher (fallback).
    pub fn global() -> Dispatcher {
        static DISPATCHER: OnceLock<Dispatcher> = OnceLock::new();
        DISPATCHER.get_or_init(Dispatcher::new).clone()
    }

    /// Get the current dispatcher (scoped or global fallback).
    pub fn current() -> Dispatcher {
        DISPATCHER_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(Self::global)
        })
    }

    /// Run a function with a fresh isolated dispatcher as the current one.
    ///
    /// Stores created inside the closure through the free functions are
    /// registered on the isolated dispatcher, which is dropped afterwards
    /// unless a store or handle keeps it alive.
    ///
    /// ```
    /// use serde_json::json;
    /// use unicycle::{create_store, exec, Dispatcher, StoreDefinition};
    ///
    /// Dispatcher::scope(|| {
    ///     let store = create_store(StoreDefinition::new().action("ping", |store, _| {
    ///         store.set(json!({ "pinged": true }))
    ///     }))
    ///     .unwrap();
    ///     exec("ping", &[]).unwrap();
    ///     assert_eq!(store.get("pinged"), Some(json!(true)));
    /// });
    /// ```
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with(Self::new(), f)
    }

    /// Run a function with `dispatcher` as the current dispatcher.
    pub fn with<F, R>(dispatcher: Dispatcher, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        DISPATCHER_STACK.with(|stack| {
            stack.borrow_mut().push(dispatcher);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        DISPATCHER_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Build a store whose action handlers listen on this dispatcher.
    pub fn create_store(&self, definition: StoreDefinition) -> Result<Store> {
        Store::new(self, definition)
    }

    /// Register a handler for `action`.
    ///
    /// Stores call this for each action in their definition; the returned
    /// [`Subscription`] deregisters the handler.
    pub fn register<F>(&self, action: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(Args<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let action = action.into();
        tracing::debug!(action = %action, "action handler registered");
        self.channel
            .add_listener(action, move |values: &[Value]| handler(Args::new(values)))
    }

    /// Broadcast `action` with positional `args` to every registered handler.
    ///
    /// All handlers run before this returns. An action nobody handles is a
    /// no-op. A handler error stops the broadcast and is returned.
    pub fn exec(&self, action: &str, args: &[Value]) -> Result<()> {
        tracing::trace!(action, args = args.len(), "exec");
        self.channel.emit(action, args)
    }

    /// Number of handlers registered for `action`.
    pub fn handler_count(&self, action: &str) -> usize {
        self.channel.listener_count(action)
    }
}

/// Create a store on the [current](Dispatcher::current) dispatcher.
pub fn create_store(definition: StoreDefinition) -> Result<Store> {
    Dispatcher::current().create_store(definition)
}

/// Broadcast an action on the [current](Dispatcher::current) dispatcher.
pub fn exec(action: &str, args: &[Value]) -> Result<()> {
    Dispatcher::current().exec(action, args)
}
