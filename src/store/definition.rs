use super::store::Store;
use crate::dispatch::Args;
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Handler run when a store receives an action.
pub type ActionHandler = Arc<dyn Fn(&Store, Args<'_>) -> Result<()> + Send + Sync>;

/// A plain method installed on a store.
pub type Method = Arc<dyn Fn(&Store, Args<'_>) -> Result<Value> + Send + Sync>;

pub(crate) type InitHook = Box<dyn FnOnce(&Store) -> Result<()> + Send>;

/// Declares what a store does: the actions it handles, the methods it
/// exposes and an optional hook run once it is built.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use unicycle::{Dispatcher, StoreDefinition};
///
/// let definition = StoreDefinition::named("counter")
///     .init(|store| store.set(json!({ "count": 0 })))
///     .action("increment", |store, args| {
///         let count = store.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
///         store.set(json!({ "count": count + args.i64(0)? }))
///     })
///     .method("count", |store, _| Ok(store.get("count").unwrap_or_default()));
///
/// let dispatcher = Dispatcher::new();
/// let counter = dispatcher.create_store(definition).unwrap();
///
/// dispatcher.exec("increment", &[json!(2)]).unwrap();
/// assert_eq!(counter.call("count", &[]).unwrap(), json!(2));
/// ```
pub struct StoreDefinition {
    pub(crate) name: String,
    pub(crate) actions: Vec<(String, ActionHandler)>,
    pub(crate) methods: HashMap<String, Method>,
    pub(crate) init: Option<InitHook>,
}

impl StoreDefinition {
    /// Start an empty definition.
    pub fn new() -> Self {
        Self::named("store")
    }

    /// Start an empty definition with a name used in log output.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
            methods: HashMap::new(),
            init: None,
        }
    }

    /// Handle `action` with `handler`.
    ///
    /// Declaring the same action twice registers both handlers, in order.
    pub fn action<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Store, Args<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.actions.push((action.into(), Arc::new(handler)));
        self
    }

    /// Expose `method` under `name`. A later declaration replaces an earlier one.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Store, Args<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Run `hook` once, after the store's actions and methods are installed.
    pub fn init<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&Store) -> Result<()> + Send + 'static,
    {
        self.init = Some(Box::new(hook));
        self
    }

    /// Name the store will carry, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the declared actions, in declaration order.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|(action, _)| action.as_str())
    }
}

impl Default for StoreDefinition {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StoreDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreDefinition")
            .field("name", &self.name)
            .field("actions", &self.actions().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("init", &self.init.is_some())
            .finish()
    }
}
