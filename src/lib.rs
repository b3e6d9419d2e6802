//! # Unicycle
//!
//! Unidirectional data flow for Rust.
//!
//! Unicycle keeps application state in independent stores. A store's state is
//! immutable; it changes only in reaction to named actions broadcast through a
//! dispatcher, and every change notifies the store's listeners.
//!
//! ## Core
//!
//! - [`ImmutableMap`] - Persistent key/value state with shallow merge
//! - [`EventChannel`] - Named-event publish/subscribe with cancellable [`Subscription`]s
//! - [`Dispatcher`] - Broadcasts actions to the stores that handle them
//! - [`Store`] - State plus the handlers and methods declared in a [`StoreDefinition`]
//!
//! ## Bindings
//!
//! Views subscribe while mounted and unsubscribe when unmounted:
//! - [`bind_single`] - Refresh one view when one store changes
//! - [`bind_many`] - Recompute a view's derived props from several stores
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use unicycle::{Dispatcher, StoreDefinition};
//!
//! let dispatcher = Dispatcher::new();
//! let counter = dispatcher
//!     .create_store(
//!         StoreDefinition::named("counter")
//!             .init(|store| store.set(json!({ "count": 0 })))
//!             .action("increment", |store, args| {
//!                 let count = store.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
//!                 store.set(json!({ "count": count + args.i64(0)? }))
//!             }),
//!     )
//!     .unwrap();
//!
//! dispatcher.exec("increment", &[json!(5)]).unwrap();
//! dispatcher.exec("increment", &[json!(3)]).unwrap();
//! assert_eq!(counter.get("count"), Some(json!(8)));
//! ```

pub mod binding;
pub mod channel;
pub mod dispatch;
pub mod error;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use binding::{
    bind_listener, bind_many, bind_single, shallow_equal, Connected, Props, Render, StoreBinding,
    View,
};
pub use channel::{EventChannel, Subscription, SubscriptionGuard};
pub use dispatch::{create_store, exec, Args, Dispatcher};
pub use error::{Result, StoreError};
pub use state::ImmutableMap;
pub use store::{listener, Listener, Store, StoreDefinition};
