//! Stores: immutable state, action handlers and change notifications.
//!
//! A store is built from a [`StoreDefinition`] against a
//! [`Dispatcher`](crate::Dispatcher). Its actions are registered on the
//! dispatcher, its methods become callable through [`Store::call`], and its
//! listeners are notified after every change.

mod definition;
mod store;

pub use definition::{ActionHandler, Method, StoreDefinition};
pub use store::{listener, Listener, Store};
