//! Adapters between stores and the views that display them.
//!
//! The view layer owns mounting and rendering; these types only manage the
//! subscriptions a view needs while it is mounted.

mod connect;
mod single;

pub use connect::{bind_many, shallow_equal, Connected, Derive, Props, Render};
pub use single::{bind_listener, bind_single, StoreBinding, View};
