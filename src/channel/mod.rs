//! Named-event publish/subscribe.
//!
//! Both the action dispatcher and each store's change notifications are
//! built on [`EventChannel`].

mod channel;
mod subscription;

pub use channel::{Callback, EventChannel};
pub use subscription::{Subscription, SubscriptionGuard};
