use std::sync::Weak;

/// Removal side of a channel, independent of the channel's payload type.
pub(crate) trait Unsubscribe: Send + Sync {
    /// Remove registration `id` under `event`. Returns false if it was already gone.
    fn unsubscribe(&self, event: &str, id: u64) -> bool;

    fn is_registered(&self, event: &str, id: u64) -> bool;
}

/// Handle to one listener registration on one [`EventChannel`].
///
/// A subscription does not unsubscribe when dropped; call
/// [`remove`](Subscription::remove), or convert it with
/// [`into_guard`](Subscription::into_guard) to tie the registration to a scope.
///
/// [`EventChannel`]: crate::EventChannel
#[derive(Clone)]
pub struct Subscription {
    channel: Weak<dyn Unsubscribe>,
    event: String,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(channel: Weak<dyn Unsubscribe>, event: String, id: u64) -> Self {
        Self { channel, event, id }
    }

    /// Deregister the listener.
    ///
    /// Calling this more than once, or after the channel is gone, is a no-op.
    pub fn remove(&self) {
        if let Some(channel) = self.channel.upgrade() {
            if channel.unsubscribe(&self.event, self.id) {
                tracing::trace!(event = %self.event, id = self.id, "subscription removed");
            }
        }
    }

    /// Check whether the registration is still in place.
    pub fn is_active(&self) -> bool {
        self.channel
            .upgrade()
            .is_some_and(|channel| channel.is_registered(&self.event, self.id))
    }

    /// The event name this subscription listens to.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Turn this handle into a guard that removes the registration on drop.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard {
            subscription: Some(self),
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}

/// RAII guard for a [`Subscription`].
pub struct SubscriptionGuard {
    subscription: Option<Subscription>,
}

impl SubscriptionGuard {
    /// Keep the registration alive past the guard and get the plain handle back.
    pub fn release(mut self) -> Subscription {
        match self.subscription.take() {
            Some(subscription) => subscription,
            None => unreachable!("guard is consumed on release"),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.remove();
        }
    }
}
