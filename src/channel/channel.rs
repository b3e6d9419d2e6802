use super::subscription::{Subscription, Unsubscribe};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A callback registered on an [`EventChannel`].
pub type Callback<A> = Arc<dyn Fn(&A) -> Result<()> + Send + Sync>;

struct Registration<A: ?Sized> {
    id: u64,
    callback: Callback<A>,
}

pub(crate) struct ChannelInner<A: ?Sized> {
    next_id: u64,
    // Event name -> registrations in the order they were added
    listeners: HashMap<String, Vec<Registration<A>>>,
}

impl<A: ?Sized> ChannelInner<A> {
    fn new() -> Self {
        Self {
            next_id: 0,
            listeners: HashMap::new(),
        }
    }
}

impl<A: ?Sized + 'static> Unsubscribe for Mutex<ChannelInner<A>> {
    fn unsubscribe(&self, event: &str, id: u64) -> bool {
        let mut inner = self.lock();
        let Some(registrations) = inner.listeners.get_mut(event) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            inner.listeners.remove(event);
        }
        removed
    }

    fn is_registered(&self, event: &str, id: u64) -> bool {
        self.lock()
            .listeners
            .get(event)
            .is_some_and(|registrations| registrations.iter().any(|r| r.id == id))
    }
}

/// A named-event publish/subscribe channel.
///
/// Any number of listeners can be registered per event name. [`emit`]
/// invokes the listeners registered for that name synchronously, in the
/// order they were added. The listener list is snapshotted when the emission
/// starts, so listeners added or removed by a running listener only take
/// effect from the next emission on.
///
/// Cloning a channel yields another handle to the same listener table.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
/// use unicycle::EventChannel;
///
/// let channel: EventChannel<usize> = EventChannel::new();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let sub = channel.add_listener("added", {
///     let total = total.clone();
///     move |n: &usize| {
///         total.fetch_add(*n, Ordering::SeqCst);
///         Ok(())
///     }
/// });
///
/// channel.emit("added", &5).unwrap();
/// sub.remove();
/// channel.emit("added", &5).unwrap();
///
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
///
/// [`emit`]: EventChannel::emit
pub struct EventChannel<A: ?Sized + 'static> {
    inner: Arc<Mutex<ChannelInner<A>>>,
}

impl<A: ?Sized + 'static> EventChannel<A> {
    /// Create a channel with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelInner::new())),
        }
    }

    /// Register `listener` under `event`.
    ///
    /// Registering the same closure twice creates two independent
    /// registrations; each returned [`Subscription`] removes only its own.
    pub fn add_listener<F>(&self, event: impl Into<String>, listener: F) -> Subscription
    where
        F: Fn(&A) -> Result<()> + Send + Sync + 'static,
    {
        self.add_callback(event, Arc::new(listener))
    }

    /// Register an already shared callback under `event`.
    pub fn add_callback(&self, event: impl Into<String>, callback: Callback<A>) -> Subscription {
        let event = event.into();
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .listeners
                .entry(event.clone())
                .or_default()
                .push(Registration { id, callback });
            id
        };

        let channel = Arc::downgrade(&self.inner);
        Subscription::new(channel, event, id)
    }

    /// Invoke every listener currently registered under `event`.
    ///
    /// Stops at the first listener that returns an error and returns that
    /// error; listeners after it are not invoked for this emission.
    pub fn emit(&self, event: &str, args: &A) -> Result<()> {
        let snapshot: Vec<Callback<A>> = {
            let inner = self.inner.lock();
            match inner.listeners.get(event) {
                Some(registrations) => registrations
                    .iter()
                    .map(|registration| Arc::clone(&registration.callback))
                    .collect(),
                None => Vec::new(),
            }
        };

        tracing::trace!(event, listeners = snapshot.len(), "emit");

        for callback in snapshot {
            callback(args)?;
        }
        Ok(())
    }

    /// Number of listeners registered under `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .lock()
            .listeners
            .get(event)
            .map_or(0, |registrations| registrations.len())
    }

    /// Check whether anything listens to `event`.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Drop every registration under `event`.
    ///
    /// Outstanding [`Subscription`]s for it become inactive; removing them
    /// afterwards is a no-op.
    pub fn remove_all(&self, event: &str) {
        self.inner.lock().listeners.remove(event);
    }
}

impl<A: ?Sized + 'static> Clone for EventChannel<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: ?Sized + 'static> Default for EventChannel<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> impl Fn(&()) -> Result<()> {
        let log = log.clone();
        move |_| {
            log.lock().push(tag);
            Ok(())
        }
    }

    #[test]
    fn emits_in_registration_order() {
        let channel: EventChannel<()> = EventChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        channel.add_listener("change", recorder(&log, "first"));
        channel.add_listener("change", recorder(&log, "second"));
        channel.add_listener("other", recorder(&log, "other"));

        channel.emit("change", &()).unwrap();
        assert_eq!(*log.lock(), vec!["first", "second"]);
    }

    #[test]
    fn emit_without_listeners_is_noop() {
        let channel: EventChannel<()> = EventChannel::new();
        assert!(channel.emit("nobody", &()).is_ok());
        assert!(!channel.has_listeners("nobody"));
    }

    #[test]
    fn remove_is_idempotent() {
        let channel: EventChannel<()> = EventChannel::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        let first = channel.add_listener("change", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let counter = calls.clone();
        let _second = channel.add_listener("change", move |_| {
            counter.fetch_add(10, Ordering::SeqCst);
            Ok(())
        });

        first.remove();
        first.remove();
        assert!(!first.is_active());
        assert_eq!(channel.listener_count("change"), 1);

        channel.emit("change", &()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn same_listener_registered_twice_is_independent() {
        let channel: EventChannel<()> = EventChannel::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let callback: Callback<()> = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let a = channel.add_callback("change", callback.clone());
        let _b = channel.add_callback("change", callback);
        channel.emit("change", &()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        a.remove();
        channel.emit("change", &()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn listener_added_during_emit_waits_for_next_emit() {
        let channel: EventChannel<()> = EventChannel::new();
        let late_calls = Arc::new(AtomicUsize::new(0));

        let handle = channel.clone();
        let counter = late_calls.clone();
        channel.add_listener("change", move |_| {
            let counter = counter.clone();
            handle.add_listener("change", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        channel.emit("change", &()).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        channel.emit("change", &()).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_removed_during_emit_still_runs_once() {
        let channel: EventChannel<()> = EventChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = victim.clone();
        channel.add_listener("change", move |_| {
            if let Some(sub) = slot.lock().as_ref() {
                sub.remove();
            }
            Ok(())
        });
        *victim.lock() = Some(channel.add_listener("change", recorder(&log, "victim")));

        channel.emit("change", &()).unwrap();
        channel.emit("change", &()).unwrap();
        assert_eq!(*log.lock(), vec!["victim"]);
    }

    #[test]
    fn error_stops_later_listeners() {
        let channel: EventChannel<()> = EventChannel::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        channel.add_listener("change", recorder(&log, "before"));
        channel.add_listener("change", |_| Err(StoreError::msg("boom")));
        channel.add_listener("change", recorder(&log, "after"));

        let err = channel.emit("change", &()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(*log.lock(), vec!["before"]);
    }

    #[test]
    fn remove_all_deactivates_subscriptions() {
        let channel: EventChannel<()> = EventChannel::new();
        let sub = channel.add_listener("change", |_| Ok(()));
        channel.remove_all("change");
        assert!(!sub.is_active());
        sub.remove();
        assert_eq!(channel.listener_count("change"), 0);
    }

    #[test]
    fn unsized_payloads() {
        let channel: EventChannel<str> = EventChannel::new();
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        channel.add_listener("say", move |text: &str| {
            sink.lock().push_str(text);
            Ok(())
        });
        channel.emit("say", "hello").unwrap();
        assert_eq!(*seen.lock(), "hello");
    }
}
