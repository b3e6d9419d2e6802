use crate::error::Result;
use crate::store::{listener, Listener, Store};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Props passed to a connected view: a flat JSON object.
pub type Props = Map<String, Value>;

/// Computes a view's derived state from its props and the stores it reads.
pub type Derive = Arc<dyn Fn(&Props) -> Result<Props> + Send + Sync>;

/// A view rendered from props.
pub trait Render: Send + Sync {
    /// Draw the view from `props`.
    fn render(&self, props: &Props) -> Result<()>;
}

/// Two prop objects are shallow-equal when they have the same keys and
/// equal values under each key.
pub fn shallow_equal(a: &Props, b: &Props) -> bool {
    a.len() == b.len() && a.iter().all(|(key, value)| b.get(key) == Some(value))
}

struct ConnectedInner {
    view: Arc<dyn Render>,
    stores: Vec<Store>,
    derive: Derive,
    props: Mutex<Props>,
    state: Mutex<Props>,
    recomputes: AtomicUsize,
}

impl ConnectedInner {
    fn recompute(&self, props: &Props) -> Result<()> {
        self.recomputes.fetch_add(1, Ordering::SeqCst);
        let state = (self.derive)(props)?;
        *self.state.lock() = state;
        Ok(())
    }

    fn merged(&self) -> Props {
        let mut merged = self.props.lock().clone();
        for (key, value) in self.state.lock().iter() {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    fn render(&self) -> Result<()> {
        let merged = self.merged();
        self.view.render(&merged)
    }

    fn on_store_change(&self) -> Result<()> {
        let props = self.props.lock().clone();
        self.recompute(&props)?;
        self.render()
    }
}

/// A view wired to several stores through a derive function.
///
/// Created by [`bind_many`]. While attached, a change in any store
/// recomputes the derived state from the current props and renders the
/// view with the props overlaid by the derived state. Dropping it detaches
/// it from every store.
pub struct Connected {
    inner: Arc<ConnectedInner>,
    listener: Listener,
}

impl Connected {
    /// Subscribe to every store.
    pub fn attach(&self) {
        for store in &self.inner.stores {
            store.add_listener(Arc::clone(&self.listener));
        }
        tracing::trace!(stores = self.inner.stores.len(), "connected view attached");
    }

    /// Unsubscribe from every store.
    pub fn detach(&self) {
        let mut removed = 0;
        for store in &self.inner.stores {
            if store.has_listener(&self.listener) {
                removed += 1;
            }
            store.remove_listener(&self.listener);
        }
        if removed > 0 {
            tracing::trace!(stores = removed, "connected view detached");
        }
    }

    /// Whether the view is subscribed to every one of its stores.
    ///
    /// Read from the stores themselves, so a listener removed elsewhere
    /// through [`Store::remove_listener`] counts as detached. Always false
    /// when bound to no stores.
    pub fn is_attached(&self) -> bool {
        !self.inner.stores.is_empty()
            && self
                .inner
                .stores
                .iter()
                .all(|store| store.has_listener(&self.listener))
    }

    /// Replace the props.
    ///
    /// Derived state is recomputed and the view rendered only when `next`
    /// is not shallow-equal to the current props. Returns whether that
    /// happened.
    pub fn receive_props(&self, next: Props) -> Result<bool> {
        let changed = !shallow_equal(&next, &self.inner.props.lock());
        if changed {
            self.inner.recompute(&next)?;
        }
        *self.inner.props.lock() = next;
        if changed {
            self.inner.render()?;
        }
        Ok(changed)
    }

    /// Render the view with the current props and derived state.
    pub fn render(&self) -> Result<()> {
        self.inner.render()
    }

    /// Props overlaid with derived state, as passed to the view.
    pub fn rendered_props(&self) -> Props {
        self.inner.merged()
    }

    /// The props last received, without derived state.
    pub fn props(&self) -> Props {
        self.inner.props.lock().clone()
    }

    /// The current derived state.
    pub fn state(&self) -> Props {
        self.inner.state.lock().clone()
    }

    /// How many times the derive function has run, including the initial run.
    pub fn recompute_count(&self) -> usize {
        self.inner.recomputes.load(Ordering::SeqCst)
    }
}

impl Drop for Connected {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Connect `view` to `stores`.
///
/// `derive` runs once now with `props` to build the initial derived state,
/// and again whenever an attached store changes or differing props arrive.
/// Call [`Connected::attach`] to start listening.
pub fn bind_many<R, F>(view: Arc<R>, stores: &[Store], derive: F, props: Props) -> Result<Connected>
where
    R: Render + 'static,
    F: Fn(&Props) -> Result<Props> + Send + Sync + 'static,
{
    let inner = Arc::new(ConnectedInner {
        view,
        stores: stores.to_vec(),
        derive: Arc::new(derive),
        props: Mutex::new(props),
        state: Mutex::new(Props::new()),
        recomputes: AtomicUsize::new(0),
    });

    let initial = inner.props.lock().clone();
    inner.recompute(&initial)?;

    let weak: Weak<ConnectedInner> = Arc::downgrade(&inner);
    let on_change = listener(move || match weak.upgrade() {
        Some(inner) => inner.on_store_change(),
        None => Ok(()),
    });

    Ok(Connected {
        inner,
        listener: on_change,
    })
}
