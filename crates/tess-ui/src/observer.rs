// SPDX-License-Identifier: MIT
//
// Observers — an ordered, thread-safe listener registry.
//
// Listeners are kept in subscription order with a monotonically
// increasing id, so unsubscribing is an id lookup. `emit` clones the list
// of `Arc` handlers under the lock and calls them after releasing it: a
// listener may subscribe, unsubscribe (itself included) or emit again
// without deadlocking, and the change takes effect from the next emit.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T: ?Sized> {
    listeners: Vec<(ListenerId, Listener<T>)>,
    next_id: u64,
}

/// Listeners for events of type `T`.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use tess_ui::observer::Observers;
///
/// let clicks = Observers::<u32>::new();
/// let total = Arc::new(AtomicU32::new(0));
/// let t = Arc::clone(&total);
/// let id = clicks.subscribe(move |n| { t.fetch_add(*n, Ordering::SeqCst); });
///
/// clicks.emit(&3);
/// assert!(clicks.unsubscribe(id));
/// clicks.emit(&3);
/// assert_eq!(total.load(Ordering::SeqCst), 3);
/// ```
pub struct Observers<T: ?Sized> {
    registry: Mutex<Registry<T>>,
}

impl<T: ?Sized> Observers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                listeners: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Add a listener after every existing one.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let mut reg = self.registry.lock();
        let id = ListenerId(reg.next_id);
        reg.next_id += 1;
        reg.listeners.push((id, Arc::new(f)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut reg = self.registry.lock();
        let before = reg.listeners.len();
        reg.listeners.retain(|(lid, _)| *lid != id);
        reg.listeners.len() != before
    }

    /// Call every listener, in subscription order.
    pub fn emit(&self, event: &T) {
        let snapshot: Vec<Listener<T>> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.lock().listeners.is_empty()
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.registry.lock().listeners.clear();
    }
}

impl<T: ?Sized> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers").field("len", &self.len()).finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
