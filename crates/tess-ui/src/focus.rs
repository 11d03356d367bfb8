// SPDX-License-Identifier: MIT
//
// Focus management — which interactive control receives Enter.
//
// A `FocusManager` keeps an ordered registry of focusable items and the
// index of the focused one. Tab order is registration order. Navigation
// wraps at both ends and skips items that currently refuse focus.
//
// The manager is shared between the input thread (Tab, Shift+Tab, Enter)
// and scene code (register on build, unregister on teardown), so every
// method takes `&self` and locks internally. The lost/gained hooks run
// under the lock so two items can never both believe they are focused.
// Activation runs after the lock is released: a button's click handler
// is free to register, unregister or load a new scene.

use std::fmt;

use parking_lot::Mutex;

// ─── Focusable ───────────────────────────────────────────────────────────────

/// Something that can hold keyboard focus.
///
/// Handles are cheap to clone and compare by identity; the manager keeps
/// its own clone of every registered item.
pub trait Focusable {
    /// Whether the item accepts focus right now.
    fn can_focus(&self) -> bool;

    /// Whether the item currently has focus.
    fn is_focused(&self) -> bool;

    /// Focus arrived.
    fn on_focus_gained(&self);

    /// Focus left.
    fn on_focus_lost(&self);

    /// The focused item was activated (Enter).
    fn on_focus_activate(&self);
}

// ─── FocusManager ────────────────────────────────────────────────────────────

struct Ring<F> {
    items: Vec<F>,
    current: Option<usize>,
}

impl<F: Focusable> Ring<F> {
    /// Move focus to `idx`, running lost before gained.
    fn focus_index(&mut self, idx: usize) {
        if self.current == Some(idx) {
            return;
        }
        if let Some(old) = self.current.take() {
            self.items[old].on_focus_lost();
        }
        self.current = Some(idx);
        self.items[idx].on_focus_gained();
    }

    /// First focusable index in `order`.
    fn first_focusable(&self, order: impl Iterator<Item = usize>) -> Option<usize> {
        order.into_iter().find(|&i| self.items[i].can_focus())
    }
}

/// Ordered focus registry with cyclic navigation.
///
/// ```
/// use tess_ui::focus::{FocusManager, Focusable};
///
/// #[derive(Clone, PartialEq)]
/// struct Item(&'static str);
/// impl Focusable for Item {
///     fn can_focus(&self) -> bool { true }
///     fn is_focused(&self) -> bool { false }
///     fn on_focus_gained(&self) {}
///     fn on_focus_lost(&self) {}
///     fn on_focus_activate(&self) {}
/// }
///
/// let focus = FocusManager::new();
/// focus.register(Item("ok"));
/// focus.register(Item("cancel"));
/// assert_eq!(focus.focused_index(), Some(0));
///
/// focus.focus_next();
/// assert_eq!(focus.focused().map(|i| i.0), Some("cancel"));
/// focus.focus_next();
/// assert_eq!(focus.focused_index(), Some(0));
/// ```
pub struct FocusManager<F> {
    ring: Mutex<Ring<F>>,
}

impl<F: Focusable + Clone + PartialEq> FocusManager<F> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ring: Mutex::new(Ring {
                items: Vec::new(),
                current: None,
            }),
        }
    }

    /// Append `item` to the tab order. Already-registered items are ignored.
    ///
    /// The first item registered into an empty manager takes focus.
    pub fn register(&self, item: F) {
        let mut ring = self.ring.lock();
        if ring.items.contains(&item) {
            return;
        }
        ring.items.push(item);
        if ring.items.len() == 1 && ring.items[0].can_focus() {
            ring.focus_index(0);
        }
    }

    /// Remove `item`. Returns whether it was registered.
    ///
    /// Removing the focused item leaves nothing focused.
    pub fn unregister(&self, item: &F) -> bool {
        let mut ring = self.ring.lock();
        let Some(idx) = ring.items.iter().position(|i| i == item) else {
            return false;
        };

        match ring.current {
            Some(cur) if cur == idx => {
                ring.items[idx].on_focus_lost();
                ring.current = None;
            }
            Some(cur) if cur > idx => ring.current = Some(cur - 1),
            _ => {}
        }
        ring.items.remove(idx);
        true
    }

    /// Focus the next focusable item, wrapping to the start.
    pub fn focus_next(&self) {
        let mut ring = self.ring.lock();
        let n = ring.items.len();
        if n == 0 {
            return;
        }
        let start = ring.current.map_or(0, |i| i + 1);
        if let Some(idx) = ring.first_focusable((0..n).map(|k| (start + k) % n)) {
            ring.focus_index(idx);
        }
    }

    /// Focus the previous focusable item, wrapping to the end.
    pub fn focus_previous(&self) {
        let mut ring = self.ring.lock();
        let n = ring.items.len();
        if n == 0 {
            return;
        }
        let start = ring.current.map_or(n - 1, |i| (i + n - 1) % n);
        if let Some(idx) = ring.first_focusable((0..n).map(|k| (start + n - k) % n)) {
            ring.focus_index(idx);
        }
    }

    /// Focus `item` directly. Returns `false` if it is not registered or
    /// refuses focus.
    pub fn set_focus(&self, item: &F) -> bool {
        let mut ring = self.ring.lock();
        let Some(idx) = ring.items.iter().position(|i| i == item) else {
            return false;
        };
        if !ring.items[idx].can_focus() {
            return false;
        }
        ring.focus_index(idx);
        true
    }

    /// Drop focus without changing the registry.
    pub fn blur(&self) {
        let mut ring = self.ring.lock();
        if let Some(old) = ring.current.take() {
            ring.items[old].on_focus_lost();
        }
    }

    /// Activate the focused item, if any.
    pub fn activate_focused(&self) {
        let target = self.focused();
        if let Some(item) = target {
            item.on_focus_activate();
        }
    }

    /// The focused item.
    #[must_use]
    pub fn focused(&self) -> Option<F> {
        let ring = self.ring.lock();
        ring.current.map(|i| ring.items[i].clone())
    }

    /// Position of the focused item in tab order.
    #[must_use]
    pub fn focused_index(&self) -> Option<usize> {
        self.ring.lock().current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.lock().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.lock().items.is_empty()
    }

    /// Unfocus the focused item and forget every registration.
    pub fn clear_all(&self) {
        let mut ring = self.ring.lock();
        if let Some(old) = ring.current.take() {
            ring.items[old].on_focus_lost();
        }
        ring.items.clear();
    }
}

impl<F: Focusable + Clone + PartialEq> Default for FocusManager<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for FocusManager<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("FocusManager")
            .field("len", &ring.items.len())
            .field("current", &ring.current)
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
