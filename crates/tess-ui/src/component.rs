// SPDX-License-Identifier: MIT
//
// Component — the retained scene graph.
//
// A `Component` is a handle: cloning it clones an `Arc`, and two handles
// compare equal exactly when they point at the same node. Parents own
// their children through the child list. Children point back through a
// `Weak`, so a subtree dropped by its parent is freed even if a child
// handle is still parked in a closure somewhere.
//
// Every node is shared by three threads. Input handlers mutate it, the
// logic loop ticks its animations, the render loop draws it. Each part of
// a node has its own lock and no lock is held while another node's lock
// is taken, except that `add_child` holds the child's parent slot while
// it relinks. Structural edits (add, remove, detach) also take one
// process-wide edit lock, so the cycle check and the relink it guards
// happen as one step. Draw and update walk point-in-time snapshots of the
// child list, so a child added or removed mid-walk shows up (or
// disappears) on the next frame instead of invalidating the walk.
//
// Positions are stored relative to the parent. The world position is
// recomputed from the parent chain on every call; nothing is cached.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tess_term::{Color, FrameBuffer};

use crate::animation::Animation;
use crate::easing::{Easing, lerp};
use crate::focus::Focusable;
use crate::geometry::{Point, Size};
use crate::observer::{ListenerId, Observers};
use crate::tween;

/// Length of the flash a button shows when activated, in seconds.
pub const ACTIVATE_BLINK: f64 = 0.3;

/// Default time a progress bar takes to reach a new value, in seconds.
pub const PROGRESS_DURATION: f64 = 0.5;

const FILLED: char = '█';
const EMPTY: char = '░';

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Held across every parent/child relink.
static TREE_EDIT: Mutex<()> = parking_lot::const_mutex(());

// ─── Widget kinds ────────────────────────────────────────────────────────────

/// Button-specific state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub has_border: bool,
    /// Background when not focused.
    pub normal_bg: Color,
    /// Background while focused.
    pub focused_bg: Color,
    pub focused: bool,
    pub can_focus: bool,
}

impl Button {
    fn new(text: String) -> Self {
        Self {
            text,
            has_border: true,
            normal_bg: Color::DarkGray,
            focused_bg: Color::Cyan,
            focused: false,
            can_focus: true,
        }
    }

    /// Smallest size that fits the label.
    fn min_size(&self) -> Size {
        let len = text_len(&self.text);
        if self.has_border {
            Size::new(len.saturating_add(2), 3)
        } else {
            Size::new(len, 1)
        }
    }
}

/// What a component draws, and how it reacts to focus.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Draws nothing; a container for children.
    Group,
    /// Background fill with an optional border.
    Panel { has_border: bool },
    /// A single line of text.
    Label { text: String },
    Button(Button),
    /// A horizontal bar filled to `progress` in [0, 1].
    ProgressBar { progress: f64 },
}

// ─── Node ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct State {
    position: Point,
    size: Size,
    visible: bool,
    fg: Color,
    bg: Color,
    border: Color,
    widget: Widget,
}

struct Node {
    id: u64,
    state: RwLock<State>,
    children: Mutex<Vec<Component>>,
    parent: Mutex<Weak<Node>>,
    animations: Mutex<Vec<Animation>>,
    /// Bumped by `clear_animations` so an in-flight tick knows to discard
    /// the animations it took out.
    animation_epoch: AtomicU64,
    clicks: Observers<Component>,
}

/// A node in the scene graph.
///
/// ```
/// use tess_ui::component::Component;
/// use tess_ui::geometry::{Point, Size};
///
/// let root = Component::group();
/// let panel = Component::panel(Point::new(2, 3), Size::new(20, 5));
/// let label = Component::label(Point::new(1, 1), "hello");
/// root.add_child(&panel);
/// panel.add_child(&label);
///
/// assert_eq!(label.world_position(), Point::new(3, 4));
/// ```
#[derive(Clone)]
pub struct Component {
    node: Arc<Node>,
}

/// A non-owning handle to a [`Component`].
#[derive(Clone, Default)]
pub struct WeakComponent {
    node: Weak<Node>,
}

impl WeakComponent {
    /// The component, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Component> {
        self.node.upgrade().map(|node| Component { node })
    }
}

impl fmt::Debug for WeakComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakComponent")
            .field("alive", &(self.node.strong_count() > 0))
            .finish()
    }
}

// ─── Construction ────────────────────────────────────────────────────────────

impl Component {
    fn with_widget(position: Point, size: Size, widget: Widget) -> Self {
        Self {
            node: Arc::new(Node {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                state: RwLock::new(State {
                    position,
                    size,
                    visible: true,
                    fg: Color::White,
                    bg: Color::Black,
                    border: Color::White,
                    widget,
                }),
                children: Mutex::new(Vec::new()),
                parent: Mutex::new(Weak::new()),
                animations: Mutex::new(Vec::new()),
                animation_epoch: AtomicU64::new(0),
                clicks: Observers::new(),
            }),
        }
    }

    /// An invisible container at the origin.
    #[must_use]
    pub fn group() -> Self {
        Self::with_widget(Point::ORIGIN, Size::default(), Widget::Group)
    }

    /// A filled, bordered rectangle.
    #[must_use]
    pub fn panel(position: Point, size: Size) -> Self {
        Self::with_widget(position, size, Widget::Panel { has_border: true })
    }

    /// One line of text, sized to fit.
    #[must_use]
    pub fn label(position: Point, text: impl Into<String>) -> Self {
        let text = text.into();
        let size = Size::new(text_len(&text), 1);
        Self::with_widget(position, size, Widget::Label { text })
    }

    /// A focusable, bordered button sized to fit its text.
    #[must_use]
    pub fn button(position: Point, text: impl Into<String>) -> Self {
        let button = Button::new(text.into());
        let size = button.min_size();
        Self::with_widget(position, size, Widget::Button(button))
    }

    /// An empty one-row progress bar.
    #[must_use]
    pub fn progress_bar(position: Point, width: i32) -> Self {
        Self::with_widget(
            position,
            Size::new(width, 1),
            Widget::ProgressBar { progress: 0.0 },
        )
    }

    #[must_use]
    pub fn with_fg(self, color: Color) -> Self {
        self.set_fg(color);
        self
    }

    #[must_use]
    pub fn with_bg(self, color: Color) -> Self {
        self.set_bg(color);
        self
    }

    #[must_use]
    pub fn with_border_color(self, color: Color) -> Self {
        self.set_border_color(color);
        self
    }

    #[must_use]
    pub fn with_border(self, has_border: bool) -> Self {
        self.set_has_border(has_border);
        self
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            node: Arc::downgrade(&self.node),
        }
    }

    /// Process-unique, never reused.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.node.id
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────────

impl Component {
    /// A copy of the widget state.
    #[must_use]
    pub fn widget(&self) -> Widget {
        self.node.state.read().widget.clone()
    }

    /// Position relative to the parent.
    #[must_use]
    pub fn position(&self) -> Point {
        self.node.state.read().position
    }

    pub fn set_position(&self, position: Point) {
        self.node.state.write().position = position;
    }

    #[must_use]
    pub fn size(&self) -> Size {
        self.node.state.read().size
    }

    /// Resize. Buttons never shrink below what their text needs.
    pub fn set_size(&self, size: Size) {
        let mut guard = self.node.state.write();
        let state = &mut *guard;
        state.size = match &state.widget {
            Widget::Button(b) => grow_to(size, b.min_size()),
            _ => size,
        };
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.node.state.read().visible
    }

    /// Hidden components skip drawing themselves and their whole subtree.
    pub fn set_visible(&self, visible: bool) {
        self.node.state.write().visible = visible;
    }

    #[must_use]
    pub fn fg(&self) -> Color {
        self.node.state.read().fg
    }

    pub fn set_fg(&self, color: Color) {
        self.node.state.write().fg = color;
    }

    #[must_use]
    pub fn bg(&self) -> Color {
        self.node.state.read().bg
    }

    pub fn set_bg(&self, color: Color) {
        self.node.state.write().bg = color;
    }

    #[must_use]
    pub fn border_color(&self) -> Color {
        self.node.state.read().border
    }

    pub fn set_border_color(&self, color: Color) {
        self.node.state.write().border = color;
    }

    /// Label or button text.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match &self.node.state.read().widget {
            Widget::Label { text } => Some(text.clone()),
            Widget::Button(b) => Some(b.text.clone()),
            _ => None,
        }
    }

    /// Replace label or button text. Other kinds ignore it.
    ///
    /// A label is resized to the new text; a button only grows.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        let mut guard = self.node.state.write();
        let state = &mut *guard;
        let size = state.size;
        match &mut state.widget {
            Widget::Label { text: t } => {
                state.size = Size::new(text_len(&text), 1);
                *t = text;
            }
            Widget::Button(b) => {
                b.text = text;
                state.size = grow_to(size, b.min_size());
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn has_border(&self) -> bool {
        match &self.node.state.read().widget {
            Widget::Panel { has_border } => *has_border,
            Widget::Button(b) => b.has_border,
            _ => false,
        }
    }

    /// Toggle the border on a panel or button.
    pub fn set_has_border(&self, on: bool) {
        let mut guard = self.node.state.write();
        let state = &mut *guard;
        let size = state.size;
        match &mut state.widget {
            Widget::Panel { has_border } => *has_border = on,
            Widget::Button(b) => {
                b.has_border = on;
                state.size = grow_to(size, b.min_size());
            }
            _ => {}
        }
    }

    /// Button backgrounds for the normal and focused states.
    pub fn set_button_colors(&self, normal: Color, focused: Color) {
        if let Widget::Button(b) = &mut self.node.state.write().widget {
            b.normal_bg = normal;
            b.focused_bg = focused;
        }
    }

    /// Let a button take part in focus navigation, or not.
    pub fn set_can_focus(&self, can_focus: bool) {
        if let Widget::Button(b) = &mut self.node.state.write().widget {
            b.can_focus = can_focus;
        }
    }

    /// Current fill of a progress bar.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        match self.node.state.read().widget {
            Widget::ProgressBar { progress } => Some(progress),
            _ => None,
        }
    }

    /// Animate a progress bar from its current value to `target` over
    /// `duration` seconds. `target` is clamped to [0, 1].
    pub fn set_progress(&self, target: f64, duration: f64) {
        let Some(start) = self.progress() else {
            return;
        };
        let target = if target.is_nan() { 0.0 } else { target.clamp(0.0, 1.0) };
        let weak = self.downgrade();
        self.add_animation(tween::progress(duration, Easing::Linear, move |t| {
            let Some(bar) = weak.upgrade() else {
                return;
            };
            if let Widget::ProgressBar { progress } = &mut bar.node.state.write().widget {
                *progress = lerp(start, target, t);
            }
        }));
    }

    /// Call `f` whenever this component is activated.
    pub fn on_click(&self, f: impl Fn(&Self) + Send + Sync + 'static) -> ListenerId {
        self.node.clicks.subscribe(f)
    }

    pub fn remove_click_listener(&self, id: ListenerId) -> bool {
        self.node.clicks.unsubscribe(id)
    }

    /// Fire the click listeners.
    pub fn click(&self) {
        self.node.clicks.emit(self);
    }
}

// ─── Tree ────────────────────────────────────────────────────────────────────

impl Component {
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.node.parent.lock().upgrade().map(|node| Self { node })
    }

    /// Whether `self` sits somewhere below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            if node == *ancestor {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    /// Append `child`, detaching it from its previous parent first.
    ///
    /// Adding a component to itself or to one of its own descendants
    /// would make a cycle and is refused.
    pub fn add_child(&self, child: &Self) {
        let _edit = TREE_EDIT.lock();
        if child == self || self.is_descendant_of(child) {
            tracing::warn!(
                parent = self.id(),
                child = child.id(),
                "refusing to add a component beneath itself"
            );
            return;
        }

        let mut parent = child.node.parent.lock();
        if let Some(old) = parent.upgrade() {
            old.children.lock().retain(|c| c != child);
        }
        self.node.children.lock().push(child.clone());
        *parent = Arc::downgrade(&self.node);
    }

    /// Remove a direct child. Returns whether it was one.
    pub fn remove_child(&self, child: &Self) -> bool {
        let _edit = TREE_EDIT.lock();
        self.unlink(child)
    }

    fn unlink(&self, child: &Self) -> bool {
        let removed = {
            let mut children = self.node.children.lock();
            let before = children.len();
            children.retain(|c| c != child);
            children.len() != before
        };
        if removed {
            let mut parent = child.node.parent.lock();
            if parent.ptr_eq(&Arc::downgrade(&self.node)) {
                *parent = Weak::new();
            }
        }
        removed
    }

    /// Remove from the current parent, if any.
    pub fn detach(&self) -> bool {
        let _edit = TREE_EDIT.lock();
        self.parent().is_some_and(|p| p.unlink(self))
    }

    /// The children as of now, in draw order.
    #[must_use]
    pub fn children_snapshot(&self) -> Vec<Self> {
        self.node.children.lock().clone()
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.node.children.lock().len()
    }

    /// Absolute position: the parent's world position plus our own.
    #[must_use]
    pub fn world_position(&self) -> Point {
        let own = self.position();
        match self.parent() {
            Some(parent) => parent.world_position() + own,
            None => own,
        }
    }

    /// Move so that the world position becomes `world`.
    pub fn set_absolute_position(&self, world: Point) {
        let origin = self.parent().map_or(Point::ORIGIN, |p| p.world_position());
        self.set_position(world - origin);
    }
}

// ─── Animation ───────────────────────────────────────────────────────────────

impl Component {
    pub fn add_animation(&self, animation: Animation) {
        self.node.animations.lock().push(animation);
    }

    /// Drop every running animation, including ones mid-tick.
    pub fn clear_animations(&self) {
        let mut list = self.node.animations.lock();
        list.clear();
        self.node.animation_epoch.fetch_add(1, Ordering::AcqRel);
    }

    #[must_use]
    pub fn animation_count(&self) -> usize {
        self.node.animations.lock().len()
    }

    /// Advance animations here and in the whole subtree by `dt` seconds.
    ///
    /// Animation callbacks run with no lock held, so they may add
    /// animations, move components or edit the tree.
    pub fn update(&self, dt: f64) {
        let epoch = self.node.animation_epoch.load(Ordering::Acquire);
        let mut running = std::mem::take(&mut *self.node.animations.lock());

        for animation in &mut running {
            animation.update(dt);
        }
        running.retain(|a| !a.is_complete());

        {
            let mut list = self.node.animations.lock();
            if self.node.animation_epoch.load(Ordering::Acquire) == epoch {
                let added = std::mem::take(&mut *list);
                running.extend(added);
                *list = running;
            }
        }

        for child in self.children_snapshot() {
            child.update(dt);
        }
    }
}

// ─── Drawing ─────────────────────────────────────────────────────────────────

impl Component {
    /// Paint this component and then its children, in order.
    ///
    /// An invisible component draws nothing, children included.
    pub fn draw(&self, buf: &mut FrameBuffer) {
        if !self.is_visible() {
            return;
        }
        let origin = self.world_position();
        {
            let state = self.node.state.read();
            paint(&state, origin, buf);
        }
        for child in self.children_snapshot() {
            child.draw(buf);
        }
    }
}

fn paint(state: &State, at: Point, buf: &mut FrameBuffer) {
    let Point { x, y } = at;
    let Size { width, height } = state.size;

    match &state.widget {
        Widget::Group => {}
        Widget::Panel { has_border } => {
            buf.fill_rect(x, y, width, height, ' ', state.fg, state.bg);
            if *has_border {
                buf.draw_box(x, y, width, height, state.border, state.bg);
            }
        }
        Widget::Label { text } => {
            buf.draw_text(x, y, text, state.fg, state.bg);
        }
        Widget::Button(b) => {
            let bg = if b.focused { b.focused_bg } else { b.normal_bg };
            buf.fill_rect(x, y, width, height, ' ', state.fg, bg);
            let pad = if b.has_border {
                buf.draw_box(x, y, width, height, state.border, bg);
                (width - text_len(&b.text)) / 2
            } else {
                1
            };
            buf.draw_text(x.saturating_add(pad), y.saturating_add(height / 2), &b.text, state.fg, bg);
        }
        Widget::ProgressBar { progress } => {
            let filled = filled_cells(width, *progress);
            buf.fill_rect(x, y, filled, height, FILLED, Color::White, Color::Green);
            buf.fill_rect(
                x.saturating_add(filled),
                y,
                width - filled,
                height,
                EMPTY,
                Color::Gray,
                Color::DarkGray,
            );
        }
    }
}

#[allow(clippy::cast_possible_truncation)] // Bounded by width.
fn filled_cells(width: i32, progress: f64) -> i32 {
    if width <= 0 || progress.is_nan() {
        return 0;
    }
    ((f64::from(width) * progress.clamp(0.0, 1.0)).floor() as i32).clamp(0, width)
}

fn text_len(text: &str) -> i32 {
    i32::try_from(text.chars().count()).unwrap_or(i32::MAX)
}

fn grow_to(size: Size, min: Size) -> Size {
    Size::new(size.width.max(min.width), size.height.max(min.height))
}

// ─── Focus ───────────────────────────────────────────────────────────────────

impl Focusable for Component {
    fn can_focus(&self) -> bool {
        matches!(&self.node.state.read().widget, Widget::Button(b) if b.can_focus)
    }

    fn is_focused(&self) -> bool {
        matches!(&self.node.state.read().widget, Widget::Button(b) if b.focused)
    }

    fn on_focus_gained(&self) {
        if let Widget::Button(b) = &mut self.node.state.write().widget {
            b.focused = true;
        }
    }

    fn on_focus_lost(&self) {
        if let Widget::Button(b) = &mut self.node.state.write().widget {
            b.focused = false;
        }
    }

    /// Flash briefly, then notify click listeners.
    fn on_focus_activate(&self) {
        if !matches!(self.node.state.read().widget, Widget::Button(_)) {
            return;
        }
        self.add_animation(tween::blink(self, ACTIVATE_BLINK, false));
        self.click();
    }
}

// ─── Identity ────────────────────────────────────────────────────────────────

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.node.state.read();
        f.debug_struct("Component")
            .field("id", &self.node.id)
            .field("widget", &state.widget)
            .field("position", &state.position)
            .field("size", &state.size)
            .field("visible", &state.visible)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use pretty_assertions::assert_eq;
    use tess_term::Cell;

    fn glyphs(buf: &FrameBuffer, y: i32, xs: std::ops::Range<i32>) -> String {
        xs.map(|x| buf.get(x, y).map_or('?', |c| c.glyph)).collect()
    }

    // ── Positioning ─────────────────────────────────────────────────────

    #[test]
    fn world_position_accumulates_through_parents() {
        let root = Component::group();
        let a = Component::panel(Point::new(2, 3), Size::new(10, 10));
        let b = Component::label(Point::new(1, 1), "b");
        root.add_child(&a);
        a.add_child(&b);
        assert_eq!(b.world_position(), Point::new(3, 4));

        a.set_position(Point::new(5, 5));
        assert_eq!(b.world_position(), Point::new(6, 6));
    }

    #[test]
    fn absolute_position_round_trips_through_parent() {
        let a = Component::panel(Point::new(4, 4), Size::new(5, 5));
        let b = Component::label(Point::ORIGIN, "b");
        a.add_child(&b);

        b.set_absolute_position(Point::new(10, 1));
        assert_eq!(b.position(), Point::new(6, -3));
        assert_eq!(b.world_position(), Point::new(10, 1));
    }

    #[test]
    fn parentless_world_position_is_relative() {
        let c = Component::label(Point::new(7, 8), "c");
        assert_eq!(c.world_position(), Point::new(7, 8));
        c.set_absolute_position(Point::new(1, 2));
        assert_eq!(c.position(), Point::new(1, 2));
    }

    // ── Tree edits ──────────────────────────────────────────────────────

    #[test]
    fn reparenting_detaches_from_old_parent() {
        let a = Component::group();
        let b = Component::group();
        let c = Component::label(Point::ORIGIN, "c");

        a.add_child(&c);
        b.add_child(&c);
        assert_eq!(a.child_count(), 0);
        assert_eq!(b.children_snapshot(), vec![c.clone()]);
        assert_eq!(c.parent(), Some(b));
    }

    #[test]
    fn cycles_are_refused() {
        let a = Component::group();
        let b = Component::group();
        let c = Component::group();
        a.add_child(&b);
        b.add_child(&c);

        c.add_child(&a);
        a.add_child(&a);
        assert_eq!(c.child_count(), 0);
        assert_eq!(a.child_count(), 1);
        assert_eq!(a.parent(), None);
    }

    fn chain(depth: usize) -> (Component, Component) {
        let top = Component::group();
        let mut leaf = top.clone();
        for _ in 0..depth {
            let next = Component::group();
            leaf.add_child(&next);
            leaf = next;
        }
        (top, leaf)
    }

    #[test]
    fn concurrent_cross_links_never_form_a_cycle() {
        use std::sync::Barrier;

        for _ in 0..200 {
            let (a_top, a_leaf) = chain(40);
            let (b_top, b_leaf) = chain(40);
            let barrier = Arc::new(Barrier::new(2));

            let link = |parent: Component, child: Component| {
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    parent.add_child(&child);
                })
            };
            let first = link(b_leaf, a_top.clone());
            let second = link(a_leaf, b_top.clone());
            first.join().unwrap();
            second.join().unwrap();

            // Exactly one of the two links may land.
            assert!(a_top.parent().is_none() ^ b_top.parent().is_none());
        }
    }

    #[test]
    fn remove_and_detach_clear_parent() {
        let root = Component::group();
        let a = Component::group();
        let b = Component::group();
        root.add_child(&a);
        root.add_child(&b);

        assert!(root.remove_child(&a));
        assert!(!root.remove_child(&a));
        assert_eq!(a.parent(), None);

        assert!(b.detach());
        assert!(!b.detach());
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn dropping_parent_frees_child_link() {
        let child = Component::group();
        {
            let parent = Component::group();
            parent.add_child(&child);
            assert!(child.parent().is_some());
        }
        assert_eq!(child.parent(), None);
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    #[test]
    fn invisible_parent_hides_subtree() {
        let mut buf = FrameBuffer::new(20, 5);
        buf.present_to(&mut Vec::<u8>::new()).ok();

        let panel = Component::panel(Point::ORIGIN, Size::new(10, 3));
        let label = Component::label(Point::new(1, 1), "hi");
        panel.add_child(&label);
        panel.set_visible(false);

        panel.draw(&mut buf);
        assert_eq!(buf.dirty_count(), 0);
    }

    #[test]
    fn panel_draws_fill_border_then_children() {
        let mut buf = FrameBuffer::new(10, 4);
        let panel = Component::panel(Point::new(1, 0), Size::new(6, 3))
            .with_bg(Color::Blue)
            .with_border_color(Color::Yellow);
        panel.add_child(&Component::label(Point::new(1, 1), "ok"));
        panel.draw(&mut buf);

        assert_eq!(glyphs(&buf, 0, 1..7), "┌────┐");
        assert_eq!(glyphs(&buf, 1, 1..7), "│ok  │");
        assert_eq!(glyphs(&buf, 2, 1..7), "└────┘");
        assert_eq!(buf.get(1, 0).map(|c| c.fg), Some(Color::Yellow));
        assert_eq!(buf.get(4, 1).map(|c| c.bg), Some(Color::Blue));
    }

    #[test]
    fn button_centers_text_and_sizes_itself() {
        let mut buf = FrameBuffer::new(12, 3);
        let button = Component::button(Point::ORIGIN, "Go");
        assert_eq!(button.size(), Size::new(4, 3));

        button.set_size(Size::new(8, 1));
        assert_eq!(button.size(), Size::new(8, 3));

        button.draw(&mut buf);
        assert_eq!(glyphs(&buf, 1, 0..8), "│  Go  │");
        assert_eq!(buf.get(3, 1).map(|c| c.bg), Some(Color::DarkGray));
    }

    #[test]
    fn borderless_button_pads_by_one() {
        let mut buf = FrameBuffer::new(12, 1);
        let button = Component::button(Point::ORIGIN, "Go").with_border(false);
        button.set_size(Size::new(5, 1));
        button.draw(&mut buf);
        assert_eq!(glyphs(&buf, 0, 0..5), " Go  ");
    }

    #[test]
    fn focused_button_uses_focus_background() {
        let mut buf = FrameBuffer::new(6, 3);
        let button = Component::button(Point::ORIGIN, "X");
        button.on_focus_gained();
        button.draw(&mut buf);
        assert_eq!(buf.get(1, 1).map(|c| c.bg), Some(Color::Cyan));
        assert!(button.is_focused());
    }

    #[test]
    fn progress_bar_fills_floor_of_width() {
        let mut buf = FrameBuffer::new(10, 1);
        let bar = Component::progress_bar(Point::ORIGIN, 10);
        bar.set_progress(0.55, 0.0);
        bar.update(0.0);
        assert_eq!(bar.progress(), Some(0.55));

        bar.draw(&mut buf);
        assert_eq!(glyphs(&buf, 0, 0..10), "█████░░░░░");
        assert_eq!(
            buf.get(0, 0),
            Some(Cell::new('█', Color::White, Color::Green))
        );
        assert_eq!(
            buf.get(9, 0),
            Some(Cell::new('░', Color::Gray, Color::DarkGray))
        );
    }

    #[test]
    fn set_progress_animates_from_current_value() {
        let bar = Component::progress_bar(Point::ORIGIN, 10);
        bar.set_progress(1.0, 1.0);
        bar.update(0.5);
        assert_eq!(bar.progress(), Some(0.5));
        bar.update(0.5);
        assert_eq!(bar.progress(), Some(1.0));
        assert_eq!(bar.animation_count(), 0);
    }

    // ── Animation ───────────────────────────────────────────────────────

    #[test]
    fn update_drops_completed_and_ticks_children() {
        let root = Component::group();
        let child = Component::label(Point::ORIGIN, "c");
        root.add_child(&child);

        root.add_animation(Animation::new(1.0, |_| {}));
        child.add_animation(Animation::new(1.0, |_| {}).looping(true));
        root.update(1.0);

        assert_eq!(root.animation_count(), 0);
        assert_eq!(child.animation_count(), 1);
    }

    #[test]
    fn animations_added_during_tick_are_kept() {
        let c = Component::group();
        let weak = c.downgrade();
        c.add_animation(Animation::new(1.0, move |_| {
            if let Some(c) = weak.upgrade() {
                c.add_animation(Animation::new(5.0, |_| {}));
            }
        }));

        c.update(1.0);
        assert_eq!(c.animation_count(), 1);
    }

    #[test]
    fn clear_during_tick_discards_everything() {
        let c = Component::group();
        let weak = c.downgrade();
        c.add_animation(Animation::new(10.0, move |_| {
            if let Some(c) = weak.upgrade() {
                c.clear_animations();
            }
        }));
        c.add_animation(Animation::new(10.0, |_| {}));

        c.update(1.0);
        assert_eq!(c.animation_count(), 0);
    }

    // ── Focus and clicks ────────────────────────────────────────────────

    #[test]
    fn only_buttons_take_focus() {
        assert!(Component::button(Point::ORIGIN, "b").can_focus());
        assert!(!Component::label(Point::ORIGIN, "l").can_focus());
        assert!(!Component::group().can_focus());

        let b = Component::button(Point::ORIGIN, "b");
        b.set_can_focus(false);
        assert!(!b.can_focus());
    }

    #[test]
    fn activation_blinks_and_fires_clicks() {
        let button = Component::button(Point::ORIGIN, "b");
        let clicks = Arc::new(AtomicUsize::new(0));
        let n = Arc::clone(&clicks);
        button.on_click(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        });

        button.on_focus_activate();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(button.animation_count(), 1);

        button.update(0.2);
        assert!(!button.is_visible());
        button.update(0.2);
        assert!(button.is_visible());
        assert_eq!(button.animation_count(), 0);
    }

    #[test]
    fn set_text_resizes() {
        let label = Component::label(Point::ORIGIN, "ab");
        label.set_text("abcd");
        assert_eq!(label.size(), Size::new(4, 1));
        assert_eq!(label.text().as_deref(), Some("abcd"));

        let button = Component::button(Point::ORIGIN, "a");
        button.set_text("abcdef");
        assert_eq!(button.size(), Size::new(8, 3));
    }
}
