//! # tess-ui — Scene graph for tessera
//!
//! Retained components drawn into a `tess_term::FrameBuffer`:
//!
//! - **[`geometry`]** — `Point`, `Size` and a clamping `Camera`, in cell units
//! - **[`easing`]** — timing curves and `lerp`
//! - **[`animation`]** — `Animation`, a clock that reports progress to a callback
//! - **[`tween`]** — animation builders that move, blink or recolor a component
//! - **[`component`]** — the `Component` tree: groups, panels, labels, buttons, progress bars
//! - **[`observer`]** — `Observers`, an ordered listener registry
//! - **[`focus`]** — `Focusable` and the tab-order `FocusManager`
//!
//! Every type here is safe to share between the input, logic and render
//! threads. Methods take `&self` and lock internally.

pub mod animation;
pub mod component;
pub mod easing;
pub mod focus;
pub mod geometry;
pub mod observer;
pub mod tween;

pub use animation::Animation;
pub use component::{Component, WeakComponent, Widget};
pub use easing::Easing;
pub use focus::{FocusManager, Focusable};
pub use geometry::{Camera, Point, Size};
pub use observer::{ListenerId, Observers};
