// SPDX-License-Identifier: MIT
//
// Scene — one screen's worth of game or UI logic.
//
// The engine owns at most one current scene and one pending scene. The
// logic thread swaps pending in at the top of a tick, calling `on_exit`
// on the outgoing scene and `on_enter` on the incoming one before any
// `on_update` reaches it.
//
// A scene loaded while another is current is initialized right away, on
// the loading thread, but stays invisible until the swap. So the work
// splits along the hooks: `initialize` builds the subtree and wires its
// own listeners; `on_enter` attaches it under the root and registers its
// focusable controls; `on_exit` undoes exactly that.

use crate::engine::EngineHandle;

/// Lifecycle hooks for a scene.
///
/// `initialize` runs on the thread that hands the scene to the engine;
/// every other hook runs on the logic thread (or, for the first
/// `on_enter` and the last `on_exit`, inside `start` and `stop`).
pub trait Scene: Send {
    /// Build components and keep the handle. Runs once, before the scene
    /// is entered, possibly while another scene is still current: do not
    /// attach anything to `engine.root()` or the focus ring here.
    fn initialize(&mut self, engine: &EngineHandle);

    /// The scene became current. Attach its subtree, register focusable
    /// controls and subscribe to engine-wide input.
    fn on_enter(&mut self);

    /// One logic tick; `dt` is the real time since the previous tick.
    fn on_update(&mut self, dt: f64);

    /// The scene is being replaced, or the engine is stopping. Detach and
    /// unregister whatever `on_enter` attached.
    fn on_exit(&mut self);

    /// Name used in log lines.
    fn name(&self) -> &str {
        "scene"
    }
}
