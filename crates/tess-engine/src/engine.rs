// SPDX-License-Identifier: MIT
//
// Engine — lifecycle and the three worker threads.
//
//   Uninitialized ──initialize──▶ Initialized ──start──▶ Running
//         │                            │                    │
//         └────────────────stop────────┴────────stop────────┴──▶ Stopped
//
// `initialize` puts the backend into full-screen mode and starts the
// input thread, so keys are flowing before the first scene is entered.
// `start` enters the current scene and starts the logic and render
// threads. `stop` is terminal: the engine cannot be restarted.
//
// Threads share the component tree (internally locked) and the scene
// slots. The current scene sits behind one mutex that the logic thread
// holds for a whole tick; a pending scene sits behind another, so a scene
// can call `load_scene` from inside its own `on_update` without
// deadlocking. The swap itself happens on the logic thread at the top of
// a tick: exit the old scene, enter the new one, then update.
//
// Shutdown never hangs on a stuck worker. Each worker holds the sending
// half of a channel that disconnects when the thread ends, and `stop`
// waits on the receiving half with a timeout before joining. A worker
// that misses the deadline is detached with a warning.
//
// `Engine` is the owner: it alone can start and stop, and dropping it
// stops the engine. `EngineHandle` is what scenes and listeners keep; it
// can load scenes and ask the owner to stop, but cannot stop directly.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tess_term::terminal::Size;
use tess_term::{Backend, ByteSource, KeyCode, StdinSource, Terminal, Viewport};
use tess_ui::{Component, FocusManager, ListenerId, Observers};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::input::InputManager;
use crate::pacing::{FramePacer, RateMeter};
use crate::render::{RenderManager, SharedBackend};
use crate::scene::Scene;

/// Where an engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    /// Terminal entered, input flowing, loops not started.
    Initialized,
    Running,
    Stopped,
}

// ─── Shared state ────────────────────────────────────────────────────────────

type SceneSlot = Mutex<Option<Box<dyn Scene>>>;

#[derive(Default)]
struct SceneSlots {
    current: SceneSlot,
    pending: SceneSlot,
}

impl SceneSlots {
    /// One logic tick: swap in a pending scene, advance the tree, then
    /// update the current scene.
    fn tick(&self, root: &Component, dt: f64) {
        let mut current = self.current.lock();
        let incoming = self.pending.lock().take();

        if let Some(mut next) = incoming {
            match current.take() {
                Some(mut old) => {
                    tracing::debug!(from = old.name(), to = next.name(), "switching scene");
                    old.on_exit();
                }
                None => tracing::debug!(to = next.name(), "entering first scene"),
            }
            next.on_enter();
            *current = Some(next);
        }

        root.update(dt);

        if let Some(scene) = current.as_mut() {
            scene.on_update(dt);
        }
    }
}

/// A flag the host thread can block on until someone asks for shutdown.
#[derive(Default)]
struct StopSignal {
    requested: Mutex<bool>,
    cv: Condvar,
}

impl StopSignal {
    fn raise(&self) {
        *self.requested.lock() = true;
        self.cv.notify_all();
    }

    fn is_raised(&self) -> bool {
        *self.requested.lock()
    }

    /// Block until raised, or until `timeout` passes. Returns whether it
    /// was raised.
    fn wait(&self, timeout: Option<Duration>) -> bool {
        let mut requested = self.requested.lock();
        let deadline = timeout.map(|t| Instant::now() + t);
        while !*requested {
            match deadline {
                Some(deadline) => {
                    if self.cv.wait_until(&mut requested, deadline).timed_out() {
                        break;
                    }
                }
                None => self.cv.wait(&mut requested),
            }
        }
        *requested
    }
}

struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
    /// Disconnects when the thread exits, however it exits.
    done: mpsc::Receiver<()>,
}

struct Shared {
    config: EngineConfig,
    state: Mutex<EngineState>,
    root: Component,
    focus: Arc<FocusManager<Component>>,
    input: Arc<InputManager>,
    viewport: Arc<Viewport>,
    backend: SharedBackend,
    source: Mutex<Option<Box<dyn ByteSource>>>,
    renderer: Mutex<Option<RenderManager>>,
    scenes: Arc<SceneSlots>,
    cancel: Arc<AtomicBool>,
    workers: Mutex<Vec<Worker>>,
    fps: Arc<RateMeter>,
    ups: Arc<RateMeter>,
    resized: Arc<Observers<Size>>,
    stop: Arc<StopSignal>,
}

impl Shared {
    fn spawn(&self, name: &'static str, body: impl FnOnce() + Send + 'static) -> Result<(), EngineError> {
        let (done_tx, done) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(format!("tessera-{name}"))
            .spawn(move || {
                let _done = done_tx;
                body();
            })
            .map_err(|source| EngineError::Spawn { name, source })?;
        self.workers.lock().push(Worker { name, handle, done });
        Ok(())
    }

    fn join_workers(&self) {
        let workers = std::mem::take(&mut *self.workers.lock());
        let timeout = self.config.join_timeout();
        let me = thread::current().id();

        for worker in workers {
            if worker.handle.thread().id() == me {
                tracing::warn!(worker = worker.name, "stop called on a worker thread, not joining it");
                continue;
            }
            match worker.done.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if worker.handle.join().is_err() {
                        tracing::warn!(worker = worker.name, "worker panicked");
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!(worker = worker.name, ?timeout, "worker missed the join timeout, detaching");
                }
            }
        }
    }

    /// Drop listeners and subtrees. Scenes and their callbacks keep
    /// handles to `Shared`; this breaks those cycles once nothing can run.
    fn release_tree(&self) {
        self.input.clear();
        self.resized.clear();
        self.focus.clear_all();
        self.root.clear_animations();
        for child in self.root.children_snapshot() {
            self.root.remove_child(&child);
        }
    }

    fn discard_pending(&self) {
        let pending = self.scenes.pending.lock().take();
        if let Some(scene) = pending {
            tracing::debug!(scene = scene.name(), "discarding pending scene");
        }
    }
}

// ─── EngineHandle ────────────────────────────────────────────────────────────

/// A shared handle to a running engine, for scenes and listeners.
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
}

impl EngineHandle {
    /// The root of the component tree. Always a group.
    #[must_use]
    pub fn root(&self) -> Component {
        self.shared.root.clone()
    }

    /// Tab order for interactive components.
    #[must_use]
    pub fn focus(&self) -> &FocusManager<Component> {
        &self.shared.focus
    }

    #[must_use]
    pub fn input(&self) -> &InputManager {
        &self.shared.input
    }

    /// The render buffer's size, readable from any thread.
    #[must_use]
    pub fn viewport(&self) -> Arc<Viewport> {
        Arc::clone(&self.shared.viewport)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.shared.state.lock()
    }

    /// Frames per second over the last frame.
    #[must_use]
    pub fn current_fps(&self) -> f64 {
        self.shared.fps.get()
    }

    /// Logic ticks per second over the last tick.
    #[must_use]
    pub fn current_update_rate(&self) -> f64 {
        self.shared.ups.get()
    }

    /// Call `f` on the render thread whenever the terminal changes size.
    pub fn on_resize(&self, f: impl Fn(&Size) + Send + Sync + 'static) -> ListenerId {
        self.shared.resized.subscribe(f)
    }

    /// Queue `scene` to replace the current scene on the next logic tick.
    ///
    /// `scene.initialize` runs here, on the calling thread. A scene that
    /// was already pending is dropped without being entered.
    pub fn load_scene(&self, scene: impl Scene + 'static) {
        let mut scene: Box<dyn Scene> = Box::new(scene);
        scene.initialize(self);
        tracing::debug!(scene = scene.name(), "scene queued");
        let replaced = self.shared.scenes.pending.lock().replace(scene);
        if let Some(old) = replaced {
            tracing::debug!(scene = old.name(), "pending scene dropped before entering");
        }
    }

    /// Ask the owner to stop. Wakes [`Engine::wait`].
    pub fn request_stop(&self) {
        self.shared.stop.raise();
    }

    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop.is_raised()
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The engine owner.
///
/// ```no_run
/// use tess_engine::{Engine, EngineConfig};
///
/// let engine = Engine::with_terminal(EngineConfig::default());
/// engine.initialize()?;
/// engine.start()?;
/// engine.wait();
/// engine.stop()?;
/// # Ok::<(), tess_engine::EngineError>(())
/// ```
pub struct Engine {
    handle: EngineHandle,
}

impl Engine {
    /// An engine drawing to `backend` and reading keys from `source`.
    pub fn new(
        config: EngineConfig,
        backend: impl Backend + 'static,
        source: impl ByteSource + 'static,
    ) -> Self {
        let boxed: Box<dyn Backend> = Box::new(backend);
        let backend: SharedBackend = Arc::new(Mutex::new(boxed));
        let root = Component::group();
        let fps = Arc::new(RateMeter::new());
        let resized = Arc::new(Observers::new());
        let renderer = RenderManager::new(
            Arc::clone(&backend),
            root.clone(),
            config.background,
            Arc::clone(&fps),
            Arc::clone(&resized),
        );

        Self {
            handle: EngineHandle {
                shared: Arc::new(Shared {
                    viewport: renderer.viewport(),
                    config,
                    state: Mutex::new(EngineState::Uninitialized),
                    root,
                    focus: Arc::new(FocusManager::new()),
                    input: Arc::new(InputManager::new()),
                    backend,
                    source: Mutex::new(Some(Box::new(source))),
                    renderer: Mutex::new(Some(renderer)),
                    scenes: Arc::new(SceneSlots::default()),
                    cancel: Arc::new(AtomicBool::new(false)),
                    workers: Mutex::new(Vec::new()),
                    fps,
                    ups: Arc::new(RateMeter::new()),
                    resized,
                    stop: Arc::new(StopSignal::default()),
                }),
            },
        }
    }

    /// An engine on the controlling terminal and stdin.
    #[must_use]
    pub fn with_terminal(config: EngineConfig) -> Self {
        let terminal = Terminal::new().with_alternate_screen(config.alternate_screen);
        Self::new(config, terminal, StdinSource::new())
    }

    /// A handle for scenes and listeners.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Enter full-screen mode, bind focus keys and start reading input.
    ///
    /// Tab moves focus forward, Shift+Tab backward, Enter activates the
    /// focused component. If the input source closes, a stop is requested.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyInitialized`] unless the engine is fresh,
    /// [`EngineError::Io`] if the terminal cannot be set up, or
    /// [`EngineError::Spawn`] if the input thread cannot start.
    pub fn initialize(&self) -> Result<(), EngineError> {
        let shared = &self.handle.shared;
        let mut state = shared.state.lock();
        if *state != EngineState::Uninitialized {
            return Err(EngineError::AlreadyInitialized);
        }

        shared.backend.lock().enter()?;
        let Some(mut source) = shared.source.lock().take() else {
            return Err(EngineError::AlreadyInitialized);
        };
        self.bind_focus_keys();

        let input = Arc::clone(&shared.input);
        let cancel = Arc::clone(&shared.cancel);
        let stop = Arc::clone(&shared.stop);
        let poll = shared.config.input_poll();
        let spawned = shared.spawn("input", move || {
            input.run(source.as_mut(), poll, &cancel);
            if !cancel.load(Ordering::Acquire) {
                stop.raise();
            }
        });
        if let Err(err) = spawned {
            shared.backend.lock().leave().ok();
            return Err(err);
        }

        *state = EngineState::Initialized;
        tracing::debug!("engine initialized");
        Ok(())
    }

    fn bind_focus_keys(&self) {
        let input = &self.handle.shared.input;

        let focus = Arc::clone(&self.handle.shared.focus);
        input.on_key(move |key| {
            if key.is_back_tab() {
                focus.focus_previous();
            } else if key.key == KeyCode::Tab {
                focus.focus_next();
            }
        });

        let focus = Arc::clone(&self.handle.shared.focus);
        input.on_enter(move |_| focus.activate_focused());
    }

    /// Install the scene that `start` will enter.
    ///
    /// # Errors
    ///
    /// [`EngineError::SceneWhileRunning`] once started (use
    /// [`EngineHandle::load_scene`] instead), or [`EngineError::Stopped`].
    pub fn set_initial_scene(&self, scene: impl Scene + 'static) -> Result<(), EngineError> {
        match self.state() {
            EngineState::Running => return Err(EngineError::SceneWhileRunning),
            EngineState::Stopped => return Err(EngineError::Stopped),
            EngineState::Uninitialized | EngineState::Initialized => {}
        }
        let mut scene: Box<dyn Scene> = Box::new(scene);
        scene.initialize(&self.handle);
        tracing::debug!(scene = scene.name(), "initial scene set");
        let replaced = self.handle.shared.scenes.current.lock().replace(scene);
        drop(replaced);
        Ok(())
    }

    /// Enter the current scene and start the logic and render threads.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInitialized`], [`EngineError::AlreadyRunning`] or
    /// [`EngineError::Stopped`] when called in the wrong state, and
    /// [`EngineError::Spawn`] if a thread cannot start (the engine is
    /// stopped in that case).
    pub fn start(&self) -> Result<(), EngineError> {
        let shared = &self.handle.shared;
        {
            let mut state = shared.state.lock();
            match *state {
                EngineState::Uninitialized => return Err(EngineError::NotInitialized),
                EngineState::Running => return Err(EngineError::AlreadyRunning),
                EngineState::Stopped => return Err(EngineError::Stopped),
                EngineState::Initialized => *state = EngineState::Running,
            }
        }

        if let Some(scene) = shared.scenes.current.lock().as_mut() {
            tracing::debug!(scene = scene.name(), "entering initial scene");
            scene.on_enter();
        }

        if let Err(err) = self.spawn_loops() {
            self.stop().ok();
            return Err(err);
        }
        tracing::debug!("engine running");
        Ok(())
    }

    fn spawn_loops(&self) -> Result<(), EngineError> {
        let shared = &self.handle.shared;
        let config = &shared.config;
        let spin = config.spin_threshold();

        if let Some(renderer) = shared.renderer.lock().take() {
            let cancel = Arc::clone(&shared.cancel);
            let interval = config.render_interval();
            shared.spawn("render", move || {
                renderer.run(FramePacer::new(interval, spin), &cancel);
            })?;
        }

        let scenes = Arc::clone(&shared.scenes);
        let root = shared.root.clone();
        let ups = Arc::clone(&shared.ups);
        let cancel = Arc::clone(&shared.cancel);
        let interval = config.logic_interval();
        shared.spawn("logic", move || {
            let mut pacer = FramePacer::new(interval, spin);
            tracing::debug!(?interval, "logic loop started");
            while !cancel.load(Ordering::Acquire) {
                let dt = pacer.tick();
                ups.record(dt);
                scenes.tick(&root, dt);
                pacer.wait(&cancel);
            }
            tracing::debug!("logic loop finished");
        })
    }

    /// Stop every thread, exit the current scene and restore the terminal.
    ///
    /// Idempotent. Each worker gets `join_timeout` to finish. Afterwards
    /// the scene is dropped, every input and resize listener is removed,
    /// the focus ring is emptied and the root has no children.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the terminal cannot be restored.
    pub fn stop(&self) -> Result<(), EngineError> {
        let shared = &self.handle.shared;
        let previous = {
            let mut state = shared.state.lock();
            let previous = *state;
            if previous == EngineState::Stopped {
                return Ok(());
            }
            *state = EngineState::Stopped;
            previous
        };
        tracing::debug!(?previous, "stopping engine");

        shared.cancel.store(true, Ordering::Release);
        shared.join_workers();

        let timeout = shared.config.join_timeout();
        let retired = match shared.scenes.current.try_lock_for(timeout) {
            Some(mut current) => {
                if let (EngineState::Running, Some(scene)) = (previous, current.as_mut()) {
                    tracing::debug!(scene = scene.name(), "exiting scene");
                    scene.on_exit();
                }
                current.take()
            }
            None => {
                tracing::warn!("scene is still locked by the logic thread, skipping on_exit");
                None
            }
        };
        drop(retired);
        shared.discard_pending();
        shared.release_tree();
        shared.stop.raise();

        if previous != EngineState::Uninitialized {
            match shared.backend.try_lock_for(timeout) {
                Some(mut backend) => backend.leave()?,
                None => tracing::warn!("backend is still locked, terminal not restored"),
            }
        }
        tracing::debug!("engine stopped");
        Ok(())
    }

    /// Block until [`EngineHandle::request_stop`] is called (or the engine
    /// stops).
    pub fn wait(&self) {
        self.handle.shared.stop.wait(None);
    }

    /// [`wait`](Self::wait) with a limit. Returns whether a stop was
    /// requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.handle.shared.stop.wait(Some(timeout))
    }
}

impl Deref for Engine {
    type Target = EngineHandle;

    fn deref(&self) -> &EngineHandle {
        &self.handle
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(%err, "engine stop on drop failed");
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Log(Arc<Mutex<Vec<String>>>, &'static str);

    impl Scene for Log {
        fn initialize(&mut self, _engine: &EngineHandle) {
            self.0.lock().push(format!("{} init", self.1));
        }
        fn on_enter(&mut self) {
            self.0.lock().push(format!("{} enter", self.1));
        }
        fn on_update(&mut self, _dt: f64) {
            let mut log = self.0.lock();
            let line = format!("{} update", self.1);
            if log.last() != Some(&line) {
                log.push(line);
            }
        }
        fn on_exit(&mut self) {
            self.0.lock().push(format!("{} exit", self.1));
        }
        fn name(&self) -> &str {
            self.1
        }
    }

    // ── Scene slots ─────────────────────────────────────────────────────

    #[test]
    fn tick_swaps_before_updating() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let slots = SceneSlots::default();
        let root = Component::group();
        *slots.current.lock() = Some(Box::new(Log(Arc::clone(&log), "a")));

        slots.tick(&root, 0.01);
        *slots.pending.lock() = Some(Box::new(Log(Arc::clone(&log), "b")));
        slots.tick(&root, 0.01);
        slots.tick(&root, 0.01);

        assert_eq!(
            *log.lock(),
            vec!["a update", "a exit", "b enter", "b update"]
        );
    }

    #[test]
    fn first_pending_scene_is_entered_without_an_exit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let slots = SceneSlots::default();
        *slots.pending.lock() = Some(Box::new(Log(Arc::clone(&log), "a")));
        slots.tick(&Component::group(), 0.0);
        assert_eq!(*log.lock(), vec!["a enter", "a update"]);
    }

    // ── Stop signal ─────────────────────────────────────────────────────

    #[test]
    fn stop_signal_times_out_then_wakes() {
        let signal = Arc::new(StopSignal::default());
        assert!(!signal.wait(Some(Duration::from_millis(5))));

        let s = Arc::clone(&signal);
        let waiter = thread::spawn(move || s.wait(None));
        thread::sleep(Duration::from_millis(10));
        signal.raise();
        assert!(waiter.join().unwrap());
    }
}
