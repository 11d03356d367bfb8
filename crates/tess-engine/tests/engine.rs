// SPDX-License-Identifier: MIT
//
// Engine integration tests: a headless backend, keys fed through a
// channel, real threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tess_engine::{Engine, EngineConfig, EngineError, EngineHandle, EngineState, Scene};
use tess_term::HeadlessBackend;
use tess_term::terminal::Size;
use tess_ui::{Component, Focusable, Point};

const PATIENCE: Duration = Duration::from_secs(5);

fn fast_config() -> EngineConfig {
    EngineConfig {
        logic_rate: 200,
        render_rate: 200,
        input_poll_ms: 5,
        ..EngineConfig::default()
    }
}

fn headless() -> (Engine, HeadlessBackend, Sender<Vec<u8>>) {
    let backend = HeadlessBackend::new(40, 12);
    let (tx, rx) = mpsc::channel();
    let engine = Engine::new(fast_config(), backend.clone(), rx);
    (engine, backend, tx)
}

fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + PATIENCE;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

type Events = Arc<Mutex<Vec<String>>>;

/// Records its lifecycle; consecutive updates collapse into one line.
struct Recorder {
    name: &'static str,
    events: Events,
}

impl Recorder {
    fn new(name: &'static str, events: &Events) -> Self {
        Self {
            name,
            events: Arc::clone(events),
        }
    }

    fn push(&self, what: &str) {
        let line = format!("{} {what}", self.name);
        let mut events = self.events.lock();
        if what != "update" || events.last() != Some(&line) {
            events.push(line);
        }
    }
}

impl Scene for Recorder {
    fn initialize(&mut self, _engine: &EngineHandle) {
        self.push("init");
    }
    fn on_enter(&mut self) {
        self.push("enter");
    }
    fn on_update(&mut self, _dt: f64) {
        self.push("update");
    }
    fn on_exit(&mut self) {
        self.push("exit");
    }
    fn name(&self) -> &str {
        self.name
    }
}

fn contains(events: &Events, line: &str) -> bool {
    events.lock().iter().any(|e| e == line)
}

// ── Lifecycle ───────────────────────────────────────────────────────────

#[test]
fn lifecycle_misuse_is_rejected() {
    let (engine, _backend, _tx) = headless();
    let events = Events::default();

    assert!(matches!(engine.start(), Err(EngineError::NotInitialized)));
    engine.initialize().unwrap();
    assert!(matches!(engine.initialize(), Err(EngineError::AlreadyInitialized)));

    engine.set_initial_scene(Recorder::new("a", &events)).unwrap();
    engine.start().unwrap();
    assert_eq!(engine.state(), EngineState::Running);

    let again = engine.start().unwrap_err();
    assert!(matches!(again, EngineError::AlreadyRunning));
    assert!(again.is_invalid_operation());
    assert!(matches!(
        engine.set_initial_scene(Recorder::new("b", &events)),
        Err(EngineError::SceneWhileRunning)
    ));

    engine.stop().unwrap();
    engine.stop().unwrap();
    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(matches!(engine.start(), Err(EngineError::Stopped)));
    assert!(matches!(engine.initialize(), Err(EngineError::AlreadyInitialized)));
}

#[test]
fn terminal_is_entered_once_and_restored() {
    let (engine, backend, _tx) = headless();
    engine.initialize().unwrap();
    assert!(backend.is_active());
    engine.start().unwrap();
    engine.stop().unwrap();
    assert!(!backend.is_active());
    assert_eq!(backend.enter_count(), 1);
}

#[test]
fn dropping_the_engine_stops_it() {
    let (engine, backend, _tx) = headless();
    let events = Events::default();
    engine.set_initial_scene(Recorder::new("a", &events)).unwrap();
    engine.initialize().unwrap();
    engine.start().unwrap();
    assert!(eventually(|| contains(&events, "a update")));

    drop(engine);
    assert!(!backend.is_active());
    assert_eq!(events.lock().last().map(String::as_str), Some("a exit"));
}

#[test]
fn stop_before_initialize_is_harmless() {
    let (engine, backend, _tx) = headless();
    engine.stop().unwrap();
    assert_eq!(engine.state(), EngineState::Stopped);
    assert_eq!(backend.enter_count(), 0);
}

// ── Scenes ──────────────────────────────────────────────────────────────

#[test]
fn scene_swap_exits_old_before_entering_new() {
    let (engine, _backend, _tx) = headless();
    let events = Events::default();

    engine.set_initial_scene(Recorder::new("a", &events)).unwrap();
    engine.initialize().unwrap();
    engine.start().unwrap();
    assert!(eventually(|| contains(&events, "a update")));

    engine.load_scene(Recorder::new("b", &events));
    assert!(eventually(|| contains(&events, "b update")));
    engine.stop().unwrap();

    let events = events.lock().clone();
    let lifecycle: Vec<&str> = events
        .iter()
        .map(String::as_str)
        .filter(|e| !e.ends_with("update"))
        .collect();
    assert_eq!(
        lifecycle,
        vec!["a init", "a enter", "b init", "a exit", "b enter", "b exit"]
    );

    let at = |line: &str| events.iter().position(|e| e == line).unwrap();
    assert!(at("a exit") < at("b enter"));
    assert!(at("b enter") < at("b update"));
    assert!(events.iter().rposition(|e| e == "a update").unwrap() < at("a exit"));
}

#[test]
fn newer_pending_scene_replaces_older_one() {
    let (engine, _backend, _tx) = headless();
    let events = Events::default();
    engine.initialize().unwrap();

    engine.load_scene(Recorder::new("a", &events));
    engine.load_scene(Recorder::new("b", &events));
    engine.start().unwrap();
    assert!(eventually(|| contains(&events, "b update")));
    engine.stop().unwrap();

    assert!(!contains(&events, "a enter"));
    assert!(contains(&events, "b enter"));
}

/// Attaches a panel on enter and detaches it on exit.
struct Staged {
    name: &'static str,
    events: Events,
    panel: Component,
    engine: Option<EngineHandle>,
}

impl Staged {
    fn new(name: &'static str, events: &Events) -> Self {
        Self {
            name,
            events: Arc::clone(events),
            panel: Component::panel(Point::new(0, 0), tess_ui::Size::new(6, 3)),
            engine: None,
        }
    }

    fn push(&self, line: String) {
        let mut events = self.events.lock();
        if events.last() != Some(&line) {
            events.push(line);
        }
    }
}

impl Scene for Staged {
    fn initialize(&mut self, engine: &EngineHandle) {
        self.engine = Some(engine.clone());
    }
    fn on_enter(&mut self) {
        let Some(engine) = &self.engine else { return };
        self.push(format!("{} enter attached={}", self.name, self.panel.parent().is_some()));
        engine.root().add_child(&self.panel);
    }
    fn on_update(&mut self, _dt: f64) {
        self.push(format!("{} update", self.name));
    }
    fn on_exit(&mut self) {
        self.panel.detach();
        self.push(format!("{} exit", self.name));
    }
}

#[test]
fn loaded_scene_stays_off_the_tree_until_entered() {
    let (engine, _backend, _tx) = headless();
    let events = Events::default();
    let a = Staged::new("a", &events);
    let b = Staged::new("b", &events);
    let (a_panel, b_panel) = (a.panel.clone(), b.panel.clone());

    engine.set_initial_scene(a).unwrap();
    assert!(a_panel.parent().is_none());
    engine.initialize().unwrap();
    engine.start().unwrap();
    assert!(eventually(|| contains(&events, "a update")));
    assert_eq!(engine.root().children_snapshot(), vec![a_panel.clone()]);

    engine.load_scene(b);
    assert!(eventually(|| contains(&events, "b update")));
    assert_eq!(engine.root().children_snapshot(), vec![b_panel.clone()]);
    assert!(a_panel.parent().is_none());
    engine.stop().unwrap();

    let events = events.lock().clone();
    assert!(events.contains(&"a enter attached=false".to_owned()));
    assert!(events.contains(&"b enter attached=false".to_owned()));
    assert!(b_panel.parent().is_none());
}

/// Keeps its handle and leaves listeners behind on exit.
struct Careless {
    engine: Option<EngineHandle>,
}

impl Scene for Careless {
    fn initialize(&mut self, engine: &EngineHandle) {
        self.engine = Some(engine.clone());
    }
    fn on_enter(&mut self) {
        let Some(engine) = &self.engine else { return };
        let button = Component::button(Point::new(0, 0), "x");
        let handle = engine.clone();
        button.on_click(move |_| handle.request_stop());
        engine.root().add_child(&button);
        engine.focus().register(button);
        let handle = engine.clone();
        engine.input().on_escape(move |_| handle.request_stop());
        let handle = engine.clone();
        engine.on_resize(move |_| handle.request_stop());
    }
    fn on_update(&mut self, _dt: f64) {}
    fn on_exit(&mut self) {}
}

#[test]
fn stopped_engine_releases_its_tree() {
    let (engine, _backend, _tx) = headless();
    engine.set_initial_scene(Careless { engine: None }).unwrap();
    engine.initialize().unwrap();
    engine.start().unwrap();
    let root = engine.root().downgrade();
    assert_eq!(engine.focus().len(), 1);

    engine.stop().unwrap();
    assert_eq!(engine.focus().len(), 0);
    assert!(root.upgrade().is_some_and(|r| r.child_count() == 0));

    drop(engine);
    assert!(root.upgrade().is_none());
}

// ── Input and focus ─────────────────────────────────────────────────────

struct Menu {
    clicked: Arc<AtomicBool>,
    buttons: Vec<Component>,
    engine: Option<EngineHandle>,
}

impl Menu {
    fn new(clicked: &Arc<AtomicBool>) -> Self {
        Self {
            clicked: Arc::clone(clicked),
            buttons: Vec::new(),
            engine: None,
        }
    }
}

impl Scene for Menu {
    fn initialize(&mut self, engine: &EngineHandle) {
        for (i, label) in ["first", "second"].into_iter().enumerate() {
            let y = i32::try_from(i).unwrap() * 3;
            let button = Component::button(Point::new(1, y), label);
            if label == "second" {
                let clicked = Arc::clone(&self.clicked);
                let handle = engine.clone();
                button.on_click(move |_| {
                    clicked.store(true, Ordering::SeqCst);
                    handle.request_stop();
                });
            }
            self.buttons.push(button);
        }
        self.engine = Some(engine.clone());
    }
    fn on_enter(&mut self) {
        let Some(engine) = &self.engine else { return };
        for button in &self.buttons {
            engine.root().add_child(button);
            engine.focus().register(button.clone());
        }
    }
    fn on_update(&mut self, _dt: f64) {}
    fn on_exit(&mut self) {
        let Some(engine) = &self.engine else { return };
        for button in &self.buttons {
            engine.focus().unregister(button);
            button.detach();
        }
    }
}

#[test]
fn tab_and_enter_drive_focus() {
    let (engine, _backend, tx) = headless();
    let clicked = Arc::new(AtomicBool::new(false));
    engine
        .set_initial_scene(Menu::new(&clicked))
        .unwrap();
    engine.initialize().unwrap();
    engine.start().unwrap();
    assert_eq!(engine.focus().focused_index(), Some(0));

    tx.send(b"\t".to_vec()).unwrap();
    assert!(eventually(|| engine.focus().focused_index() == Some(1)));
    assert!(engine.focus().focused().is_some_and(|b| b.is_focused()));

    tx.send(b"\x1b[Z".to_vec()).unwrap();
    assert!(eventually(|| engine.focus().focused_index() == Some(0)));

    tx.send(b"\t\r".to_vec()).unwrap();
    assert!(engine.wait_timeout(PATIENCE));
    assert!(clicked.load(Ordering::SeqCst));
    engine.stop().unwrap();
}

#[test]
fn key_listeners_see_decoded_keys() {
    let (engine, _backend, tx) = headless();
    let escapes = Arc::new(AtomicUsize::new(0));
    let e = Arc::clone(&escapes);
    engine.input().on_escape(move |_| {
        e.fetch_add(1, Ordering::SeqCst);
    });
    engine.initialize().unwrap();

    tx.send(vec![0x1B]).unwrap();
    assert!(eventually(|| escapes.load(Ordering::SeqCst) == 1));
    engine.stop().unwrap();
}

#[test]
fn closed_input_requests_stop() {
    let (engine, _backend, tx) = headless();
    engine.initialize().unwrap();
    drop(tx);
    assert!(engine.wait_timeout(PATIENCE));
    assert!(engine.is_stop_requested());
    engine.stop().unwrap();
}

// ── Rendering ───────────────────────────────────────────────────────────

#[test]
fn frames_reach_the_backend() {
    let (engine, backend, _tx) = headless();
    engine
        .root()
        .add_child(&Component::label(Point::new(3, 2), "tessera"));
    engine.initialize().unwrap();
    engine.start().unwrap();

    assert!(eventually(|| backend.frames() > 0));
    assert!(eventually(|| engine.current_fps() > 0.0));
    assert!(eventually(|| engine.current_update_rate() > 0.0));
    engine.stop().unwrap();

    let out = String::from_utf8_lossy(&backend.output()).into_owned();
    assert!(out.contains("tessera"));
}

#[test]
fn resize_updates_viewport_and_notifies() {
    let (engine, backend, _tx) = headless();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    engine.on_resize(move |size| s.lock().push(*size));
    engine.initialize().unwrap();
    engine.start().unwrap();
    assert_eq!(engine.viewport().size(), Some(Size { cols: 40, rows: 12 }));

    backend.set_size(60, 20);
    assert!(eventually(|| !seen.lock().is_empty()));
    assert!(eventually(|| engine.viewport().size() == Some(Size { cols: 60, rows: 20 })));
    engine.stop().unwrap();
    assert_eq!(seen.lock().first(), Some(&Size { cols: 60, rows: 20 }));
}

// ── Concurrency ─────────────────────────────────────────────────────────

#[test]
fn tree_edits_while_running_do_not_panic() {
    let (engine, _backend, _tx) = headless();
    engine.initialize().unwrap();
    engine.start().unwrap();

    let root = engine.root();
    let editors: Vec<_> = (0..4)
        .map(|n| {
            let root = root.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    let panel = Component::panel(Point::new(n, i % 10), tess_ui::Size::new(5, 3));
                    panel.add_child(&Component::label(Point::new(1, 1), "x"));
                    root.add_child(&panel);
                    panel.set_position(Point::new(i % 30, n));
                    if i % 2 == 0 {
                        root.remove_child(&panel);
                    } else {
                        panel.detach();
                    }
                }
            })
        })
        .collect();

    for editor in editors {
        editor.join().unwrap();
    }
    assert_eq!(root.child_count(), 0);
    assert_eq!(engine.state(), EngineState::Running);
    engine.stop().unwrap();
}

// ── Config ──────────────────────────────────────────────────────────────

#[test]
fn zero_rates_run_at_sixty() {
    let backend = HeadlessBackend::new(10, 5);
    let (_tx, rx) = mpsc::channel::<Vec<u8>>();
    let config = EngineConfig::from_toml_str("logic_rate = 0\nrender_rate = 0\n").unwrap();
    let engine = Engine::new(config, backend, rx);
    assert_eq!(engine.config().effective_logic_rate(), 60);
    assert_eq!(engine.config().effective_render_rate(), 60);
}
