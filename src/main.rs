// SPDX-License-Identifier: MIT
//
// tessera — demo host for the terminal UI toolkit.
//
// Wires the three crates together:
//
//   tess-term   → frame buffer, presenter, key decoder, terminal backend
//   tess-ui     → component tree, animations, focus ring
//   tess-engine → input / logic / render threads and scenes
//
// The menu scene builds a bordered panel with three buttons, a status
// line and a progress bar:
//
//   ┌────────────────────────────────────┐
//   │ tessera                            │
//   │                                    │
//   │ ┌────────┐ ┌────────┐ ┌────────┐   │
//   │ │  Load  │ │ Wiggle │ │  Quit  │   │  ← Tab / Shift+Tab, Enter
//   │ └────────┘ └────────┘ └────────┘   │
//   │ ██████████░░░░░░░░░░░░░░░░░░░░     │
//   │ 60.0 fps  60.0 ups                 │
//   └────────────────────────────────────┘
//
// Esc quits from anywhere. Logs go to `tessera.log` (filter from
// `TESSERA_LOG`, default `info`) so they never touch the screen; timing
// options come from the TOML file named by `TESSERA_CONFIG`.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use tess_engine::{Engine, EngineConfig, EngineError, EngineHandle, Scene};
use tess_term::Color;
use tess_ui::{Component, Easing, ListenerId, Point, Size, tween};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE: &str = "tessera.log";
const LOG_ENV: &str = "TESSERA_LOG";
const CONFIG_ENV: &str = "TESSERA_CONFIG";

/// How much one press of "Load" fills the bar.
const LOAD_STEP: f64 = 0.25;
/// Seconds between rate readouts.
const STATS_PERIOD: f64 = 0.5;

// ─── Menu scene ─────────────────────────────────────────────────────────────

/// Built in `initialize`, attached in `on_enter`, detached in `on_exit`.
struct Menu {
    engine: Option<EngineHandle>,
    panel: Option<Component>,
    buttons: Vec<Component>,
    stats: Option<Component>,
    since_stats: f64,
    escape: Option<ListenerId>,
}

impl Menu {
    const fn new() -> Self {
        Self {
            engine: None,
            panel: None,
            buttons: Vec::new(),
            stats: None,
            since_stats: 0.0,
            escape: None,
        }
    }

    fn button(panel: &Component, x: i32, text: &str) -> Component {
        let button = Component::button(Point::new(x, 3), text).with_fg(Color::White);
        button.set_size(Size::new(10, 3));
        panel.add_child(&button);
        button
    }
}

impl Scene for Menu {
    fn initialize(&mut self, engine: &EngineHandle) {
        let panel = Component::panel(Point::new(2, 1), Size::new(38, 10))
            .with_border_color(Color::Cyan);
        let title = Component::label(Point::new(2, 1), "tessera").with_fg(Color::Yellow);
        let bar = Component::progress_bar(Point::new(2, 6), 30);
        let stats = Component::label(Point::new(2, 7), "").with_fg(Color::Gray);
        for child in [&title, &bar, &stats] {
            panel.add_child(child);
        }

        let load = Self::button(&panel, 2, "Load");
        let wiggle = Self::button(&panel, 13, "Wiggle");
        let quit = Self::button(&panel, 24, "Quit");

        let progress = bar.downgrade();
        load.on_click(move |_| {
            let Some(bar) = progress.upgrade() else { return };
            let current = bar.progress().unwrap_or(0.0);
            let next = if current >= 1.0 { 0.0 } else { current + LOAD_STEP };
            tracing::info!(progress = next, "load step");
            bar.set_progress(next, 0.5);
        });

        let heading = title.downgrade();
        wiggle.on_click(move |_| {
            let Some(title) = heading.upgrade() else { return };
            let home = Point::new(2, 1);
            title.clear_animations();
            title.set_position(Point::new(home.x + 8, home.y));
            title.add_animation(tween::move_to(&title, home, 0.8, Easing::EaseOutBounce));
        });

        let handle = engine.clone();
        quit.on_click(move |_| handle.request_stop());

        self.buttons = vec![load, wiggle, quit];
        self.panel = Some(panel);
        self.stats = Some(stats);
        self.engine = Some(engine.clone());
    }

    fn on_enter(&mut self) {
        let (Some(engine), Some(panel)) = (&self.engine, &self.panel) else {
            return;
        };
        engine.root().add_child(panel);
        for button in &self.buttons {
            engine.focus().register(button.clone());
        }
        let handle = engine.clone();
        self.escape = Some(engine.input().on_escape(move |_| handle.request_stop()));
        tracing::info!("menu entered");
    }

    fn on_update(&mut self, dt: f64) {
        self.since_stats += dt;
        if self.since_stats < STATS_PERIOD {
            return;
        }
        self.since_stats = 0.0;
        if let (Some(stats), Some(engine)) = (&self.stats, &self.engine) {
            stats.set_text(format!(
                "{:>5.1} fps  {:>5.1} ups",
                engine.current_fps(),
                engine.current_update_rate()
            ));
        }
    }

    fn on_exit(&mut self) {
        let Some(engine) = &self.engine else { return };
        if let Some(id) = self.escape.take() {
            engine.input().unsubscribe(id);
        }
        for button in &self.buttons {
            engine.focus().unregister(button);
        }
        if let Some(panel) = &self.panel {
            panel.detach();
        }
        tracing::info!("menu exited");
    }

    fn name(&self) -> &str {
        "menu"
    }
}

// ─── Entry ──────────────────────────────────────────────────────────────────

fn init_logging() -> std::io::Result<()> {
    let file = File::create(LOG_FILE)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_thread_names(true)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn load_config(path: Option<OsString>) -> Result<EngineConfig, EngineError> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn run() -> Result<(), EngineError> {
    let config = load_config(env::var_os(CONFIG_ENV))?;
    tracing::info!(?config, "tessera starting");

    let engine = Engine::with_terminal(config);
    engine.set_initial_scene(Menu::new())?;
    engine.initialize()?;
    engine.start()?;
    engine.wait();
    engine.stop()
}

fn main() -> ExitCode {
    if let Err(e) = init_logging() {
        eprintln!("tessera: cannot open {LOG_FILE}: {e}");
    }

    match run() {
        Ok(()) => {
            tracing::info!("tessera finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(%e, "tessera failed");
            eprintln!("tessera: {e}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
