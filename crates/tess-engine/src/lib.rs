//! # tess-engine — Engine for tessera
//!
//! Runs a `tess_ui` component tree on a terminal with three threads:
//!
//! - **input** — decodes keys from a `ByteSource` and dispatches them ([`input`])
//! - **logic** — swaps scenes, ticks animations, updates the scene ([`engine`])
//! - **render** — draws the tree and presents changed cells ([`render`])
//!
//! Each loop keeps its own rate ([`pacing`]). Timing and terminal options
//! come from [`config`]; lifecycle misuse is reported through [`error`].
//! Game or UI code plugs in as a [`Scene`].

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod pacing;
pub mod render;
pub mod scene;

pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineHandle, EngineState};
pub use error::EngineError;
pub use input::{InputManager, KeyStroke};
pub use pacing::{FramePacer, RateMeter};
pub use render::{Frame, RenderManager};
pub use scene::Scene;
