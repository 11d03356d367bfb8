// SPDX-License-Identifier: MIT
//
// Engine configuration.
//
// Read from TOML. Every field has a default, so an empty file (or no file)
// is a valid configuration, and a file only needs the keys it changes.
//
//   logic_rate = 30          # logic ticks per second, 0 means 60
//   render_rate = 60         # frames per second, 0 means 60
//   join_timeout_ms = 1000   # how long stop() waits for each worker
//   input_poll_ms = 50       # input wait slice, also the lone-ESC timeout
//   spin_threshold_us = 2000 # pacing spins instead of sleeping below this
//   alternate_screen = true
//   background = "black"     # one of the sixteen console colors

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tess_term::Color;
use thiserror::Error;

/// Rate used when a configured rate is zero.
pub const DEFAULT_RATE: u32 = 60;

/// Failure to load an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Timing and terminal settings for an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Logic ticks per second.
    pub logic_rate: u32,
    /// Frames per second.
    pub render_rate: u32,
    pub join_timeout_ms: u64,
    pub input_poll_ms: u64,
    pub spin_threshold_us: u64,
    pub alternate_screen: bool,
    /// Fill color behind the scene.
    pub background: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            logic_rate: DEFAULT_RATE,
            render_rate: DEFAULT_RATE,
            join_timeout_ms: 1000,
            input_poll_ms: 50,
            spin_threshold_us: 2000,
            alternate_screen: true,
            background: Color::Black,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or a value of the
    /// wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    #[must_use]
    pub const fn effective_logic_rate(&self) -> u32 {
        nonzero_rate(self.logic_rate)
    }

    #[must_use]
    pub const fn effective_render_rate(&self) -> u32 {
        nonzero_rate(self.render_rate)
    }

    /// Time budget of one logic tick.
    #[must_use]
    pub fn logic_interval(&self) -> Duration {
        Duration::from_secs(1) / self.effective_logic_rate()
    }

    /// Time budget of one frame.
    #[must_use]
    pub fn render_interval(&self) -> Duration {
        Duration::from_secs(1) / self.effective_render_rate()
    }

    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    #[must_use]
    pub const fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms)
    }

    #[must_use]
    pub const fn spin_threshold(&self) -> Duration {
        Duration::from_micros(self.spin_threshold_us)
    }
}

const fn nonzero_rate(rate: u32) -> u32 {
    if rate == 0 { DEFAULT_RATE } else { rate }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
