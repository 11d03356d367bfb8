// SPDX-License-Identifier: MIT
//
// Engine errors.
//
// Lifecycle calls made in the wrong order come back as distinct variants
// rather than panics; `is_invalid_operation` lumps them together for
// callers that only care whether the call was legal. Everything else is
// I/O underneath: the terminal, a worker thread that would not spawn, or
// a config file.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine is already initialized")]
    AlreadyInitialized,

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine has been stopped and cannot be restarted")]
    Stopped,

    #[error("cannot replace the initial scene while the engine is running")]
    SceneWhileRunning,

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to spawn the {name} thread")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Whether this is a lifecycle call made in the wrong state.
    #[must_use]
    pub const fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInitialized
                | Self::NotInitialized
                | Self::AlreadyRunning
                | Self::Stopped
                | Self::SceneWhileRunning
        )
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
