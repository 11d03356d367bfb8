// SPDX-License-Identifier: MIT
//
// Input — keys from a byte source to listeners.
//
// The input thread waits on a `ByteSource` in short slices so it notices
// cancellation promptly, feeds whatever arrives to a `KeyDecoder`, and
// dispatches each key synchronously on its own thread. A quiet slice
// with bytes still held by the decoder means a lone ESC (or a sequence
// cut short), so the decoder is flushed then. The slice length is
// therefore also the Escape key latency.
//
// Dispatch order for one key: every `on_key` listener, then the listeners
// of the matching special key (`on_escape`, `on_enter`, `on_space`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tess_term::{ByteSource, KeyCode, KeyDecoder, KeyEvent, Modifiers};
use tess_ui::{ListenerId, Observers};

/// A key as delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: KeyCode,
    pub modifiers: Modifiers,
    /// When the key was decoded.
    pub timestamp: Instant,
}

impl KeyStroke {
    #[must_use]
    pub fn new(event: KeyEvent) -> Self {
        Self {
            key: event.code,
            modifiers: event.modifiers,
            timestamp: Instant::now(),
        }
    }

    /// The character the key types, if any.
    #[must_use]
    pub const fn character(&self) -> Option<char> {
        KeyEvent::with(self.key, self.modifiers).character()
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    #[must_use]
    pub const fn control(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Shift+Tab.
    #[must_use]
    pub const fn is_back_tab(&self) -> bool {
        KeyEvent::with(self.key, self.modifiers).is_back_tab()
    }
}

/// Key listener registries.
#[derive(Debug, Default)]
pub struct InputManager {
    keys: Observers<KeyStroke>,
    escape: Observers<KeyStroke>,
    enter: Observers<KeyStroke>,
    space: Observers<KeyStroke>,
}

impl InputManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key.
    pub fn on_key(&self, f: impl Fn(&KeyStroke) + Send + Sync + 'static) -> ListenerId {
        self.keys.subscribe(f)
    }

    pub fn on_escape(&self, f: impl Fn(&KeyStroke) + Send + Sync + 'static) -> ListenerId {
        self.escape.subscribe(f)
    }

    pub fn on_enter(&self, f: impl Fn(&KeyStroke) + Send + Sync + 'static) -> ListenerId {
        self.enter.subscribe(f)
    }

    pub fn on_space(&self, f: impl Fn(&KeyStroke) + Send + Sync + 'static) -> ListenerId {
        self.space.subscribe(f)
    }

    /// Remove a listener from whichever registry holds it.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        [&self.keys, &self.escape, &self.enter, &self.space]
            .into_iter()
            .any(|registry| registry.unsubscribe(id))
    }

    /// Drop every listener.
    pub fn clear(&self) {
        self.keys.clear();
        self.escape.clear();
        self.enter.clear();
        self.space.clear();
    }

    /// Deliver one key to the listeners, on the calling thread.
    pub fn dispatch(&self, stroke: &KeyStroke) {
        self.keys.emit(stroke);
        match stroke.key {
            KeyCode::Escape => self.escape.emit(stroke),
            KeyCode::Enter => self.enter.emit(stroke),
            KeyCode::Char(' ') => self.space.emit(stroke),
            _ => {}
        }
    }

    /// Read keys from `source` until `cancel` is raised or the source
    /// closes.
    pub fn run(&self, source: &mut dyn ByteSource, poll: Duration, cancel: &AtomicBool) {
        let mut decoder = KeyDecoder::new();
        tracing::debug!("input loop started");

        while !cancel.load(Ordering::Acquire) {
            let keys = match source.read_timeout(poll) {
                Ok(Some(bytes)) => decoder.feed(&bytes),
                Ok(None) if decoder.has_pending() => decoder.flush(),
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(%err, "input source closed");
                    break;
                }
            };
            for key in keys {
                if cancel.load(Ordering::Acquire) {
                    break;
                }
                self.dispatch(&KeyStroke::new(key));
            }
        }

        tracing::debug!("input loop finished");
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
