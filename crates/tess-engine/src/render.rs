// SPDX-License-Identifier: MIT
//
// Render loop — scene tree to terminal, once per frame.
//
// Each frame either adopts a new terminal size or draws, never both. A
// size change reallocates the frame buffer and notifies resize listeners;
// the next frame then paints everything onto the fresh grid. That way a
// frame is never drawn against stale dimensions, and listeners get one
// tick to re-lay-out before anything is painted.
//
// A drawn frame resets the buffer to the background, draws the root
// component, and presents into a scratch buffer that is handed to the
// backend in one write. Frames with no changed cells write nothing.
//
// The backend lock is held only for the size query and the final write,
// so `Engine::stop` can take it to restore the terminal between frames.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tess_term::terminal::Size;
use tess_term::{Backend, Color, FrameBuffer, PresentStats, Viewport};
use tess_ui::{Component, Observers};

use crate::pacing::{FramePacer, RateMeter};

pub(crate) type SharedBackend = Arc<Mutex<Box<dyn Backend>>>;

/// Outcome of one render tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// The terminal changed size; nothing was drawn.
    Resized(Size),
    Drawn(PresentStats),
}

/// Owns the frame buffer and paints the tree into it.
pub struct RenderManager {
    buffer: FrameBuffer,
    backend: SharedBackend,
    root: Component,
    background: Color,
    fps: Arc<RateMeter>,
    resized: Arc<Observers<Size>>,
    scratch: Vec<u8>,
}

impl RenderManager {
    pub(crate) fn new(
        backend: SharedBackend,
        root: Component,
        background: Color,
        fps: Arc<RateMeter>,
        resized: Arc<Observers<Size>>,
    ) -> Self {
        let size = backend.lock().size();
        Self {
            buffer: FrameBuffer::new(size.cols, size.rows),
            backend,
            root,
            background,
            fps,
            resized,
            scratch: Vec::new(),
        }
    }

    /// The buffer's shared size view.
    #[must_use]
    pub fn viewport(&self) -> Arc<Viewport> {
        self.buffer.viewport()
    }

    /// Produce one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if presenting or writing the frame fails.
    pub fn tick(&mut self) -> io::Result<Frame> {
        let (size, signalled) = {
            let mut backend = self.backend.lock();
            (backend.size(), backend.take_resize())
        };

        if signalled || size != self.buffer.size() {
            self.buffer.set_dimension(size.cols, size.rows);
            self.buffer.clear();
            tracing::debug!(cols = size.cols, rows = size.rows, "terminal resized");
            self.resized.emit(&size);
            return Ok(Frame::Resized(size));
        }

        self.buffer.flush();
        if self.background != Color::Black {
            self.buffer.fill_rect(
                0,
                0,
                i32::from(size.cols),
                i32::from(size.rows),
                ' ',
                Color::White,
                self.background,
            );
        }
        self.root.draw(&mut self.buffer);

        self.scratch.clear();
        let stats = self.buffer.present_to(&mut self.scratch)?;
        if !self.scratch.is_empty() {
            self.backend.lock().write_frame(&self.scratch)?;
        }
        tracing::trace!(
            rendered = stats.cells_rendered,
            skipped = stats.cells_skipped,
            bytes = stats.bytes_written,
            "frame"
        );
        Ok(Frame::Drawn(stats))
    }

    /// Render at the pacer's rate until `cancel` is raised.
    pub(crate) fn run(mut self, mut pacer: FramePacer, cancel: &AtomicBool) {
        tracing::debug!(interval = ?pacer.interval(), "render loop started");
        while !cancel.load(Ordering::Acquire) {
            let dt = pacer.tick();
            self.fps.record(dt);
            if let Err(err) = self.tick() {
                tracing::error!(%err, "present failed");
                self.buffer.clear();
            }
            pacer.wait(cancel);
        }
        tracing::debug!("render loop finished");
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
