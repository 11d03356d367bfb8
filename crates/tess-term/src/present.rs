// SPDX-License-Identifier: MIT
//
// Frame presentation — turning dirty cells into one burst of ANSI.
//
// The frame buffer knows *which* cells changed; the presenter knows how
// to say so to a terminal. Per frame:
//
//   1. The buffer walks its dirty grid in row-major order and hands every
//      cell that differs from the last presented frame to `emit`.
//   2. `emit` opens the frame lazily (synchronized-output marker, plus a
//      screen clear on a full repaint) and lets `CellWriter` encode the
//      cell with the fewest escapes it can.
//   3. `finish` resets SGR state, closes the synchronized block, and
//      pushes the whole frame to the writer in one call.
//
// A frame in which nothing changed never opens, so it writes zero bytes.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::Cell;
use crate::output::{CellWriter, OutputBuffer};

// ─── PresentStats ────────────────────────────────────────────────────────────

/// What a single present pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentStats {
    /// Dirty cells that differed from the terminal and were written.
    pub cells_rendered: usize,
    /// Dirty cells that turned out identical to the terminal and were skipped.
    pub cells_skipped: usize,
    /// Bytes handed to the writer.
    pub bytes_written: usize,
}

impl PresentStats {
    /// Dirty cells visited (rendered + skipped).
    #[inline]
    #[must_use]
    pub const fn dirty_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── Presenter ───────────────────────────────────────────────────────────────

/// Encoder state for one frame buffer's output stream.
pub struct Presenter {
    output: OutputBuffer,
    writer: CellWriter,
    open: bool,
    clear_first: bool,
}

impl Presenter {
    /// A presenter with an empty output buffer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            writer: CellWriter::new(),
            open: false,
            clear_first: false,
        }
    }

    /// Start a frame. Nothing is written until the first [`emit`](Self::emit).
    pub fn begin(&mut self, full_repaint: bool) {
        self.output.clear();
        self.writer.reset_state();
        self.open = false;
        self.clear_first = full_repaint;
    }

    /// Encode one changed cell.
    pub fn emit(&mut self, x: u16, y: u16, cell: &Cell) {
        if !self.open {
            ansi::begin_sync(&mut self.output).ok();
            if self.clear_first {
                ansi::reset(&mut self.output).ok();
                ansi::clear_screen(&mut self.output).ok();
            }
            self.open = true;
        }
        self.writer.render_cell(&mut self.output, x, y, cell);
    }

    /// Close the frame and write it to `w` in one call.
    ///
    /// Returns the number of bytes written (0 if the frame never opened).
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn finish(&mut self, w: &mut (impl Write + ?Sized)) -> io::Result<usize> {
        if !self.open {
            return Ok(0);
        }
        ansi::reset(&mut self.output).ok();
        ansi::end_sync(&mut self.output).ok();
        self.open = false;

        let bytes = self.output.len();
        self.output.flush_to(w)?;
        Ok(bytes)
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
