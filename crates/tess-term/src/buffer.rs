// SPDX-License-Identifier: MIT
//
// FrameBuffer — the virtual screen every component paints into.
//
// Three flat row-major grids of the same size:
//
//   cells  — what the current frame says each position should show.
//   dirty  — set whenever a write changed `cells` at that position.
//   front  — what was last presented, i.e. what the terminal shows now.
//
// Painting only touches `cells` and `dirty`. Presenting walks the dirty
// positions, skips the ones whose cell already matches `front`, emits the
// rest, and copies them into `front`. A UI that redraws everything every
// frame (the render loop flushes and repaints the whole tree) therefore
// still sends only the cells that actually changed.
//
// Resizing: the render thread owns the buffer, but other threads need to
// know its size and whether a reallocation is in progress. That lives in
// a shared `Viewport` of atomics. While its resizing flag is up every
// draw and present call is a silent no-op.
//
// Coordinates are signed. Components positioned partly or fully off
// screen paint without any bounds arithmetic of their own; positions
// outside the grid are dropped here.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::cell::Cell;
use crate::color::Color;
use crate::present::{PresentStats, Presenter};
use crate::terminal::Size;

// ─── Box Glyphs ──────────────────────────────────────────────────────────────

const TOP_LEFT: char = '┌';
const TOP_RIGHT: char = '┐';
const BOTTOM_LEFT: char = '└';
const BOTTOM_RIGHT: char = '┘';
const HORIZONTAL: char = '─';
const VERTICAL: char = '│';

// ─── Viewport ────────────────────────────────────────────────────────────────

/// Buffer dimensions and resize state, readable from any thread.
#[derive(Debug, Default)]
pub struct Viewport {
    width: AtomicU16,
    height: AtomicU16,
    resizing: AtomicBool,
}

impl Viewport {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width: AtomicU16::new(width),
            height: AtomicU16::new(height),
            resizing: AtomicBool::new(false),
        }
    }

    /// Whether the owning buffer is being reallocated right now.
    #[inline]
    #[must_use]
    pub fn is_resizing(&self) -> bool {
        self.resizing.load(Ordering::Acquire)
    }

    /// Current buffer size, or `None` while a resize is in progress.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        if self.is_resizing() {
            return None;
        }
        let size = Size {
            cols: self.width.load(Ordering::Acquire),
            rows: self.height.load(Ordering::Acquire),
        };
        // A resize may have started between the two loads.
        if self.is_resizing() {
            return None;
        }
        Some(size)
    }

    fn begin_resize(&self) {
        self.resizing.store(true, Ordering::Release);
    }

    fn end_resize(&self, width: u16, height: u16) {
        self.width.store(width, Ordering::Release);
        self.height.store(height, Ordering::Release);
        self.resizing.store(false, Ordering::Release);
    }
}

// ─── FrameBuffer ─────────────────────────────────────────────────────────────

/// Dirty-tracked cell grid with diffing presentation.
///
/// ```
/// use tess_term::buffer::FrameBuffer;
/// use tess_term::color::Color;
///
/// let mut buf = FrameBuffer::new(20, 5);
/// buf.draw_text(1, 1, "hi", Color::Yellow, Color::Black);
/// assert_eq!(buf.get(2, 1).map(|c| c.glyph), Some('i'));
///
/// let mut out = Vec::new();
/// buf.present_to(&mut out)?;
/// assert!(!out.is_empty());
///
/// // Nothing changed since: the next present writes nothing.
/// out.clear();
/// buf.present_to(&mut out)?;
/// assert!(out.is_empty());
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
    dirty: Vec<bool>,
    front: Vec<Cell>,
    full_repaint: bool,
    viewport: Arc<Viewport>,
    presenter: Presenter,
}

impl FrameBuffer {
    // ─── Construction ────────────────────────────────────────────────────

    /// Allocate a `width` × `height` buffer of empty cells.
    ///
    /// Every cell starts dirty and the first present repaints the screen.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        let area = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            cells: vec![Cell::EMPTY; area],
            dirty: vec![true; area],
            front: vec![Cell::EMPTY; area],
            full_repaint: true,
            viewport: Arc::new(Viewport::new(width, height)),
            presenter: Presenter::new(),
        }
    }

    /// Width in columns.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Both dimensions.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size {
            cols: self.width,
            rows: self.height,
        }
    }

    /// Shared handle to this buffer's size and resize flag.
    #[must_use]
    pub fn viewport(&self) -> Arc<Viewport> {
        Arc::clone(&self.viewport)
    }

    /// Reallocate to `width` × `height`.
    ///
    /// The viewport reports a resize for the duration. The new buffer is
    /// empty and the next present repaints the whole screen.
    pub fn set_dimension(&mut self, width: u16, height: u16) {
        self.viewport.begin_resize();

        let area = usize::from(width) * usize::from(height);
        self.width = width;
        self.height = height;
        self.cells = vec![Cell::EMPTY; area];
        self.dirty = vec![true; area];
        self.front = vec![Cell::EMPTY; area];
        self.full_repaint = true;

        self.viewport.end_resize(width, height);
        tracing::debug!(width, height, "frame buffer resized");
    }

    // ─── Whole-Frame Reset ───────────────────────────────────────────────

    /// Empty every cell and force a full repaint on the next present.
    pub fn clear(&mut self) {
        self.reset_cells();
        self.full_repaint = true;
    }

    /// Empty every cell and mark everything dirty.
    ///
    /// Unlike [`clear`](Self::clear) the terminal is not wiped: present
    /// still skips cells that end up identical to what is on screen.
    /// This is the per-frame reset before the tree redraws itself.
    pub fn flush(&mut self) {
        self.reset_cells();
    }

    fn reset_cells(&mut self) {
        if self.viewport.is_resizing() {
            return;
        }
        self.cells.fill(Cell::EMPTY);
        self.dirty.fill(true);
    }

    // ─── Cell Access ─────────────────────────────────────────────────────

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        let width = usize::from(self.width);
        (x < width && y < usize::from(self.height)).then(|| y * width + x)
    }

    /// Whether `(x, y)` lies inside the buffer.
    #[inline]
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some()
    }

    /// The cell at `(x, y)`, or `None` out of bounds.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Whether `(x, y)` changed since the last present.
    #[must_use]
    pub fn is_dirty(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.dirty[i])
    }

    /// Number of dirty positions.
    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().filter(|&&d| d).count()
    }

    /// Store `cell` at `(x, y)`.
    ///
    /// Returns `true` if the stored cell changed (and was marked dirty).
    /// Out-of-bounds positions and writes during a resize do nothing.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if self.viewport.is_resizing() {
            return false;
        }
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.cells[i] == cell {
            return false;
        }
        self.cells[i] = cell;
        self.dirty[i] = true;
        true
    }

    // ─── Drawing ─────────────────────────────────────────────────────────

    /// Write `text` left to right starting at `(x, y)`, one cell per char.
    ///
    /// No wrapping: characters past the right edge are dropped.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, fg: Color, bg: Color) {
        let right = i32::from(self.width);
        let mut col = x;
        for ch in text.chars() {
            if col >= right {
                break;
            }
            self.set_cell(col, y, Cell::new(ch, fg, bg));
            col = col.saturating_add(1);
        }
    }

    /// Outline a `width` × `height` box with single-line box glyphs.
    ///
    /// Corners are written last, so a one-column or one-row box shows
    /// corner glyphs at its ends.
    pub fn draw_box(&mut self, x: i32, y: i32, width: i32, height: i32, fg: Color, bg: Color) {
        if width < 1 || height < 1 {
            return;
        }
        let right = x.saturating_add(width - 1);
        let bottom = y.saturating_add(height - 1);

        for col in x.saturating_add(1)..right {
            self.set_cell(col, y, Cell::new(HORIZONTAL, fg, bg));
            self.set_cell(col, bottom, Cell::new(HORIZONTAL, fg, bg));
        }
        for row in y.saturating_add(1)..bottom {
            self.set_cell(x, row, Cell::new(VERTICAL, fg, bg));
            self.set_cell(right, row, Cell::new(VERTICAL, fg, bg));
        }

        self.set_cell(x, y, Cell::new(TOP_LEFT, fg, bg));
        self.set_cell(right, y, Cell::new(TOP_RIGHT, fg, bg));
        self.set_cell(x, bottom, Cell::new(BOTTOM_LEFT, fg, bg));
        self.set_cell(right, bottom, Cell::new(BOTTOM_RIGHT, fg, bg));
    }

    /// Fill a `width` × `height` rectangle, clipped to the buffer.
    #[allow(clippy::too_many_arguments)] // Rect + glyph + two colors.
    pub fn fill_rect(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        glyph: char,
        fg: Color,
        bg: Color,
    ) {
        if width <= 0 || height <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(width).min(i32::from(self.width));
        let y1 = y.saturating_add(height).min(i32::from(self.height));

        let cell = Cell::new(glyph, fg, bg);
        for row in y0..y1 {
            for col in x0..x1 {
                self.set_cell(col, row, cell);
            }
        }
    }

    // ─── Presentation ────────────────────────────────────────────────────

    /// Send every changed cell to `w` as one ANSI burst.
    ///
    /// Clears all dirty bits. Writes nothing if no dirty cell differs
    /// from what is on screen, or while a resize is in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The dirty bits are
    /// already cleared by then, so call [`clear`](Self::clear) to force
    /// a repaint after a failed frame.
    pub fn present_to(&mut self, w: &mut (impl Write + ?Sized)) -> io::Result<PresentStats> {
        let mut stats = PresentStats::default();
        if self.viewport.is_resizing() {
            return Ok(stats);
        }

        let full = self.full_repaint;
        self.presenter.begin(full);

        let width = usize::from(self.width);
        for (i, dirty) in self.dirty.iter_mut().enumerate() {
            if !*dirty {
                continue;
            }
            *dirty = false;

            let cell = self.cells[i];
            if !full && self.front[i] == cell {
                stats.cells_skipped += 1;
                continue;
            }

            // Both quotients are below the u16 dimensions.
            #[allow(clippy::cast_possible_truncation)]
            let (x, y) = ((i % width) as u16, (i / width) as u16);
            self.presenter.emit(x, y, &cell);
            self.front[i] = cell;
            stats.cells_rendered += 1;
        }

        self.full_repaint = false;
        stats.bytes_written = self.presenter.finish(w)?;

        tracing::trace!(
            rendered = stats.cells_rendered,
            skipped = stats.cells_skipped,
            bytes = stats.bytes_written,
            "frame presented"
        );
        Ok(stats)
    }

    /// [`present_to`](Self::present_to) on locked stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn present(&mut self) -> io::Result<PresentStats> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.present_to(&mut lock)
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dirty", &self.dirty_count())
            .field("full_repaint", &self.full_repaint)
            .finish_non_exhaustive()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
