// SPDX-License-Identifier: MIT
//
// Output buffering and stateful cell emission.
//
//   OutputBuffer — collects a whole frame of ANSI bytes in memory so the
//   frame reaches the terminal in one write. Small scattered writes let
//   the terminal render half a frame; one write does not.
//
//   CellWriter — remembers where the terminal cursor is and which colors
//   and attributes are active, and emits only the sequences that change
//   something. A run of same-colored cells on one row costs one cursor
//   move, one SGR, and the glyphs.

use std::io::{self, Write};

use crate::ansi;
use crate::cell::{Attr, Cell};
use crate::color::Color;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// Frame-sized byte buffer flushed with a single `write_all`.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with 16 KB of capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written since the last flush.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a character as UTF-8.
    #[inline]
    pub fn push_char(&mut self, ch: char) {
        let mut enc = [0u8; 4];
        self.buf
            .extend_from_slice(ch.encode_utf8(&mut enc).as_bytes());
    }

    /// Drop the contents, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write everything to `w` in one call, flush `w`, and clear.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to or flushing `w` fails. The buffer
    /// is cleared either way so a failed frame is not replayed.
    pub fn flush_to(&mut self, w: &mut (impl Write + ?Sized)) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let result = w.write_all(&self.buf).and_then(|()| w.flush());
        self.buf.clear();
        result
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Real flushing goes through flush_to.
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── CellWriter ──────────────────────────────────────────────────────────────

/// Emits cells while tracking terminal state to skip redundant escapes.
///
/// - **Cursor**: skipped when the cell is directly right of the last one
///   written on the same row (the terminal auto-advances).
/// - **Colors**: one combined `ESC[{fg};{bg}m` when either color changes.
/// - **Attributes**: on change, SGR 0 then the new set, which also forces
///   the colors to be re-emitted.
#[allow(clippy::struct_field_names)] // The `last_` prefix is the grouping.
pub struct CellWriter {
    last_x: i32,
    last_y: i32,
    last_fg: Option<Color>,
    last_bg: Option<Color>,
    last_attrs: Attr,
}

impl CellWriter {
    /// A writer that assumes nothing about the terminal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_x: -1,
            last_y: -1,
            last_fg: None,
            last_bg: None,
            last_attrs: Attr::empty(),
        }
    }

    /// Forget all tracked state. Call after a reset or screen clear.
    #[allow(clippy::missing_const_for_fn)]
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }

    /// Emit one cell at `(x, y)`.
    pub fn render_cell(&mut self, out: &mut OutputBuffer, x: u16, y: u16, cell: &Cell) {
        let xi = i32::from(x);
        let yi = i32::from(y);

        if yi != self.last_y || xi != self.last_x + 1 {
            ansi::cursor_to(out, x, y).ok();
        }

        if cell.attrs != self.last_attrs {
            if !self.last_attrs.is_empty() {
                ansi::reset(out).ok();
                self.last_fg = None;
                self.last_bg = None;
            }
            ansi::attrs(out, cell.attrs).ok();
            self.last_attrs = cell.attrs;
        }

        if self.last_fg != Some(cell.fg) || self.last_bg != Some(cell.bg) {
            ansi::colors(out, cell.fg, cell.bg).ok();
            self.last_fg = Some(cell.fg);
            self.last_bg = Some(cell.bg);
        }

        out.push_char(cell.glyph);

        self.last_x = xi;
        self.last_y = yi;
    }
}

impl Default for CellWriter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn written(out: &OutputBuffer) -> String {
        String::from_utf8(out.as_bytes().to_vec()).unwrap()
    }

    // ── OutputBuffer ────────────────────────────────────────────────────

    #[test]
    fn new_buffer_is_empty() {
        let buf = OutputBuffer::new();
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn write_trait_appends() {
        let mut buf = OutputBuffer::new();
        write!(buf, "row {}", 7).unwrap();
        assert_eq!(buf.as_bytes(), b"row 7");
    }

    #[test]
    fn push_char_encodes_utf8() {
        let mut buf = OutputBuffer::new();
        buf.push_char('┌');
        buf.push_char('a');
        assert_eq!(buf.as_bytes(), "┌a".as_bytes());
    }

    #[test]
    fn flush_to_moves_bytes_and_clears() {
        let mut buf = OutputBuffer::new();
        buf.push_char('x');
        let mut sink = Vec::new();
        buf.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"x");
        assert!(buf.is_empty());
    }

    #[test]
    fn flush_to_empty_writes_nothing() {
        let mut buf = OutputBuffer::new();
        let mut sink = Vec::new();
        buf.flush_to(&mut sink).unwrap();
        assert!(sink.is_empty());
    }

    // ── CellWriter: cursor ──────────────────────────────────────────────

    #[test]
    fn first_cell_positions_cursor() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 3, 1, &Cell::EMPTY.with_glyph('a'));
        assert!(written(&out).starts_with("\x1b[2;4H"));
    }

    #[test]
    fn adjacent_cell_skips_cursor_move() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::EMPTY.with_glyph('a'));
        out.clear();
        w.render_cell(&mut out, 1, 0, &Cell::EMPTY.with_glyph('b'));
        assert_eq!(written(&out), "b");
    }

    #[test]
    fn gap_forces_cursor_move() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::EMPTY);
        out.clear();
        w.render_cell(&mut out, 5, 0, &Cell::EMPTY);
        assert_eq!(written(&out), "\x1b[1;6H ");
    }

    #[test]
    fn new_row_forces_cursor_move() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::EMPTY);
        out.clear();
        w.render_cell(&mut out, 1, 1, &Cell::EMPTY);
        assert!(written(&out).starts_with("\x1b[2;2H"));
    }

    // ── CellWriter: color ───────────────────────────────────────────────

    #[test]
    fn first_cell_emits_colors() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::new('x', Color::Red, Color::Blue));
        assert_eq!(written(&out), "\x1b[1;1H\x1b[91;104mx");
    }

    #[test]
    fn unchanged_colors_are_not_repeated() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let cell = Cell::new('x', Color::Red, Color::Blue);
        w.render_cell(&mut out, 0, 0, &cell);
        out.clear();
        w.render_cell(&mut out, 1, 0, &cell.with_glyph('y'));
        assert_eq!(written(&out), "y");
    }

    #[test]
    fn bg_change_alone_emits_both_codes() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let cell = Cell::new('x', Color::Red, Color::Blue);
        w.render_cell(&mut out, 0, 0, &cell);
        out.clear();
        w.render_cell(&mut out, 1, 0, &cell.with_bg(Color::Black));
        assert_eq!(written(&out), "\x1b[91;40mx");
    }

    // ── CellWriter: attributes ──────────────────────────────────────────

    #[test]
    fn attrs_emitted_before_colors() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let cell = Cell::EMPTY.with_attrs(Attr::BOLD).with_glyph('B');
        w.render_cell(&mut out, 0, 0, &cell);
        assert_eq!(written(&out), "\x1b[1;1H\x1b[1m\x1b[97;40mB");
    }

    #[test]
    fn dropping_attrs_resets_and_reemits_colors() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        let bold = Cell::EMPTY.with_attrs(Attr::BOLD);
        w.render_cell(&mut out, 0, 0, &bold);
        out.clear();
        w.render_cell(&mut out, 1, 0, &Cell::EMPTY);
        assert_eq!(written(&out), "\x1b[0m\x1b[97;40m ");
    }

    #[test]
    fn reset_state_forgets_everything() {
        let mut out = OutputBuffer::new();
        let mut w = CellWriter::new();
        w.render_cell(&mut out, 0, 0, &Cell::EMPTY);
        w.reset_state();
        out.clear();
        w.render_cell(&mut out, 1, 0, &Cell::EMPTY);
        assert_eq!(written(&out), "\x1b[1;2H\x1b[97;40m ");
    }
}
