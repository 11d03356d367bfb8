// SPDX-License-Identifier: MIT
//
// Cell — one character position on the virtual screen.
//
// A cell is a glyph plus a foreground color, a background color, and a
// small set of text attributes. The whole renderer is built around one
// property of this type: two cells are equal exactly when they would look
// the same on screen. The frame buffer compares the incoming cell against
// the stored one and only marks the position dirty when they differ, so
// cells are always replaced wholesale and never patched field by field.
//
// Glyphs are fixed-width. Anything that would not occupy exactly one
// column (control characters, zero-width marks, CJK / emoji wide glyphs)
// is normalized by `Cell::sanitize_glyph` before it is stored.

use unicode_width::UnicodeWidthChar;

use crate::color::Color;

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes, one bit per SGR parameter.
    ///
    /// ```
    /// use tess_term::cell::Attr;
    ///
    /// let style = Attr::BOLD | Attr::UNDERLINE;
    /// assert!(style.contains(Attr::BOLD));
    /// assert!(!style.contains(Attr::INVERSE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1.
        const BOLD      = 1 << 0;
        /// SGR 2.
        const DIM       = 1 << 1;
        /// SGR 3.
        const ITALIC    = 1 << 2;
        /// SGR 4.
        const UNDERLINE = 1 << 3;
        /// SGR 5.
        const BLINK     = 1 << 4;
        /// SGR 7 — swap foreground and background.
        const INVERSE   = 1 << 5;
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// Glyph substituted for characters wider than one column.
pub const WIDE_PLACEHOLDER: char = '?';

/// A single terminal cell.
///
/// ```
/// use tess_term::cell::Cell;
/// use tess_term::color::Color;
///
/// let a = Cell::new('x', Color::Yellow, Color::Black);
/// let b = Cell::EMPTY.with_glyph('x').with_fg(Color::Yellow);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// The character shown at this position.
    pub glyph: char,
    /// Text color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Bold, underline, etc.
    pub attrs: Attr,
}

impl Cell {
    /// A blank cell: space, white on black, no attributes.
    pub const EMPTY: Self = Self {
        glyph: ' ',
        fg: Color::White,
        bg: Color::Black,
        attrs: Attr::empty(),
    };

    /// Create a cell with the given glyph and colors.
    ///
    /// The glyph is normalized with [`sanitize_glyph`](Self::sanitize_glyph).
    #[inline]
    #[must_use]
    pub fn new(glyph: char, fg: Color, bg: Color) -> Self {
        Self {
            glyph: Self::sanitize_glyph(glyph),
            fg,
            bg,
            attrs: Attr::empty(),
        }
    }

    /// Map a character onto exactly one terminal column.
    ///
    /// Control and zero-width characters become a space; double-width
    /// characters become [`WIDE_PLACEHOLDER`].
    #[must_use]
    pub fn sanitize_glyph(glyph: char) -> char {
        if glyph.is_control() {
            return ' ';
        }
        match glyph.width() {
            Some(1) => glyph,
            Some(0) | None => ' ',
            Some(_) => WIDE_PLACEHOLDER,
        }
    }

    // ─── Builders ─────────────────────────────────────────────────────────

    /// Replace the glyph.
    #[inline]
    #[must_use]
    pub fn with_glyph(self, glyph: char) -> Self {
        Self {
            glyph: Self::sanitize_glyph(glyph),
            ..self
        }
    }

    /// Replace the foreground color.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Color) -> Self {
        Self { fg, ..self }
    }

    /// Replace the background color.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Color) -> Self {
        Self { bg, ..self }
    }

    /// Replace the attributes.
    #[inline]
    #[must_use]
    pub const fn with_attrs(self, attrs: Attr) -> Self {
        Self { attrs, ..self }
    }

    // ─── Queries ──────────────────────────────────────────────────────────

    /// Whether this cell is indistinguishable from [`Cell::EMPTY`].
    #[inline]
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    /// Whether two cells share colors and attributes, ignoring the glyph.
    #[inline]
    #[must_use]
    pub fn same_style(self, other: &Self) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.attrs == other.attrs
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
