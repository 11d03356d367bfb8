// SPDX-License-Identifier: MIT
//
// Color — the sixteen-color console palette.
//
// Every cell carries a foreground and a background drawn from the classic
// console palette: eight dark colors and their eight bright counterparts.
// Each color knows its own SGR parameter for both planes, so the output
// layer never needs a lookup table:
//
//   dark   30–37 (fg)   40–47 (bg)
//   bright 90–97 (fg)  100–107 (bg)
//
// The palette is deliberately closed. Terminals that support more (256,
// truecolor) still render these sixteen consistently, and a closed enum
// keeps `Cell` small and its equality check trivial.
//
// Colors serialize by snake_case name (`dark_gray`, `cyan`) so they can be
// written directly in configuration files.

use serde::{Deserialize, Serialize};

/// One of the sixteen console colors.
///
/// Discriminants follow the conventional console ordering (`Black = 0`
/// through `White = 15`), which is *not* the ANSI ordering; use
/// [`fg_code`](Self::fg_code) / [`bg_code`](Self::bg_code) for output.
///
/// ```
/// use tess_term::color::Color;
///
/// assert_eq!(Color::DarkRed.fg_code(), 31);
/// assert_eq!(Color::Cyan.bg_code(), 106);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Color {
    #[default]
    Black = 0,
    DarkBlue = 1,
    DarkGreen = 2,
    DarkCyan = 3,
    DarkRed = 4,
    DarkMagenta = 5,
    DarkYellow = 6,
    Gray = 7,
    DarkGray = 8,
    Blue = 9,
    Green = 10,
    Cyan = 11,
    Red = 12,
    Magenta = 13,
    Yellow = 14,
    White = 15,
}

impl Color {
    /// All sixteen colors in console order.
    pub const ALL: [Self; 16] = [
        Self::Black,
        Self::DarkBlue,
        Self::DarkGreen,
        Self::DarkCyan,
        Self::DarkRed,
        Self::DarkMagenta,
        Self::DarkYellow,
        Self::Gray,
        Self::DarkGray,
        Self::Blue,
        Self::Green,
        Self::Cyan,
        Self::Red,
        Self::Magenta,
        Self::Yellow,
        Self::White,
    ];

    /// Offset into the ANSI base palette (0 = black … 7 = white).
    const fn ansi_index(self) -> u8 {
        match self {
            Self::Black | Self::DarkGray => 0,
            Self::DarkRed | Self::Red => 1,
            Self::DarkGreen | Self::Green => 2,
            Self::DarkYellow | Self::Yellow => 3,
            Self::DarkBlue | Self::Blue => 4,
            Self::DarkMagenta | Self::Magenta => 5,
            Self::DarkCyan | Self::Cyan => 6,
            Self::Gray | Self::White => 7,
        }
    }

    /// Whether this is one of the eight bright colors.
    #[inline]
    #[must_use]
    pub const fn is_bright(self) -> bool {
        self as u8 >= Self::DarkGray as u8
    }

    /// SGR parameter selecting this color as foreground.
    #[inline]
    #[must_use]
    pub const fn fg_code(self) -> u8 {
        if self.is_bright() {
            90 + self.ansi_index()
        } else {
            30 + self.ansi_index()
        }
    }

    /// SGR parameter selecting this color as background.
    #[inline]
    #[must_use]
    pub const fn bg_code(self) -> u8 {
        if self.is_bright() {
            100 + self.ansi_index()
        } else {
            40 + self.ansi_index()
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
