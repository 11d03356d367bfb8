// SPDX-License-Identifier: MIT
//
// ANSI escape sequence encoding.
//
// Stateless writers for every terminal command the toolkit emits. Nothing
// here decides *when* to emit a sequence; the `CellWriter` in `output.rs`
// tracks terminal state for that. This module only knows bytes.
//
// Positions are 0-indexed in our API and converted to the terminal's
// 1-indexed CUP coordinates on the way out.
use std::io::{self, Write};

use crate::cell::Attr;
use crate::color::Color;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to column `x`, row `y` (CUP, `ESC[{row};{col}H`).
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset every SGR attribute and color to the terminal default.
///
/// The `CellWriter` must forget its tracked colors after this.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// Select foreground and background in one SGR sequence: `ESC[{fg};{bg}m`.
#[inline]
pub fn colors(w: &mut impl Write, fg: Color, bg: Color) -> io::Result<()> {
    write!(w, "\x1b[{};{}m", fg.fg_code(), bg.bg_code())
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

/// Emit the SGR parameters for `attr` as a single sequence (`ESC[1;4m`).
///
/// Writes nothing when no attribute is set.
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    const CODES: [(Attr, &[u8]); 6] = [
        (Attr::BOLD, b"1"),
        (Attr::DIM, b"2"),
        (Attr::ITALIC, b"3"),
        (Attr::UNDERLINE, b"4"),
        (Attr::BLINK, b"5"),
        (Attr::INVERSE, b"7"),
    ];

    if attr.is_empty() {
        return Ok(());
    }

    w.write_all(b"\x1b[")?;
    let mut first = true;
    for (flag, code) in CODES {
        if attr.contains(flag) {
            if !first {
                w.write_all(b";")?;
            }
            w.write_all(code)?;
            first = false;
        }
    }
    w.write_all(b"m")
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC private mode 2026).
///
/// Terminals that support it hold the frame until [`end_sync`]; others
/// ignore the sequence.
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

/// End synchronized output.
#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Alternate Screen ────────────────────────────────────────────────────────

/// Switch to the alternate screen buffer (DEC private mode 1049).
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Return to the main screen buffer.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
