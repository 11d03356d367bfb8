// SPDX-License-Identifier: MIT
//
// Key decoding — raw stdin bytes to key events.
//
// Only the keyboard is enabled on the terminal, so the decoder handles:
//
//   - printable ASCII and UTF-8 characters
//   - C0 control bytes (Ctrl+letter, Enter, Tab, Backspace)
//   - CSI sequences with letter finals (arrows, Home/End, F1–F4, BackTab)
//     and tilde finals (editing keys, F5–F12) plus xterm modifiers
//   - SS3 sequences (application-mode arrows, F1–F4)
//   - Alt+key as ESC followed by a key
//
// Escape sequences can straddle two reads, so incomplete input stays in
// an internal buffer until more bytes arrive. A lone ESC is ambiguous
// (Escape key or the first byte of a sequence); it is held back until the
// caller sees a quiet poll and calls `KeyDecoder::flush`.
//
// Anything recognizably a sequence but not a key (mouse reports, focus
// reports, unknown CSI finals) is consumed and dropped.

use bitflags::bitflags;

// ─── Key Types ───────────────────────────────────────────────────────────────

/// Identity of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character.
    Char(char),
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    /// F1 through F12.
    F(u8),
}

bitflags! {
    /// Modifier keys held with a key.
    ///
    /// Bit layout matches xterm's modifier parameter (`param = 1 + bits`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
    }
}

/// One decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A key with no modifiers.
    #[inline]
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// A key with the given modifiers.
    #[inline]
    #[must_use]
    pub const fn with(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// The character this key types, if any.
    ///
    /// Enter and Tab report `'\r'` and `'\t'`.
    #[must_use]
    pub const fn character(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) => Some(c),
            KeyCode::Enter => Some('\r'),
            KeyCode::Tab => Some('\t'),
            _ => None,
        }
    }

    /// Shift+Tab, which most terminals report as `CSI Z`.
    #[inline]
    #[must_use]
    pub const fn is_back_tab(&self) -> bool {
        matches!(self.code, KeyCode::Tab) && self.modifiers.contains(Modifiers::SHIFT)
    }
}

// ─── Decoder ─────────────────────────────────────────────────────────────────

/// Incremental byte-to-key decoder.
///
/// ```
/// use tess_term::input::{KeyCode, KeyDecoder, KeyEvent};
///
/// let mut dec = KeyDecoder::new();
/// assert_eq!(dec.feed(b"a\x1b[A"), vec![
///     KeyEvent::plain(KeyCode::Char('a')),
///     KeyEvent::plain(KeyCode::Up),
/// ]);
///
/// // A lone ESC waits for the caller's timeout.
/// assert!(dec.feed(b"\x1b").is_empty());
/// assert_eq!(dec.flush(), vec![KeyEvent::plain(KeyCode::Escape)]);
/// ```
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
}

impl KeyDecoder {
    /// A decoder with nothing buffered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(32),
        }
    }

    /// Append `bytes` and decode every complete key in the buffer.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyEvent> {
        self.pending.extend_from_slice(bytes);
        let mut keys = Vec::new();
        let mut at = 0;

        while at < self.pending.len() {
            match decode_one(&self.pending[at..]) {
                Step::Key(key, used) => {
                    keys.push(key);
                    at += used;
                }
                Step::Drop(used) => at += used,
                Step::NeedMore => break,
            }
        }

        self.pending.drain(..at);
        keys
    }

    /// Whether bytes are held back waiting for the rest of a sequence.
    #[inline]
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Give up waiting and emit whatever is held back as plain keys.
    ///
    /// A lone ESC becomes Escape; a truncated sequence degrades to the
    /// keys its bytes spell.
    pub fn flush(&mut self) -> Vec<KeyEvent> {
        let keys = self
            .pending
            .iter()
            .filter_map(|&b| match b {
                0x1B => Some(KeyEvent::plain(KeyCode::Escape)),
                _ => single_byte(b),
            })
            .collect();
        self.pending.clear();
        keys
    }
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Outcome of decoding at the head of the buffer.
enum Step {
    /// A key, and how many bytes it used.
    Key(KeyEvent, usize),
    /// Bytes that decode to nothing.
    Drop(usize),
    /// The buffer ends mid-sequence.
    NeedMore,
}

fn decode_one(bytes: &[u8]) -> Step {
    match bytes[0] {
        0x1B => decode_escape(bytes),
        0xC0..=0xF7 => decode_utf8(bytes),
        b => single_byte(b).map_or(Step::Drop(1), |key| Step::Key(key, 1)),
    }
}

/// Keys that are exactly one byte (ASCII and C0 controls).
const fn single_byte(b: u8) -> Option<KeyEvent> {
    let key = match b {
        0x09 => KeyEvent::plain(KeyCode::Tab),
        0x0A | 0x0D => KeyEvent::plain(KeyCode::Enter),
        0x08 | 0x7F => KeyEvent::plain(KeyCode::Backspace),
        0x00 => KeyEvent::with(KeyCode::Char('@'), Modifiers::CTRL),
        0x01..=0x1A => KeyEvent::with(KeyCode::Char((b - 1 + b'a') as char), Modifiers::CTRL),
        0x20..=0x7E => KeyEvent::plain(KeyCode::Char(b as char)),
        _ => return None,
    };
    Some(key)
}

fn decode_escape(bytes: &[u8]) -> Step {
    let Some(&second) = bytes.get(1) else {
        return Step::NeedMore;
    };
    match second {
        b'[' => decode_csi(bytes),
        b'O' => decode_ss3(bytes),
        0x1B => Step::Key(KeyEvent::with(KeyCode::Escape, Modifiers::ALT), 2),
        b => match single_byte(b) {
            Some(key) => Step::Key(
                KeyEvent::with(key.code, key.modifiers | Modifiers::ALT),
                2,
            ),
            None => Step::Key(KeyEvent::plain(KeyCode::Escape), 1),
        },
    }
}

fn decode_csi(bytes: &[u8]) -> Step {
    // Parameter and intermediate bytes run until a final in 0x40..=0x7E.
    let mut end = 2;
    loop {
        let Some(&b) = bytes.get(end) else {
            return Step::NeedMore;
        };
        match b {
            0x40..=0x7E => break,
            0x20..=0x3F => end += 1,
            _ => return Step::Drop(end + 1),
        }
    }

    let used = end + 1;
    let params = &bytes[2..end];
    // Private-marker sequences (mouse `<`, DEC `?`) are never keys.
    if params.first().is_some_and(|b| matches!(b, b'<' | b'=' | b'>' | b'?')) {
        return Step::Drop(used);
    }

    let (first, second) = two_params(params);
    let modifiers = modifiers_param(second);

    let code = match bytes[end] {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        b'Z' => return Step::Key(KeyEvent::with(KeyCode::Tab, Modifiers::SHIFT), used),
        b'~' => match tilde_key(first) {
            Some(code) => code,
            None => return Step::Drop(used),
        },
        _ => return Step::Drop(used),
    };
    Step::Key(KeyEvent::with(code, modifiers), used)
}

const fn tilde_key(n: u16) -> Option<KeyCode> {
    let code = match n {
        1 | 7 => KeyCode::Home,
        2 => KeyCode::Insert,
        3 => KeyCode::Delete,
        4 | 8 => KeyCode::End,
        5 => KeyCode::PageUp,
        6 => KeyCode::PageDown,
        15 => KeyCode::F(5),
        17 => KeyCode::F(6),
        18 => KeyCode::F(7),
        19 => KeyCode::F(8),
        20 => KeyCode::F(9),
        21 => KeyCode::F(10),
        23 => KeyCode::F(11),
        24 => KeyCode::F(12),
        _ => return None,
    };
    Some(code)
}

fn decode_ss3(bytes: &[u8]) -> Step {
    let Some(&last) = bytes.get(2) else {
        return Step::NeedMore;
    };
    let code = match last {
        b'A' => KeyCode::Up,
        b'B' => KeyCode::Down,
        b'C' => KeyCode::Right,
        b'D' => KeyCode::Left,
        b'H' => KeyCode::Home,
        b'F' => KeyCode::End,
        b'P' => KeyCode::F(1),
        b'Q' => KeyCode::F(2),
        b'R' => KeyCode::F(3),
        b'S' => KeyCode::F(4),
        _ => return Step::Drop(3),
    };
    Step::Key(KeyEvent::plain(code), 3)
}

fn decode_utf8(bytes: &[u8]) -> Step {
    let len = match bytes[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    };
    if bytes.len() < len {
        // Only wait if what we have so far is a valid prefix.
        return if bytes[1..].iter().all(|b| b & 0xC0 == 0x80) {
            Step::NeedMore
        } else {
            Step::Drop(1)
        };
    }
    std::str::from_utf8(&bytes[..len])
        .ok()
        .and_then(|s| s.chars().next())
        .map_or(Step::Drop(1), |ch| {
            Step::Key(KeyEvent::plain(KeyCode::Char(ch)), len)
        })
}

// ─── Parameters ──────────────────────────────────────────────────────────────

/// First two `;`-separated numeric parameters (missing ones are 0).
fn two_params(raw: &[u8]) -> (u16, u16) {
    let mut fields = raw.split(|&b| b == b';').map(|field| {
        field
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .fold(0u16, |acc, &d| {
                acc.saturating_mul(10).saturating_add(u16::from(d - b'0'))
            })
    });
    let first = fields.next().unwrap_or(0);
    let second = fields.next().unwrap_or(0);
    (first, second)
}

/// Decode xterm's `1 + bitmask` modifier parameter.
#[allow(clippy::cast_possible_truncation)] // Only the low bits carry flags.
const fn modifiers_param(param: u16) -> Modifiers {
    Modifiers::from_bits_truncate(param.saturating_sub(1) as u8)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
