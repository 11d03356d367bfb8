// SPDX-License-Identifier: MIT
//
// tess-term key viewer — the terminal layer with no engine on top.
//
// Terminal → StdinSource → KeyDecoder → FrameBuffer → one write per frame.
// Press keys to see how they decode; resize to watch the buffer follow.
// Ctrl-Q quits.
//
// Usage:
//   cargo run -p tess-term --example keys

use std::collections::VecDeque;
use std::time::Duration;

use tess_term::buffer::FrameBuffer;
use tess_term::color::Color;
use tess_term::input::{KeyCode, KeyDecoder, KeyEvent, Modifiers};
use tess_term::reader::{ByteSource, StdinSource};
use tess_term::terminal::{Backend, Terminal};

const HISTORY: usize = 64;

fn describe(key: &KeyEvent) -> String {
    let mut parts = Vec::new();
    if key.modifiers.contains(Modifiers::CTRL) {
        parts.push("Ctrl".to_owned());
    }
    if key.modifiers.contains(Modifiers::ALT) {
        parts.push("Alt".to_owned());
    }
    if key.modifiers.contains(Modifiers::SHIFT) {
        parts.push("Shift".to_owned());
    }
    parts.push(match key.code {
        KeyCode::Char(' ') => "Space".to_owned(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    });
    parts.join("+")
}

fn paint(buf: &mut FrameBuffer, history: &VecDeque<String>) {
    let w = i32::from(buf.width());
    let h = i32::from(buf.height());
    buf.flush();
    buf.fill_rect(0, 0, w, 1, ' ', Color::Black, Color::DarkCyan);
    buf.draw_text(1, 0, "tess-term keys  (Ctrl-Q quits)", Color::Black, Color::DarkCyan);
    buf.draw_box(0, 1, w, h - 1, Color::DarkGray, Color::Black);

    let rows = usize::try_from(h - 3).unwrap_or(0);
    for (row, line) in (2..).zip(history.iter().rev().take(rows)) {
        buf.draw_text(2, row, line, Color::White, Color::Black);
    }
}

fn main() -> std::io::Result<()> {
    let mut term = Terminal::new();
    term.enter()?;

    let size = term.size();
    let mut buf = FrameBuffer::new(size.cols, size.rows);
    let mut source = StdinSource::new();
    let mut decoder = KeyDecoder::new();
    let mut history = VecDeque::with_capacity(HISTORY);
    let mut frame = Vec::new();

    'run: loop {
        let keys = match source.read_timeout(Duration::from_millis(50))? {
            Some(bytes) => decoder.feed(&bytes),
            None => decoder.flush(),
        };
        for key in keys {
            if key == KeyEvent::with(KeyCode::Char('q'), Modifiers::CTRL) {
                break 'run;
            }
            if history.len() == HISTORY {
                history.pop_front();
            }
            history.push_back(describe(&key));
        }

        if term.take_resize() {
            let size = term.size();
            buf.set_dimension(size.cols, size.rows);
        }

        paint(&mut buf, &history);
        frame.clear();
        buf.present_to(&mut frame)?;
        if !frame.is_empty() {
            term.write_frame(&frame)?;
        }
    }

    term.leave()
}
