// SPDX-License-Identifier: MIT
//
// tess-term — the terminal layer under tessera.
//
// Everything that knows about bytes on a tty lives here: the sixteen
// console colors, the cell value type, a dirty-tracked frame buffer that
// presents only the cells that changed, the ANSI it presents with, a key
// decoder for raw stdin, and the `Backend` / `ByteSource` seams that let
// the engine run against a real terminal or entirely in memory.
//
// No TUI framework sits underneath. Output is hand-encoded ANSI and
// input is raw termios, so every byte sent to the terminal is one this
// crate chose to send.

pub mod ansi;
pub mod buffer;
pub mod cell;
pub mod color;
pub mod input;
pub mod output;
pub mod present;
pub mod reader;
pub mod terminal;

pub use buffer::{FrameBuffer, Viewport};
pub use cell::{Attr, Cell};
pub use color::Color;
pub use input::{KeyCode, KeyDecoder, KeyEvent, Modifiers};
pub use present::PresentStats;
pub use reader::{ByteSource, StdinSource};
pub use terminal::{Backend, HeadlessBackend, Size, Terminal};
