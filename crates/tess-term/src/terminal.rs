// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, screen modes, resize signal, and the
// `Backend` seam the engine renders through.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), isatty,
// sigaction, and raw fd writes are only reachable through libc. Each
// unsafe block is one call.
#![allow(unsafe_code)]
//
// The engine never talks to stdout directly. It holds a `Box<dyn Backend>`
// and asks it for the size, hands it finished frames, and tells it when to
// enter and leave terminal mode. `Terminal` is the real tty; the
// `HeadlessBackend` records frames in memory so the whole engine can run
// under `cargo test` with no terminal attached.
//
// A panic while the terminal is in raw mode would leave the user's shell
// without echo. The panic hook writes a fixed restore sequence straight to
// fd 1 (no stdout lock, which the panicking thread may hold), restores
// termios from a global backup, and then runs the previous hook.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once, PoisonError};

use crate::ansi;

// ─── Size ────────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    /// Columns.
    pub cols: u16,
    /// Rows.
    pub rows: u16,
}

impl Size {
    /// Fallback when the size cannot be queried.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.cols as u32 * self.rows as u32
    }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Query the terminal size via `ioctl(TIOCGWINSZ)` on stdout.
///
/// `None` when stdout is not a terminal.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    (result == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Resize Signal ───────────────────────────────────────────────────────────

/// Set by the SIGWINCH handler, cleared by [`take_resize_signal`].
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);
static RESIZE_HANDLER: Once = Once::new();

/// Install the SIGWINCH handler (once per process).
pub fn install_resize_handler() {
    RESIZE_HANDLER.call_once(|| {
        #[cfg(unix)]
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = on_sigwinch as *const () as usize;
            sa.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&raw mut sa.sa_mask);
            libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
        }
    });
}

#[cfg(unix)]
extern "C" fn on_sigwinch(_sig: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

/// Whether a resize signal arrived since the last call. Clears the flag.
#[must_use]
pub fn take_resize_signal() -> bool {
    RESIZE_PENDING.swap(false, Ordering::Relaxed)
}

// ─── Panic-Safe Restore ──────────────────────────────────────────────────────

#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn restore_termios_from_backup() {
    let guard = TERMIOS_BACKUP.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(ref original) = *guard {
        unsafe {
            let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
        }
    }
}

/// End sync, reset SGR, show cursor, leave the alternate screen.
///
/// Leaving the alternate screen comes last so the shell's own screen
/// returns with nothing drawn over it.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();
            #[cfg(unix)]
            restore_termios_from_backup();
            previous(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

/// Output device the engine renders to.
pub trait Backend: Send {
    /// Current device size.
    fn size(&mut self) -> Size;

    /// Write one finished frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the device write fails.
    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Switch the device into full-screen mode. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode switch fails.
    fn enter(&mut self) -> io::Result<()>;

    /// Restore the device to its normal state. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the restore fails.
    fn leave(&mut self) -> io::Result<()>;

    /// Whether the device reported a resize since the last call.
    fn take_resize(&mut self) -> bool {
        false
    }
}

// ─── Terminal ────────────────────────────────────────────────────────────────

/// The controlling terminal, restored on drop.
///
/// ```no_run
/// use tess_term::terminal::{Backend, Terminal};
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// term.write_frame(b"\x1b[1;1Hhello")?;
/// term.leave()?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    size: Size,
    alternate_screen: bool,
    active: bool,
}

impl Terminal {
    /// A handle using the alternate screen. Does not touch the terminal yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            size: get_size().unwrap_or(Size::FALLBACK),
            alternate_screen: true,
            active: false,
        }
    }

    /// Whether [`enter`](Backend::enter) switches to the alternate screen.
    #[must_use]
    pub const fn with_alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    /// Whether terminal mode is active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        if !is_tty() {
            return Ok(());
        }
        let fd = libc::STDIN_FILENO;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            *TERMIOS_BACKUP.lock().unwrap_or_else(PoisonError::into_inner) = Some(termios);

            // cfmakeraw, minus ISIG handling: Ctrl+C arrives as a key.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.take() {
            if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) }
                != 0
            {
                return Err(io::Error::last_os_error());
            }
            *TERMIOS_BACKUP.lock().unwrap_or_else(PoisonError::into_inner) = None;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for Terminal {
    fn size(&mut self) -> Size {
        if let Some(size) = get_size() {
            self.size = size;
        }
        self.size
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(bytes)?;
        lock.flush()
    }

    fn enter(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        install_panic_hook();
        install_resize_handler();
        self.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        if self.alternate_screen {
            ansi::enter_alt_screen(&mut lock)?;
        }
        ansi::cursor_hide(&mut lock)?;
        ansi::reset(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        lock.flush()?;

        self.active = true;
        tracing::debug!(alternate_screen = self.alternate_screen, "terminal mode entered");
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::end_sync(&mut lock)?;
        ansi::reset(&mut lock)?;
        ansi::clear_screen(&mut lock)?;
        ansi::cursor_to(&mut lock, 0, 0)?;
        ansi::cursor_show(&mut lock)?;
        if self.alternate_screen {
            ansi::exit_alt_screen(&mut lock)?;
        }
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.active = false;
        tracing::debug!("terminal mode left");
        Ok(())
    }

    fn take_resize(&mut self) -> bool {
        take_resize_signal()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = Backend::leave(self);
        }
    }
}

// ─── HeadlessBackend ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Recorded {
    size: Size,
    output: Vec<u8>,
    frames: usize,
    active: bool,
    enter_count: usize,
    resized: bool,
}

/// In-memory backend: a settable size and a recording of every frame.
///
/// Clones share the same recording, so a test can keep one handle while
/// the engine owns another.
///
/// ```
/// use tess_term::terminal::{Backend, HeadlessBackend, Size};
///
/// let probe = HeadlessBackend::new(40, 10);
/// let mut engine_side = probe.clone();
/// engine_side.write_frame(b"frame").unwrap();
/// assert_eq!(probe.output(), b"frame");
///
/// probe.set_size(100, 30);
/// assert_eq!(engine_side.size(), Size { cols: 100, rows: 30 });
/// ```
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    inner: Arc<Mutex<Recorded>>,
}

impl HeadlessBackend {
    /// A headless device of `cols` × `rows`.
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Recorded {
                size: Size { cols, rows },
                ..Recorded::default()
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Recorded) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Change the reported size and flag a resize.
    pub fn set_size(&self, cols: u16, rows: u16) {
        self.with(|r| {
            r.size = Size { cols, rows };
            r.resized = true;
        });
    }

    /// Every byte written so far.
    #[must_use]
    pub fn output(&self) -> Vec<u8> {
        self.with(|r| r.output.clone())
    }

    /// Return and forget the bytes written so far.
    #[must_use]
    pub fn take_output(&self) -> Vec<u8> {
        self.with(|r| std::mem::take(&mut r.output))
    }

    /// Number of frames written.
    #[must_use]
    pub fn frames(&self) -> usize {
        self.with(|r| r.frames)
    }

    /// Whether the device is in full-screen mode.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.with(|r| r.active)
    }

    /// How many times full-screen mode was actually entered.
    #[must_use]
    pub fn enter_count(&self) -> usize {
        self.with(|r| r.enter_count)
    }
}

impl Backend for HeadlessBackend {
    fn size(&mut self) -> Size {
        self.with(|r| r.size)
    }

    fn write_frame(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.with(|r| {
            r.output.extend_from_slice(bytes);
            r.frames += 1;
        });
        Ok(())
    }

    fn enter(&mut self) -> io::Result<()> {
        self.with(|r| {
            if !r.active {
                r.active = true;
                r.enter_count += 1;
            }
        });
        Ok(())
    }

    fn leave(&mut self) -> io::Result<()> {
        self.with(|r| r.active = false);
        Ok(())
    }

    fn take_resize(&mut self) -> bool {
        self.with(|r| std::mem::take(&mut r.resized))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
