// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources — where the input loop gets its raw key bytes.
//
// The input loop must stay cancellable: it waits for input with a short
// timeout, checks the shared stop flag, and waits again. `ByteSource`
// captures exactly that contract. Two sources ship:
//
//   StdinSource       — `poll()` on the stdin descriptor, then `read()`.
//                       Returns after at most the timeout even when the
//                       user types nothing.
//   Receiver<Vec<u8>> — a channel end, so tests and embedders can script
//                       key bytes without a terminal.

use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Largest chunk read from stdin in one call.
const READ_BUF_SIZE: usize = 4096;

// ─── ByteSource ──────────────────────────────────────────────────────────────

/// A stream of raw input bytes with a bounded wait.
pub trait ByteSource: Send {
    /// Wait up to `timeout` for input.
    ///
    /// `Ok(Some(bytes))` carries a non-empty chunk, `Ok(None)` means the
    /// timeout passed quietly.
    ///
    /// # Errors
    ///
    /// Returns an error when the source is closed for good (EOF, a
    /// disconnected channel, or a failed read). The input loop stops
    /// polling after an error.
    fn read_timeout(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>>;
}

impl ByteSource for Receiver<Vec<u8>> {
    fn read_timeout(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        match self.recv_timeout(timeout) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "input channel disconnected",
            )),
        }
    }
}

// ─── StdinSource ─────────────────────────────────────────────────────────────

/// Terminal stdin read with `poll(2)` + `read(2)`.
pub struct StdinSource {
    buf: Box<[u8; READ_BUF_SIZE]>,
}

impl StdinSource {
    /// A source reading the process's stdin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Box::new([0; READ_BUF_SIZE]),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl ByteSource for StdinSource {
    fn read_timeout(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        let fd = libc::STDIN_FILENO;
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);

        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, millis)
        };
        if ready < 0 {
            let err = io::Error::last_os_error();
            // A signal (SIGWINCH) interrupting the wait is a quiet poll.
            return if err.kind() == io::ErrorKind::Interrupted {
                Ok(None)
            } else {
                Err(err)
            };
        }
        if ready == 0 {
            return Ok(None);
        }

        let n = unsafe { libc::read(fd, self.buf.as_mut_ptr().cast(), self.buf.len()) };
        match n {
            0 => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
            n if n < 0 => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
            #[allow(clippy::cast_sign_loss)] // n > 0 in this arm.
            n => Ok(Some(self.buf[..n as usize].to_vec())),
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for StdinSource {
    fn read_timeout(&mut self, timeout: Duration) -> io::Result<Option<Vec<u8>>> {
        // No readiness polling here: sleep out the timeout and report quiet.
        std::thread::sleep(timeout);
        Ok(None)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
