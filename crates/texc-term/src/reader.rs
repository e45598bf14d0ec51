// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Byte sources for the key decoder.
//
// The editor is single-threaded: it blocks on stdin for at most one short
// timeout, handles whatever key arrived, redraws, and blocks again. A read
// that times out is not an error, it just means "no key yet", so every
// source answers `Ok(None)` in that case and the caller retries.
//
// `TtySource` polls the stdin file descriptor with a bounded timeout before
// reading a single byte. The poll makes the timeout independent of the
// termios VTIME setting, and an interrupted poll (SIGWINCH during a resize)
// also reads as a timeout so the loop gets a chance to redraw.
//
// `VecDeque<u8>` is a source too: tests and scripted sessions feed it a
// byte string and the decoder sees exactly what a terminal would send,
// with an empty queue standing in for the timeout.

use std::collections::VecDeque;
use std::io;

/// How long a single read waits for a byte (milliseconds).
///
/// Also the window inside which the rest of an escape sequence must arrive
/// for it to be decoded as one key. 100ms matches the VTIME=1 raw-mode
/// setting.
pub const KEY_TIMEOUT_MS: i32 = 100;

/// A source of raw terminal bytes, one at a time.
pub trait ByteSource {
    /// Read one byte, waiting at most the source's timeout.
    ///
    /// Returns `Ok(None)` when the timeout expires with nothing to read.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails for a reason other
    /// than a timeout or an interrupted call.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl ByteSource for VecDeque<u8> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.pop_front())
    }
}

/// Stdin (or any file descriptor) read one byte per call with a poll timeout.
///
/// # Example
///
/// ```no_run
/// use texc_term::reader::{ByteSource, TtySource};
///
/// let mut source = TtySource::stdin();
/// match source.read_byte()? {
///     Some(b) => println!("got {b:#04x}"),
///     None => println!("no key yet"),
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TtySource {
    #[cfg(unix)]
    fd: libc::c_int,
    timeout_ms: i32,
}

impl TtySource {
    /// A source reading stdin with the default [`KEY_TIMEOUT_MS`].
    #[must_use]
    pub const fn stdin() -> Self {
        Self {
            #[cfg(unix)]
            fd: libc::STDIN_FILENO,
            timeout_ms: KEY_TIMEOUT_MS,
        }
    }

    /// The configured timeout in milliseconds.
    #[inline]
    #[must_use]
    pub const fn timeout_ms(&self) -> i32 {
        self.timeout_ms
    }
}

impl Default for TtySource {
    fn default() -> Self {
        Self::stdin()
    }
}

/// Whether an OS error just means "try again later".
fn is_retryable(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

#[cfg(unix)]
impl ByteSource for TtySource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let ready = unsafe {
            let mut pfd = libc::pollfd {
                fd: self.fd,
                events: libc::POLLIN,
                revents: 0,
            };
            libc::poll(&raw mut pfd, 1, self.timeout_ms)
        };

        if ready == 0 {
            return Ok(None);
        }
        if ready < 0 {
            let err = io::Error::last_os_error();
            return if is_retryable(&err) { Ok(None) } else { Err(err) };
        }

        let mut byte = 0u8;
        let n = unsafe { libc::read(self.fd, (&raw mut byte).cast(), 1) };

        match n {
            1 => Ok(Some(byte)),
            // Readable but nothing read: the other end hung up.
            0 => Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            _ => {
                let err = io::Error::last_os_error();
                if is_retryable(&err) { Ok(None) } else { Err(err) }
            }
        }
    }
}

#[cfg(not(unix))]
impl ByteSource for TtySource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        use std::io::Read;

        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte) {
            Ok(0) => Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if is_retryable(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_timeout_reasonable() {
        assert!(KEY_TIMEOUT_MS >= 10);
        assert!(KEY_TIMEOUT_MS <= 500);
    }

    #[test]
    fn queue_yields_bytes_in_order() {
        let mut q: VecDeque<u8> = b"ab".iter().copied().collect();
        assert_eq!(q.read_byte().unwrap(), Some(b'a'));
        assert_eq!(q.read_byte().unwrap(), Some(b'b'));
    }

    #[test]
    fn empty_queue_is_a_timeout() {
        let mut q = VecDeque::new();
        assert_eq!(q.read_byte().unwrap(), None);
        assert_eq!(q.read_byte().unwrap(), None);
    }

    #[test]
    fn tty_source_defaults() {
        let src = TtySource::stdin();
        assert_eq!(src.timeout_ms(), KEY_TIMEOUT_MS);
    }

    #[test]
    fn retryable_errors() {
        assert!(is_retryable(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(is_retryable(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_retryable(&io::Error::from(io::ErrorKind::BrokenPipe)));
    }
}
