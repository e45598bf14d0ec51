// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, window size and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd writes. These are
// the standard POSIX interfaces for terminal control, and there is no safe
// alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. It enters raw mode via termios
// with a 100ms read timeout (VMIN=0, VTIME=1), measures the window, and
// guarantees cleanup on drop, even if the editor panics mid-frame.
//
// The panic hook writes a pre-built restore sequence directly to fd 1,
// bypassing Rust's stdout lock, restores termios, then hands over to the
// original panic handler so the message prints to a working terminal.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use thiserror::Error;

use crate::ansi;
use crate::reader::{ByteSource, TtySource};

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Failures that leave the editor without a usable terminal.
///
/// All of these are fatal: the binary clears the screen, reports the error
/// chain, and exits.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Reading the current terminal attributes failed.
    #[error("tcgetattr failed")]
    GetAttr(#[source] io::Error),
    /// Applying raw-mode attributes (or restoring the original ones) failed.
    #[error("tcsetattr failed")]
    SetAttr(#[source] io::Error),
    /// Neither `TIOCGWINSZ` nor the cursor-report fallback produced a size.
    #[error("could not determine the window size")]
    WindowSize,
    /// Writing control sequences to the terminal failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

impl Size {
    /// Fallback used when stdout is not a terminal (tests, pipes).
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
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

/// Parse a cursor position report: `ESC [ rows ; cols R`.
///
/// The trailing `R` is optional so callers can pass the bytes read up to
/// (but not including) the terminator.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    let body = reply.strip_prefix(b"\x1b[")?;
    let body = body.strip_suffix(b"R").unwrap_or(body);
    let text = std::str::from_utf8(body).ok()?;
    let (rows, cols) = text.split_once(';')?;
    let size = Size {
        rows: rows.parse().ok()?,
        cols: cols.parse().ok()?,
    };
    (size.rows > 0 && size.cols > 0).then_some(size)
}

/// Measure the window by parking the cursor in the far corner and asking
/// the terminal where it ended up.
///
/// Only meaningful in raw mode: the reply must arrive byte by byte without
/// line buffering or echo.
fn query_size_by_cursor(out: &mut impl Write, source: &mut impl ByteSource) -> Option<Size> {
    ansi::cursor_to_far_corner(out).ok()?;
    ansi::query_cursor_position(out).ok()?;
    out.flush().ok()?;

    let mut reply = Vec::with_capacity(32);
    while reply.len() < 31 {
        match source.read_byte() {
            Ok(Some(b'R')) | Ok(None) | Err(_) => break,
            Ok(Some(b)) => reply.push(b),
        }
    }
    parse_cursor_report(&reply)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Terminal`] struct owns its own copy, but the panic hook can't
/// access it. This global backup, behind a [`Mutex`],
/// lets the hook restore cooked mode without the struct.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Write the restore sequence used on exit and after a panic: reset SGR
/// attributes, clear the screen, home the cursor, show it.
fn write_restore(w: &mut impl Write) -> io::Result<()> {
    ansi::reset(w)?;
    ansi::clear_screen(w)?;
    ansi::cursor_home(w)?;
    ansi::cursor_show(w)
}

/// The restore sequence as bytes, for writers that take a slice.
fn restore_sequence() -> Vec<u8> {
    let mut seq = Vec::with_capacity(16);
    // Writing into a Vec cannot fail.
    let _ = write_restore(&mut seq);
    seq
}

/// Panic hook guard. Ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the restore sequence directly to stdout's file descriptor.
///
/// Bypasses Rust's `io::stdout()` lock to avoid deadlocking if the panic
/// occurred while the lock was held (e.g., mid-frame flush).
fn emergency_restore() {
    let seq = restore_sequence();

    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            seq.as_ptr().cast::<libc::c_void>(),
            seq.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(&seq);
        let _ = io::stdout().flush();
    }
}

/// Clear the screen and home the cursor, ignoring errors.
///
/// Used on the fatal-error path before the error is printed, so the report
/// lands on a clean screen instead of on top of the last frame.
pub fn clear_for_exit() {
    let mut stdout = io::stdout().lock();
    let _ = write_restore(&mut stdout);
    let _ = stdout.flush();
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup.
///
/// Call [`enter`](Self::enter) to switch to raw mode. The terminal is
/// automatically restored when the handle is dropped, even on panic.
///
/// # Example
///
/// ```no_run
/// use texc_term::terminal::Terminal;
///
/// let mut term = Terminal::new();
/// term.enter()?;
/// // ... render frames, handle input ...
/// // Terminal is restored automatically on drop.
/// # Ok::<(), texc_term::terminal::TerminalError>(())
/// ```
pub struct Terminal {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Current terminal size (cached, refresh with [`refresh_size`](Self::refresh_size)).
    size: Size,

    /// Whether `size` came from the terminal rather than the fallback.
    size_known: bool,

    /// Whether we're in raw mode.
    active: bool,
}

impl Terminal {
    /// Create a terminal handle and query the current size.
    ///
    /// Does **not** enter raw mode; call [`enter`](Self::enter) for that.
    /// Falls back to 80×24 if `TIOCGWINSZ` fails; [`enter`](Self::enter)
    /// retries with the cursor-report method on a real terminal.
    #[must_use]
    pub fn new() -> Self {
        let measured = get_size();
        Self {
            #[cfg(unix)]
            original_termios: None,
            size: measured.unwrap_or(Size::FALLBACK),
            size_known: measured.is_some(),
            active: false,
        }
    }

    /// Current terminal size (columns, rows).
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the terminal size from the OS.
    ///
    /// Call this after receiving SIGWINCH to pick up the new dimensions.
    /// Returns the updated size and caches it internally.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(s) = get_size() {
            self.size = s;
            self.size_known = true;
        }
        self.size
    }

    /// Whether we're currently in raw mode.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter raw mode and make sure the window size is known.
    ///
    /// Idempotent: calling `enter()` while already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal attributes cannot be read or set,
    /// or if the window size cannot be determined on a real terminal.
    pub fn enter(&mut self) -> Result<(), TerminalError> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;
        self.active = true;

        if !self.size_known && is_tty() {
            let mut source = TtySource::stdin();
            self.size = query_size_by_cursor(&mut io::stdout().lock(), &mut source)
                .ok_or(TerminalError::WindowSize)?;
            self.size_known = true;
        }

        tracing::debug!(cols = self.size.cols, rows = self.size.rows, "terminal entered raw mode");
        Ok(())
    }

    /// Leave raw mode: clear the screen and restore the original attributes.
    ///
    /// Idempotent: calling `leave()` while inactive is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or termios restore fails.
    pub fn leave(&mut self) -> Result<(), TerminalError> {
        if !self.active {
            return Ok(());
        }

        let mut lock = io::stdout().lock();
        write_restore(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.active = false;
        tracing::debug!("terminal restored");
        Ok(())
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> Result<(), TerminalError> {
        if !is_tty() {
            return Ok(());
        }

        let fd = libc::STDIN_FILENO;

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(TerminalError::GetAttr(io::Error::last_os_error()));
            }

            // Save original for restore.
            self.original_termios = Some(termios);

            // Also save to global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

            // VMIN=0, VTIME=1: read() returns after at most 100ms, possibly
            // with nothing. The byte source treats that as "no key yet".
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(TerminalError::SetAttr(io::Error::last_os_error()));
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> Result<(), TerminalError> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> Result<(), TerminalError> {
        if let Some(ref original) = self.original_termios {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) != 0 {
                    return Err(TerminalError::SetAttr(io::Error::last_os_error()));
                }
            }

            // Restored; the backup is stale now.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> Result<(), TerminalError> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn fallback_is_classic_vt100() {
        assert_eq!(Size::FALLBACK, Size { cols: 80, rows: 24 });
    }

    // ── Cursor report ─────────────────────────────────────────────────

    #[test]
    fn cursor_report_parses() {
        assert_eq!(
            parse_cursor_report(b"\x1b[24;80R"),
            Some(Size { cols: 80, rows: 24 })
        );
    }

    #[test]
    fn cursor_report_without_terminator() {
        assert_eq!(
            parse_cursor_report(b"\x1b[50;132"),
            Some(Size { cols: 132, rows: 50 })
        );
    }

    #[test]
    fn cursor_report_rejects_garbage() {
        assert_eq!(parse_cursor_report(b"24;80R"), None);
        assert_eq!(parse_cursor_report(b"\x1b[24R"), None);
        assert_eq!(parse_cursor_report(b"\x1b[a;bR"), None);
        assert_eq!(parse_cursor_report(b"\x1b[0;80R"), None);
        assert_eq!(parse_cursor_report(b""), None);
    }

    #[test]
    fn query_reads_reply_from_source() {
        let mut out = Vec::new();
        let mut source: VecDeque<u8> = b"\x1b[30;100R".iter().copied().collect();
        assert_eq!(
            query_size_by_cursor(&mut out, &mut source),
            Some(Size { cols: 100, rows: 30 })
        );
        assert_eq!(out, b"\x1b[999C\x1b[999B\x1b[6n");
    }

    #[test]
    fn query_gives_up_on_timeout() {
        let mut source: VecDeque<u8> = b"\x1b[30".iter().copied().collect();
        assert_eq!(query_size_by_cursor(&mut Vec::new(), &mut source), None);
    }

    // ── Restore sequence ──────────────────────────────────────────────

    #[test]
    fn restore_shows_cursor_last() {
        let seq = restore_sequence();
        assert_eq!(seq, b"\x1b[m\x1b[2J\x1b[H\x1b[?25h");
    }

    #[test]
    fn write_restore_matches_byte_sequence() {
        let mut out = Vec::new();
        write_restore(&mut out).unwrap();
        assert_eq!(out, restore_sequence());
    }

    // ── Terminal struct ───────────────────────────────────────────────

    #[test]
    fn terminal_new_is_inactive() {
        let term = Terminal::new();
        assert!(!term.is_active());
        assert!(term.size().cols > 0);
        assert!(term.size().rows > 0);
    }

    #[test]
    fn terminal_leave_without_enter() {
        let mut term = Terminal::new();
        term.leave().unwrap();
        assert!(!term.is_active());
    }

    #[test]
    fn terminal_refresh_size_is_cached() {
        let mut term = Terminal::new();
        let s = term.refresh_size();
        assert_eq!(s, term.size());
    }

    #[test]
    fn error_messages_are_descriptive() {
        let e = TerminalError::GetAttr(io::Error::other("boom"));
        assert_eq!(e.to_string(), "tcgetattr failed");
        assert_eq!(
            TerminalError::WindowSize.to_string(),
            "could not determine the window size"
        );
    }
}
