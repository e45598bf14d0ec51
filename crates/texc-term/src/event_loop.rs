// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop.
//
// One thread, one loop: paint the frame if anything changed, flush it with
// a single write, then wait up to `KEY_TIMEOUT_MS` for a key. A key goes to
// the application and marks the frame dirty. A timeout gives the
// application a tick so time-based state (an expiring status message) can
// ask for a repaint.
//
// # SIGWINCH Handling
//
// Terminal resize is detected via a SIGWINCH handler that sets an
// `AtomicBool`. The poll in `TtySource` wakes up early when the signal
// lands, so the loop notices the flag within one iteration, re-measures
// the window and repaints.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::input::{Key, read_key};
use crate::output::OutputBuffer;
use crate::reader::{ByteSource, TtySource};
use crate::terminal::{Size, Terminal, TerminalError};

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

/// Global flag set by the SIGWINCH handler. Checked each loop iteration.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
///
/// The handler only stores to an atomic, which is async-signal-safe.
/// `SA_RESTART` is left off so a blocked poll returns `EINTR` and the loop
/// reacts to the resize right away.
#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = 0;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the application tells the event loop to do after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Continue running.
    Continue,
    /// Exit the event loop cleanly.
    Quit,
}

/// Application interface for the event loop.
///
/// Each iteration the loop calls, in order:
///
/// 1. [`paint`](App::paint) when the frame is dirty
/// 2. [`on_key`](App::on_key) for the key that arrived, or
///    [`on_tick`](App::on_tick) when the read timed out
/// 3. [`on_resize`](App::on_resize) when the window changed size
pub trait App {
    /// Handle one decoded key. Return [`Action::Quit`] to exit the loop.
    fn on_key(&mut self, key: Key) -> Action;

    /// Handle terminal resize.
    fn on_resize(&mut self, _size: Size) {}

    /// Called when no key arrived within the read timeout.
    ///
    /// Return `true` if state changed and a repaint is needed.
    fn on_tick(&mut self) -> bool {
        false
    }

    /// Render the complete frame into `out`.
    ///
    /// The buffer is empty on entry and is written to the terminal in one
    /// piece afterwards, so the frame must include its own cursor hide and
    /// show, homing and final cursor placement.
    fn paint(&mut self, out: &mut OutputBuffer, size: Size);
}

// ─── Pump ────────────────────────────────────────────────────────────────────

/// One loop iteration without any terminal ownership.
///
/// Paints into `out` and flushes to `sink` when `dirty` is set, then reads
/// at most one key from `source`. Returns the application's verdict.
///
/// [`EventLoop::run`] drives this against the real terminal; tests drive it
/// against a byte queue and a `Vec<u8>`.
///
/// # Errors
///
/// Returns an error if reading a key or writing the frame fails.
pub fn pump(
    app: &mut impl App,
    source: &mut impl ByteSource,
    out: &mut OutputBuffer,
    sink: &mut impl Write,
    size: Size,
    dirty: &mut bool,
) -> io::Result<Action> {
    if *dirty {
        out.clear();
        app.paint(out, size);
        out.flush_to(sink)?;
        *dirty = false;
    }

    match read_key(source)? {
        Some(key) => {
            *dirty = true;
            Ok(app.on_key(key))
        }
        None => {
            if app.on_tick() {
                *dirty = true;
            }
            Ok(Action::Continue)
        }
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// Owns the terminal, the stdin byte source and the frame buffer. Call
/// [`run`](Self::run) to enter the loop; it returns when the application
/// signals [`Action::Quit`].
///
/// # Example
///
/// ```no_run
/// use texc_term::event_loop::{Action, App, EventLoop};
/// use texc_term::input::Key;
/// use texc_term::output::OutputBuffer;
/// use texc_term::terminal::Size;
///
/// struct Quitter;
///
/// impl App for Quitter {
///     fn on_key(&mut self, key: Key) -> Action {
///         if key.is_ctrl(b'q') { Action::Quit } else { Action::Continue }
///     }
///
///     fn paint(&mut self, out: &mut OutputBuffer, _size: Size) {
///         out.push_bytes(b"\x1b[H press Ctrl-Q");
///     }
/// }
///
/// let mut event_loop = EventLoop::new();
/// event_loop.run(&mut Quitter)?;
/// # Ok::<(), texc_term::terminal::TerminalError>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    source: TtySource,
    out: OutputBuffer,
}

impl EventLoop {
    /// Create an event loop for stdin/stdout. Does not touch terminal modes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            terminal: Terminal::new(),
            source: TtySource::stdin(),
            out: OutputBuffer::new(),
        }
    }

    /// The current terminal size.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Enter raw mode and measure the window without starting the loop.
    ///
    /// Lets the caller size its state before the first key arrives.
    /// [`run`](Self::run) does this itself if it hasn't happened yet.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode cannot be entered.
    pub fn start(&mut self) -> Result<Size, TerminalError> {
        if !self.terminal.is_active() {
            self.terminal.enter()?;
            install_sigwinch_handler();
        }
        Ok(self.terminal.size())
    }

    /// Run the loop until the application returns [`Action::Quit`].
    ///
    /// The terminal is restored on the way out, whether the loop ended
    /// normally or with an error.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode, key reading or frame output fails.
    pub fn run(&mut self, app: &mut impl App) -> Result<(), TerminalError> {
        self.start()?;
        app.on_resize(self.terminal.size());

        let result = self.run_inner(app);
        let restored = self.terminal.leave();

        result?;
        restored
    }

    fn run_inner(&mut self, app: &mut impl App) -> io::Result<()> {
        let mut dirty = true;
        let mut stdout = io::stdout();

        loop {
            let size = self.terminal.size();
            let action = pump(
                app,
                &mut self.source,
                &mut self.out,
                &mut stdout,
                size,
                &mut dirty,
            )?;
            if action == Action::Quit {
                tracing::debug!("event loop: quit");
                return Ok(());
            }

            if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
                let new_size = self.terminal.refresh_size();
                tracing::debug!(cols = new_size.cols, rows = new_size.rows, "resize");
                app.on_resize(new_size);
                dirty = true;
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
