// SPDX-License-Identifier: MIT
//
// Output buffering and stateful color tracking.
//
// Two components work together to minimize terminal I/O:
//
//   OutputBuffer: accumulates all ANSI bytes in memory so the entire frame
//   can be written in a single write() syscall. The user never sees a half
//   drawn screen.
//
//   ColorWriter: remembers the foreground color the terminal is currently
//   using and skips the SGR sequence when the next character wants the same
//   color. A row of forty keyword characters costs one color escape, not
//   forty.

use std::io::{self, Write};

use crate::ansi::{self, Color};

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single `write()` syscall.
///
/// Instead of hundreds of small writes per frame (cursor moves, color changes,
/// characters), everything goes into this buffer first. A single flush at
/// frame end writes it all at once.
///
/// Default capacity: 16 KB, enough for most frames without reallocation.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 16_384;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (16 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append raw bytes verbatim.
    #[inline]
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a single byte.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Append `n` copies of `byte` (padding).
    pub fn push_repeated(&mut self, byte: u8, n: usize) {
        self.buf.resize(self.buf.len() + n, byte);
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to an arbitrary writer and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op: bytes reach the terminal only through flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── ColorWriter ─────────────────────────────────────────────────────────────

/// Stateful foreground tracker that skips redundant color escapes.
///
/// `None` means "no color emitted since the last reset", which is different
/// from [`Color::Default`]: after a reset the terminal is already on its
/// default color, so switching to `Default` costs nothing.
#[derive(Debug, Default)]
pub struct ColorWriter {
    current: Option<Color>,
}

impl ColorWriter {
    /// Create a writer with no tracked state.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// The color the terminal is currently using, if one was emitted.
    #[inline]
    #[must_use]
    pub const fn current(&self) -> Option<Color> {
        self.current
    }

    /// Switch the foreground to `color`, emitting SGR only on change.
    pub fn set(&mut self, out: &mut OutputBuffer, color: Color) {
        let effective = self.current.unwrap_or(Color::Default);
        if effective != color {
            // OutputBuffer writes are infallible.
            let _ = ansi::fg(out, color);
        }
        self.current = (color != Color::Default).then_some(color);
    }

    /// Write `byte` in inverse video without disturbing the tracked color.
    ///
    /// Inverse video is cleared with a full SGR reset, which also drops the
    /// foreground, so the active color is re-emitted right after.
    pub fn write_inverse(&self, out: &mut OutputBuffer, byte: u8) {
        let _ = ansi::inverse(out);
        out.push(byte);
        let _ = ansi::reset(out);
        if let Some(color) = self.current {
            let _ = ansi::fg(out, color);
        }
    }

    /// Return to the default foreground at the end of a row.
    pub fn finish(&mut self, out: &mut OutputBuffer) {
        let _ = ansi::fg(out, Color::Default);
        self.current = None;
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
