//! View: document, cursor and message turned into one terminal frame.
//!
//! The frame is built front to back into an [`OutputBuffer`] and written by
//! the caller in one go:
//!
//! ```text
//! ESC[?25l ESC[H            hide cursor, home
//! text rows                 document rows or `~`, each ending ESC[K \r\n
//! status bar                inverse video, full width, \r\n
//! message line              ESC[K, then the message if it is fresh
//! ESC[y;xH ESC[?25h         place and show the cursor
//! ```
//!
//! Nothing is cleared up front. Every line either fills the full width or
//! erases to its end, so stale content never survives a redraw.

use std::io::Write;

use texc_term::ansi;
use texc_term::output::{ColorWriter, OutputBuffer};

use crate::document::Document;
use crate::row::Row;
use crate::viewport::Viewport;

/// Version shown in the welcome banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Longest file name prefix shown in the status bar, in bytes.
const STATUS_NAME_MAX: usize = 20;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// Render a complete frame.
///
/// Scrolls the viewport first so the cursor is on screen. `message` is the
/// message-line text, already filtered for age by the caller.
pub fn render_frame(
    out: &mut OutputBuffer,
    doc: &Document,
    viewport: &mut Viewport,
    message: Option<&str>,
) {
    viewport.scroll(doc);

    // OutputBuffer writes cannot fail.
    let _ = ansi::cursor_hide(out);
    let _ = ansi::cursor_home(out);

    draw_rows(out, doc, viewport);
    draw_status_bar(out, doc, viewport);
    draw_message(out, message, viewport.cols());

    let (x, y) = viewport.screen_cursor();
    let _ = ansi::cursor_to(out, clamp_u16(x), clamp_u16(y));
    let _ = ansi::cursor_show(out);
}

fn clamp_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

// ---------------------------------------------------------------------------
// Text rows
// ---------------------------------------------------------------------------

/// Draw every text-area row: document content, or `~` past the end.
pub fn draw_rows(out: &mut OutputBuffer, doc: &Document, viewport: &Viewport) {
    let (row_off, col_off) = viewport.offsets();
    let cols = viewport.cols();

    for y in 0..viewport.rows() {
        match doc.row(y + row_off) {
            Some(row) => draw_row(out, row, col_off, cols),
            None if doc.is_empty() && y == viewport.rows() / 3 => {
                out.push_bytes(&welcome_line(cols));
            }
            None => out.push(b'~'),
        }
        let _ = ansi::erase_line(out);
        out.push_bytes(b"\r\n");
    }
}

/// Draw the visible slice `[col_off, col_off + cols)` of one row.
///
/// Colors change only where the highlight class changes. Control bytes are
/// shown in inverse video as `@`, `A`, `B`, ... (or `?` above 26).
pub fn draw_row(out: &mut OutputBuffer, row: &Row, col_off: usize, cols: usize) {
    let render = row.render();
    let start = col_off.min(render.len());
    let end = (col_off + cols).min(render.len());

    let mut colors = ColorWriter::new();
    for (&byte, &class) in render[start..end].iter().zip(&row.highlight()[start..end]) {
        if byte.is_ascii_control() {
            let glyph = if byte <= 26 { b'@' + byte } else { b'?' };
            colors.write_inverse(out, glyph);
        } else {
            colors.set(out, class.color());
            out.push(byte);
        }
    }
    colors.finish(out);
}

/// The centered `texc editor <version>` banner with its leading `~`.
#[must_use]
pub fn welcome_line(cols: usize) -> Vec<u8> {
    let banner = format!("texc editor {VERSION}");
    let banner = &banner.as_bytes()[..banner.len().min(cols)];

    let mut line = Vec::with_capacity(cols);
    let mut padding = (cols - banner.len()) / 2;
    if padding > 0 {
        line.push(b'~');
        padding -= 1;
    }
    line.resize(line.len() + padding, b' ');
    line.extend_from_slice(banner);
    line
}

// ---------------------------------------------------------------------------
// Bars
// ---------------------------------------------------------------------------

/// Draw the inverse-video status bar.
///
/// Left: file name (at most 20 bytes) or `[No Name]`, line count and a
/// modified marker. Right: syntax name and cursor line, flush with the
/// right edge and dropped entirely if it does not fit.
pub fn draw_status_bar(out: &mut OutputBuffer, doc: &Document, viewport: &Viewport) {
    let cols = viewport.cols();
    let (left, right) = status_parts(doc, viewport);

    let _ = ansi::inverse(out);
    let left = &left[..left.len().min(cols)];
    out.push_bytes(left);

    let remaining = cols - left.len();
    if right.len() <= remaining {
        out.push_repeated(b' ', remaining - right.len());
        out.push_bytes(&right);
    } else {
        out.push_repeated(b' ', remaining);
    }

    let _ = ansi::reset(out);
    out.push_bytes(b"\r\n");
}

/// The two halves of the status bar, before fitting them to the width.
#[must_use]
pub fn status_parts(doc: &Document, viewport: &Viewport) -> (Vec<u8>, Vec<u8>) {
    let mut left = Vec::new();
    match doc.path() {
        Some(path) => {
            let name = path.as_os_str().as_encoded_bytes();
            left.extend_from_slice(&name[..name.len().min(STATUS_NAME_MAX)]);
        }
        None => left.extend_from_slice(b"[No Name]"),
    }
    let modified = if doc.is_dirty() { "(modified)" } else { "" };
    let _ = write!(left, " - {} lines {modified}", doc.len());

    let filetype = doc.syntax().map_or("NA", |s| s.name);
    let mut right = Vec::new();
    let _ = write!(right, "{filetype} | {}/{}", viewport.cursor().1 + 1, doc.len());

    (left, right)
}

/// Draw the message line: erase it, then the message cut to the width.
pub fn draw_message(out: &mut OutputBuffer, message: Option<&str>, cols: usize) {
    let _ = ansi::erase_line(out);
    if let Some(text) = message {
        let bytes = text.as_bytes();
        out.push_bytes(&bytes[..bytes.len().min(cols)]);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
