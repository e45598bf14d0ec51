//! A single line of text and its derived render and highlight arrays.
//!
//! `chars` holds the bytes exactly as they will be saved. `render` is what
//! the screen shows: the same bytes with every tab expanded to spaces up to
//! the next multiple of [`TAB_STOP`]. `highlight` runs parallel to `render`,
//! one class per rendered byte.
//!
//! Only `chars` is ever edited. Each mutation method here rebuilds `render`
//! immediately; the highlight is refreshed by the owning
//! [`Document`](crate::document::Document), because it depends on the
//! block-comment state of the row above.
//!
//! Columns are bytes. There is no Unicode width computation.

use crate::highlight::{Highlight, highlight_line};
use crate::syntax::Syntax;

/// Tab width in columns.
pub const TAB_STOP: usize = 8;

/// One line of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    index: usize,
    chars: Vec<u8>,
    render: Vec<u8>,
    highlight: Vec<Highlight>,
    comment_open: bool,
    /// Block-comment state this row was last highlighted with. `None` until
    /// the first scan, so a fresh row always counts as stale.
    scanned_with: Option<bool>,
}

impl Row {
    /// Create a row at storage position `index` holding `chars`.
    ///
    /// The render array is built immediately; the highlight starts out all
    /// [`Highlight::Normal`] until the row is scanned.
    #[must_use]
    pub fn new(index: usize, chars: impl Into<Vec<u8>>) -> Self {
        let mut row = Self {
            index,
            chars: chars.into(),
            ..Self::default()
        };
        row.update_render();
        row
    }

    // -- Accessors ----------------------------------------------------------

    /// Storage position of this row in its document.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The raw bytes of the line, without a line terminator.
    #[inline]
    #[must_use]
    pub fn chars(&self) -> &[u8] {
        &self.chars
    }

    /// The displayed bytes (tabs expanded).
    #[inline]
    #[must_use]
    pub fn render(&self) -> &[u8] {
        &self.render
    }

    /// Highlight class for each byte of [`render`](Self::render).
    #[inline]
    #[must_use]
    pub fn highlight(&self) -> &[Highlight] {
        &self.highlight
    }

    /// Whether this row ends inside an unterminated block comment.
    #[inline]
    #[must_use]
    pub const fn comment_open(&self) -> bool {
        self.comment_open
    }

    /// Length of [`chars`](Self::chars) in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when the line has no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    // -- Render mapping -----------------------------------------------------

    /// Render column of character index `cx`.
    ///
    /// Walks `chars[..cx]`: a tab jumps to the next tab stop, anything else
    /// advances one column. `cx` past the end is treated as the end.
    #[must_use]
    pub fn cx_to_rx(&self, cx: usize) -> usize {
        self.chars
            .iter()
            .take(cx)
            .fold(0, |rx, &b| advance(rx, b))
    }

    /// Character index whose render span contains render column `rx`.
    ///
    /// Returns the row length when `rx` lies past the last rendered column.
    /// A column inside a tab's padding maps to the tab itself.
    #[must_use]
    pub fn rx_to_cx(&self, rx: usize) -> usize {
        let mut cur_rx = 0;
        for (cx, &b) in self.chars.iter().enumerate() {
            cur_rx = advance(cur_rx, b);
            if cur_rx > rx {
                return cx;
            }
        }
        self.chars.len()
    }

    // -- Mutation -----------------------------------------------------------

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Insert `byte` before character `at` (clamped to the row length).
    pub(crate) fn insert(&mut self, at: usize, byte: u8) {
        let at = at.min(self.chars.len());
        self.chars.insert(at, byte);
        self.update_render();
    }

    /// Remove the byte at `at`. Returns `false` (and changes nothing) when
    /// `at` is past the end.
    pub(crate) fn remove(&mut self, at: usize) -> bool {
        if at >= self.chars.len() {
            return false;
        }
        self.chars.remove(at);
        self.update_render();
        true
    }

    /// Append `bytes` to the end of the line.
    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        self.chars.extend_from_slice(bytes);
        self.update_render();
    }

    /// Cut the line at `at`, returning everything from `at` on.
    pub(crate) fn split_off(&mut self, at: usize) -> Vec<u8> {
        let tail = self.chars.split_off(at.min(self.chars.len()));
        self.update_render();
        tail
    }

    /// Rebuild `render` from `chars`.
    ///
    /// The highlight is reset to the new length so the parallel-array
    /// invariant holds even before the next scan.
    fn update_render(&mut self) {
        let tabs = self.chars.iter().filter(|&&b| b == b'\t').count();
        let mut render = Vec::with_capacity(self.chars.len() + tabs * (TAB_STOP - 1));
        for &b in &self.chars {
            if b == b'\t' {
                render.push(b' ');
                while render.len() % TAB_STOP != 0 {
                    render.push(b' ');
                }
            } else {
                render.push(b);
            }
        }
        self.render = render;
        self.highlight = vec![Highlight::Normal; self.render.len()];
        self.scanned_with = None;
    }

    // -- Highlight ----------------------------------------------------------

    /// Whether the row must be rescanned given the row above ends with
    /// `incoming` block-comment state.
    pub(crate) fn is_stale(&self, incoming: bool) -> bool {
        self.scanned_with != Some(incoming)
    }

    /// Rescan the row. Returns the new [`comment_open`](Self::comment_open).
    pub(crate) fn update_highlight(&mut self, syntax: Option<&Syntax>, incoming: bool) -> bool {
        match syntax {
            Some(syntax) => {
                let (highlight, open) = highlight_line(&self.render, syntax, incoming);
                self.highlight = highlight;
                self.comment_open = open;
            }
            None => {
                self.highlight = vec![Highlight::Normal; self.render.len()];
                self.comment_open = false;
            }
        }
        self.scanned_with = Some(incoming);
        self.comment_open
    }

    /// Overwrite the highlight of `range` with [`Highlight::Match`].
    pub(crate) fn overlay_match(&mut self, start: usize, len: usize) {
        let end = (start + len).min(self.highlight.len());
        if let Some(span) = self.highlight.get_mut(start..end) {
            span.fill(Highlight::Match);
        }
    }

    /// Put back a highlight saved before [`overlay_match`](Self::overlay_match).
    ///
    /// Ignored if the row was re-rendered in between and the lengths no
    /// longer agree.
    pub(crate) fn restore_highlight(&mut self, saved: Vec<Highlight>) {
        if saved.len() == self.render.len() {
            self.highlight = saved;
        }
    }
}

/// Render column after `byte` when the current column is `rx`.
#[inline]
const fn advance(rx: usize, byte: u8) -> usize {
    if byte == b'\t' {
        rx + TAB_STOP - rx % TAB_STOP
    } else {
        rx + 1
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // -- Render -------------------------------------------------------------

    #[test]
    fn plain_text_renders_verbatim() {
        let row = Row::new(0, "hello");
        assert_eq!(row.render(), b"hello");
        assert_eq!(row.highlight().len(), 5);
    }

    #[test]
    fn leading_tab_expands_to_tab_stop() {
        let row = Row::new(0, "\tx");
        assert_eq!(row.render(), b"        x");
    }

    #[test]
    fn mid_tab_pads_to_next_stop() {
        let row = Row::new(0, "abc\td");
        assert_eq!(row.render(), b"abc     d");
        assert_eq!(row.render().len(), 9);
    }

    #[test]
    fn tab_at_stop_boundary_takes_full_width() {
        let row = Row::new(0, "12345678\t|");
        assert_eq!(row.render().len(), 17);
    }

    #[test]
    fn empty_row() {
        let row = Row::new(3, "");
        assert!(row.is_empty());
        assert!(row.render().is_empty());
        assert_eq!(row.index(), 3);
    }

    // -- Mapping ------------------------------------------------------------

    #[test]
    fn cx_to_rx_without_tabs_is_identity() {
        let row = Row::new(0, "abc");
        for cx in 0..=3 {
            assert_eq!(row.cx_to_rx(cx), cx);
        }
    }

    #[test]
    fn cx_to_rx_with_tabs() {
        let row = Row::new(0, "a\tb\t");
        assert_eq!(row.cx_to_rx(0), 0);
        assert_eq!(row.cx_to_rx(1), 1);
        assert_eq!(row.cx_to_rx(2), 8);
        assert_eq!(row.cx_to_rx(3), 9);
        assert_eq!(row.cx_to_rx(4), 16);
    }

    #[test]
    fn rx_to_cx_inside_tab_maps_to_tab() {
        let row = Row::new(0, "a\tb");
        assert_eq!(row.rx_to_cx(0), 0);
        assert_eq!(row.rx_to_cx(1), 1);
        assert_eq!(row.rx_to_cx(5), 1);
        assert_eq!(row.rx_to_cx(8), 2);
    }

    #[test]
    fn rx_to_cx_past_end_is_len() {
        let row = Row::new(0, "ab");
        assert_eq!(row.rx_to_cx(50), 2);
    }

    #[test]
    fn mapping_round_trips_for_every_cursor_position() {
        for text in ["", "plain", "\t\t", "a\tbc\t\td", "12345678\tx"] {
            let row = Row::new(0, text);
            for cx in 0..=row.len() {
                assert_eq!(row.rx_to_cx(row.cx_to_rx(cx)), cx, "{text:?} cx={cx}");
            }
        }
    }

    // -- Mutation -----------------------------------------------------------

    #[test]
    fn insert_clamps_and_rerenders() {
        let mut row = Row::new(0, "ac");
        row.insert(1, b'b');
        row.insert(99, b'\t');
        assert_eq!(row.chars(), b"abc\t");
        assert_eq!(row.render(), b"abc     ");
        assert_eq!(row.highlight().len(), row.render().len());
    }

    #[test]
    fn remove_past_end_is_noop() {
        let mut row = Row::new(0, "ab");
        assert!(!row.remove(2));
        assert!(row.remove(0));
        assert_eq!(row.chars(), b"b");
    }

    #[test]
    fn split_off_and_extend() {
        let mut row = Row::new(0, "hello world");
        let tail = row.split_off(5);
        assert_eq!(row.chars(), b"hello");
        assert_eq!(tail, b" world");
        row.extend(&tail);
        assert_eq!(row.chars(), b"hello world");
    }

    // -- Highlight bookkeeping ----------------------------------------------

    #[test]
    fn fresh_row_is_stale() {
        let row = Row::new(0, "x");
        assert!(row.is_stale(false));
        assert!(row.is_stale(true));
    }

    #[test]
    fn scanned_row_is_stale_only_for_other_state() {
        let mut row = Row::new(0, "x");
        row.update_highlight(None, false);
        assert!(!row.is_stale(false));
        assert!(row.is_stale(true));
    }

    #[test]
    fn edit_makes_row_stale_again() {
        let mut row = Row::new(0, "x");
        row.update_highlight(None, false);
        row.insert(0, b'y');
        assert!(row.is_stale(false));
    }

    #[test]
    fn overlay_and_restore() {
        let mut row = Row::new(0, "find me");
        row.update_highlight(None, false);
        let saved = row.highlight().to_vec();
        row.overlay_match(5, 2);
        assert_eq!(row.highlight()[5], Highlight::Match);
        assert_eq!(row.highlight()[4], Highlight::Normal);
        row.restore_highlight(saved);
        assert!(row.highlight().iter().all(|&h| h == Highlight::Normal));
    }

    #[test]
    fn overlay_clamps_to_row() {
        let mut row = Row::new(0, "ab");
        row.overlay_match(1, 10);
        assert_eq!(row.highlight(), &[Highlight::Normal, Highlight::Match]);
    }
}
