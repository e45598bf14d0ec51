//! Cursor and scroll state.
//!
//! The cursor lives in document coordinates: `cy` is a row index (and may
//! sit one past the last row, on the virtual line where typing appends a
//! new row), `cx` is a byte index into that row. Everything on screen is
//! derived from it: `rx` is the render column of `cx`, and the two offsets
//! choose which slice of the document is visible.
//!
//! [`scroll`](Viewport::scroll) must run before every frame. It recomputes
//! `rx` and nudges the offsets just far enough to bring the cursor back into
//! view.

use crate::document::Document;

/// A single-step cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Up,
    Down,
    Left,
    Right,
}

/// Cursor position, scroll offsets and the size of the text area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    pub(crate) cx: usize,
    pub(crate) cy: usize,
    rx: usize,
    pub(crate) row_off: usize,
    pub(crate) col_off: usize,
    rows: usize,
    cols: usize,
}

/// Saved cursor and offsets, for undoing a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    cx: usize,
    cy: usize,
    row_off: usize,
    col_off: usize,
}

impl Viewport {
    /// A viewport over a text area of `rows` × `cols` cells.
    #[must_use]
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// `(cx, cy)`: byte column and row of the cursor.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> (usize, usize) {
        (self.cx, self.cy)
    }

    /// Render column of the cursor as of the last [`scroll`](Self::scroll).
    #[inline]
    #[must_use]
    pub const fn rx(&self) -> usize {
        self.rx
    }

    /// `(row_off, col_off)`: first visible row and render column.
    #[inline]
    #[must_use]
    pub const fn offsets(&self) -> (usize, usize) {
        (self.row_off, self.col_off)
    }

    /// Text area height in rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Text area width in columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Change the text area size.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        self.rows = rows;
        self.cols = cols;
    }

    /// Put the cursor at `(cx, cy)` without any clamping.
    pub fn set_cursor(&mut self, cx: usize, cy: usize) {
        self.cx = cx;
        self.cy = cy;
    }

    /// Capture cursor and offsets.
    #[must_use]
    pub const fn snapshot(&self) -> Snapshot {
        Snapshot {
            cx: self.cx,
            cy: self.cy,
            row_off: self.row_off,
            col_off: self.col_off,
        }
    }

    /// Return to a captured cursor and offsets.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.cx = snapshot.cx;
        self.cy = snapshot.cy;
        self.row_off = snapshot.row_off;
        self.col_off = snapshot.col_off;
    }

    // -- Scrolling ----------------------------------------------------------

    /// Recompute `rx` and clamp both offsets so the cursor is visible.
    pub fn scroll(&mut self, doc: &Document) {
        self.rx = doc.row(self.cy).map_or(0, |row| row.cx_to_rx(self.cx));

        if self.cy < self.row_off {
            self.row_off = self.cy;
        }
        if self.rows > 0 && self.cy >= self.row_off + self.rows {
            self.row_off = self.cy + 1 - self.rows;
        }
        if self.rx < self.col_off {
            self.col_off = self.rx;
        }
        if self.cols > 0 && self.rx >= self.col_off + self.cols {
            self.col_off = self.rx + 1 - self.cols;
        }
    }

    /// Cursor position on screen, relative to the text area.
    ///
    /// Only meaningful right after [`scroll`](Self::scroll).
    #[must_use]
    pub const fn screen_cursor(&self) -> (usize, usize) {
        (self.rx - self.col_off, self.cy - self.row_off)
    }

    // -- Motion -------------------------------------------------------------

    /// Move one step, wrapping across line ends horizontally, then snap the
    /// column to the length of the row the cursor landed on.
    pub fn move_cursor(&mut self, doc: &Document, motion: Motion) {
        let row_len = doc.row(self.cy).map(|row| row.len());

        match motion {
            Motion::Left => {
                if self.cx > 0 {
                    self.cx -= 1;
                } else if self.cy > 0 {
                    self.cy -= 1;
                    self.cx = doc.row(self.cy).map_or(0, |row| row.len());
                }
            }
            Motion::Right => match row_len {
                Some(len) if self.cx < len => self.cx += 1,
                Some(len) if self.cx == len => {
                    self.cy += 1;
                    self.cx = 0;
                }
                _ => {}
            },
            Motion::Up => self.cy = self.cy.saturating_sub(1),
            Motion::Down => {
                if self.cy < doc.len() {
                    self.cy += 1;
                }
            }
        }

        self.snap(doc);
    }

    /// Column 0 of the current row.
    pub const fn home(&mut self) {
        self.cx = 0;
    }

    /// End of the current row. Stays put on the virtual line past the end.
    pub fn end(&mut self, doc: &Document) {
        if let Some(row) = doc.row(self.cy) {
            self.cx = row.len();
        }
    }

    /// Jump to the top of the screen, then up one screen.
    pub fn page_up(&mut self, doc: &Document) {
        self.cy = self.row_off;
        for _ in 0..self.rows {
            self.move_cursor(doc, Motion::Up);
        }
    }

    /// Jump to the bottom of the screen, then down one screen.
    pub fn page_down(&mut self, doc: &Document) {
        self.cy = (self.row_off + self.rows).saturating_sub(1).min(doc.len());
        for _ in 0..self.rows {
            self.move_cursor(doc, Motion::Down);
        }
    }

    /// Clamp `cx` to the current row's length.
    pub fn snap(&mut self, doc: &Document) {
        let len = doc.row(self.cy).map_or(0, |row| row.len());
        self.cx = self.cx.min(len);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::from_bytes(text.as_bytes())
    }

    fn numbered(n: usize) -> Document {
        let text: String = (0..n).map(|i| format!("line {i}\n")).collect();
        doc(&text)
    }

    // -- Motion -------------------------------------------------------------

    #[test]
    fn left_at_column_zero_wraps_to_previous_row_end() {
        let d = doc("abc\nde\n");
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(0, 1);
        vp.move_cursor(&d, Motion::Left);
        assert_eq!(vp.cursor(), (3, 0));
    }

    #[test]
    fn left_at_origin_stays() {
        let d = doc("abc\n");
        let mut vp = Viewport::new(10, 20);
        vp.move_cursor(&d, Motion::Left);
        assert_eq!(vp.cursor(), (0, 0));
    }

    #[test]
    fn right_at_row_end_wraps_to_next_row_start() {
        let d = doc("ab\ncd\n");
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(2, 0);
        vp.move_cursor(&d, Motion::Right);
        assert_eq!(vp.cursor(), (0, 1));
    }

    #[test]
    fn right_on_virtual_line_does_nothing() {
        let d = doc("ab\n");
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(0, 1);
        vp.move_cursor(&d, Motion::Right);
        assert_eq!(vp.cursor(), (0, 1));
    }

    #[test]
    fn down_stops_on_virtual_line() {
        let d = doc("a\n");
        let mut vp = Viewport::new(10, 20);
        vp.move_cursor(&d, Motion::Down);
        vp.move_cursor(&d, Motion::Down);
        assert_eq!(vp.cursor(), (0, 1));
    }

    #[test]
    fn vertical_motion_snaps_column() {
        let d = doc("long line\nab\n");
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(8, 0);
        vp.move_cursor(&d, Motion::Down);
        assert_eq!(vp.cursor(), (2, 1));
        vp.move_cursor(&d, Motion::Up);
        assert_eq!(vp.cursor(), (2, 0));
    }

    #[test]
    fn home_and_end() {
        let d = doc("hello\n");
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(2, 0);
        vp.end(&d);
        assert_eq!(vp.cursor(), (5, 0));
        vp.home();
        assert_eq!(vp.cursor(), (0, 0));
    }

    // -- Paging -------------------------------------------------------------

    #[test]
    fn page_down_moves_a_screen_past_the_bottom_edge() {
        let d = numbered(50);
        let mut vp = Viewport::new(10, 20);
        vp.scroll(&d);
        vp.page_down(&d);
        assert_eq!(vp.cursor().1, 19);
    }

    #[test]
    fn page_down_clamps_to_virtual_line() {
        let d = numbered(5);
        let mut vp = Viewport::new(10, 20);
        vp.page_down(&d);
        assert_eq!(vp.cursor().1, 5);
    }

    #[test]
    fn page_up_from_scrolled_view() {
        let d = numbered(50);
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(0, 35);
        vp.scroll(&d);
        assert_eq!(vp.offsets().0, 26);
        vp.page_up(&d);
        assert_eq!(vp.cursor().1, 16);
    }

    #[test]
    fn page_up_near_top_stops_at_zero() {
        let d = numbered(50);
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(0, 3);
        vp.page_up(&d);
        assert_eq!(vp.cursor().1, 0);
    }

    // -- Scrolling ----------------------------------------------------------

    #[test]
    fn scroll_follows_cursor_down_and_up() {
        let d = numbered(50);
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(0, 15);
        vp.scroll(&d);
        assert_eq!(vp.offsets(), (6, 0));
        assert_eq!(vp.screen_cursor(), (0, 9));

        vp.set_cursor(0, 2);
        vp.scroll(&d);
        assert_eq!(vp.offsets(), (2, 0));
    }

    #[test]
    fn scroll_horizontally_uses_render_column() {
        let d = doc("\t\t\tx\n");
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(3, 0);
        vp.scroll(&d);
        assert_eq!(vp.rx(), 24);
        assert_eq!(vp.offsets(), (0, 5));
        assert_eq!(vp.screen_cursor(), (19, 0));
    }

    #[test]
    fn rx_is_zero_on_virtual_line() {
        let d = doc("abc\n");
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(0, 1);
        vp.scroll(&d);
        assert_eq!(vp.rx(), 0);
    }

    #[test]
    fn snapshot_restores_cursor_and_offsets() {
        let d = numbered(50);
        let mut vp = Viewport::new(10, 20);
        vp.set_cursor(4, 30);
        vp.scroll(&d);
        let snap = vp.snapshot();

        vp.set_cursor(0, 0);
        vp.scroll(&d);
        vp.restore(snap);
        assert_eq!(vp.cursor(), (4, 30));
        assert_eq!(vp.offsets(), (21, 0));
    }
}
