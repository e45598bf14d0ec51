//! Incremental search with a temporary match highlight.
//!
//! A [`Search`] lives for one search prompt. After every prompt key it
//! steps to the next row containing the query, moves the cursor there and
//! paints the match with [`Highlight::Match`]. The row's real highlight is
//! kept aside and put back before the next step, so at most one row carries
//! the overlay at any time.
//!
//! Matching is a literal byte substring test against each row's render
//! bytes, one match per row.
//!
//! # Keys
//!
//! - Right/Down: next match forward
//! - Left/Up: next match backward
//! - Enter/Escape: no step; the prompt is closing
//! - anything else (typing, deleting): restart from the top, forward
//!
//! An empty query matches at column 0 of the first row visited.

use texc_term::input::Key;

use crate::document::Document;
use crate::highlight::Highlight;
use crate::viewport::{Snapshot, Viewport};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SearchDirection {
    Forward,
    Backward,
}

impl SearchDirection {
    /// Row index after `current` in this direction, wrapping at both ends
    /// of a document with `len` rows.
    const fn step(self, current: usize, len: usize) -> usize {
        match self {
            Self::Forward => {
                if current + 1 >= len {
                    0
                } else {
                    current + 1
                }
            }
            Self::Backward => {
                if current == 0 {
                    len - 1
                } else {
                    current - 1
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Finding
// ---------------------------------------------------------------------------

/// Byte offset of the first occurrence of `needle` in `haystack`.
#[must_use]
pub fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// The next row after `last` (or the first row, when `last` is `None`)
/// whose render contains `query`, and the render column of the match.
///
/// Visits every row at most once, wrapping around the document. An empty
/// `query` is contained in every row at column 0.
#[must_use]
pub fn find_next(
    doc: &Document,
    query: &[u8],
    last: Option<usize>,
    direction: SearchDirection,
) -> Option<(usize, usize)> {
    let len = doc.len();
    if len == 0 {
        return None;
    }

    // With no previous match, start just "before" row 0 going forward.
    let (mut current, direction) = match last {
        Some(row) => (row.min(len - 1), direction),
        None => (len - 1, SearchDirection::Forward),
    };

    for _ in 0..len {
        current = direction.step(current, len);
        let row = doc.row(current)?;
        if let Some(rx) = find_bytes(row.render(), query) {
            return Some((current, rx));
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Search session
// ---------------------------------------------------------------------------

/// State of one search prompt.
#[derive(Debug)]
pub struct Search {
    last_match: Option<usize>,
    direction: SearchDirection,
    saved_highlight: Option<(usize, Vec<Highlight>)>,
    origin: Snapshot,
}

impl Search {
    /// Begin a search, remembering where the cursor was.
    #[must_use]
    pub const fn start(viewport: &Viewport) -> Self {
        Self {
            last_match: None,
            direction: SearchDirection::Forward,
            saved_highlight: None,
            origin: viewport.snapshot(),
        }
    }

    /// Row of the current match, if any.
    #[inline]
    #[must_use]
    pub const fn last_match(&self) -> Option<usize> {
        self.last_match
    }

    /// Direction of the next step.
    #[inline]
    #[must_use]
    pub const fn direction(&self) -> SearchDirection {
        self.direction
    }

    /// React to a key typed into the search prompt, with `query` being the
    /// prompt input after that key.
    pub fn on_key(&mut self, doc: &mut Document, viewport: &mut Viewport, query: &str, key: Key) {
        self.restore_highlight(doc);

        match key {
            Key::Enter | Key::Escape => {
                self.last_match = None;
                self.direction = SearchDirection::Forward;
                return;
            }
            Key::Right | Key::Down => self.direction = SearchDirection::Forward,
            Key::Left | Key::Up => self.direction = SearchDirection::Backward,
            _ => {
                self.last_match = None;
                self.direction = SearchDirection::Forward;
            }
        }
        if self.last_match.is_none() {
            self.direction = SearchDirection::Forward;
        }

        let Some((row, rx)) = find_next(doc, query.as_bytes(), self.last_match, self.direction)
        else {
            tracing::trace!(query, "search: no match");
            return;
        };

        tracing::trace!(query, row, rx, "search: match");
        self.last_match = Some(row);
        let cx = doc.row(row).map_or(0, |r| r.rx_to_cx(rx));
        viewport.set_cursor(cx, row);
        self.saved_highlight = doc
            .overlay_match(row, rx, query.len())
            .map(|saved| (row, saved));
    }

    /// Enter: keep the cursor on the last match.
    pub fn confirm(mut self, doc: &mut Document) {
        self.restore_highlight(doc);
    }

    /// Escape: drop the overlay and put the cursor and scroll back.
    pub fn cancel(mut self, doc: &mut Document, viewport: &mut Viewport) {
        self.restore_highlight(doc);
        viewport.restore(self.origin);
    }

    fn restore_highlight(&mut self, doc: &mut Document) {
        if let Some((row, saved)) = self.saved_highlight.take() {
            doc.restore_highlight(row, saved);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
