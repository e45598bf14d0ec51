//! The document: an ordered list of rows plus file metadata.
//!
//! Every edit goes through a method here so three things always happen
//! together: the dirty counter grows, rows after the edit point learn their
//! new index, and the highlight of the touched row is recomputed.
//!
//! # Highlight cascade
//!
//! A row's highlight depends on whether the row above ends inside a block
//! comment. After rescanning an edited row we walk forward and rescan each
//! following row whose remembered incoming state no longer matches, stopping
//! at the first row that is still valid. Opening a `/*` at the top of a long
//! file therefore touches every row below it once, in a plain loop.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::highlight::Highlight;
use crate::row::Row;
use crate::syntax::{self, Syntax};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from loading or saving a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be read.
    #[error("cannot open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Save was requested for a document that has no file name yet.
    #[error("no file name")]
    NoPath,
    /// Writing the file failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Rows, a dirty counter, the active syntax and the backing file.
#[derive(Debug, Default)]
pub struct Document {
    rows: Vec<Row>,
    dirty: usize,
    syntax: Option<&'static Syntax>,
    path: Option<PathBuf>,
}

impl Document {
    // -- Construction -------------------------------------------------------

    /// An empty, unnamed document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from file contents.
    ///
    /// Lines are split on `\n` and lose any trailing `\r`. A final newline
    /// does not produce an extra empty row. The result is clean.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut doc = Self::new();
        for line in split_lines(bytes) {
            doc.insert_row(doc.rows.len(), line);
        }
        doc.dirty = 0;
        doc
    }

    /// Load `path` and pick a syntax from its name.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Open`] if the file cannot be read.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let bytes = fs::read(path).map_err(|source| DocumentError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = Self::from_bytes(&bytes);
        doc.path = Some(path.to_path_buf());
        doc.select_syntax(&path.to_string_lossy());
        tracing::debug!(path = %path.display(), rows = doc.rows.len(), "document loaded");
        Ok(doc)
    }

    // -- Access -------------------------------------------------------------

    /// All rows in order.
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The row at `index`, if there is one.
    #[inline]
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the document has no rows at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// How many edits happened since the last load or save.
    #[inline]
    #[must_use]
    pub const fn dirty(&self) -> usize {
        self.dirty
    }

    /// Whether there are unsaved edits.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty > 0
    }

    /// The active syntax definition.
    #[inline]
    #[must_use]
    pub const fn syntax(&self) -> Option<&'static Syntax> {
        self.syntax
    }

    /// The backing file, if the document has one.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // -- Syntax -------------------------------------------------------------

    /// Choose a syntax for `filename` and rehighlight every row.
    pub fn select_syntax(&mut self, filename: &str) {
        self.set_syntax(syntax::select(filename));
        tracing::debug!(filename, syntax = self.syntax.map(|s| s.name), "syntax selected");
    }

    /// Set the syntax directly and rehighlight every row.
    pub fn set_syntax(&mut self, syntax: Option<&'static Syntax>) {
        self.syntax = syntax;
        let mut incoming = false;
        for row in &mut self.rows {
            incoming = row.update_highlight(syntax, incoming);
        }
    }

    // -- Row edits ----------------------------------------------------------

    /// Insert a new row holding `text` before row `at` (clamped to the end).
    pub fn insert_row(&mut self, at: usize, text: impl Into<Vec<u8>>) {
        let at = at.min(self.rows.len());
        self.rows.insert(at, Row::new(at, text));
        self.reindex_from(at + 1);
        self.rehighlight_from(at);
        self.dirty += 1;
    }

    /// Remove row `at`. Out of range is a no-op.
    pub fn delete_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            return;
        }
        self.rows.remove(at);
        self.reindex_from(at);
        self.rehighlight_from(at);
        self.dirty += 1;
    }

    /// Insert `byte` into row `row` before character `at`.
    ///
    /// `at` is clamped to the row length. A missing row is a no-op.
    pub fn insert_char(&mut self, row: usize, at: usize, byte: u8) {
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        target.insert(at, byte);
        self.rehighlight_from(row);
        self.dirty += 1;
    }

    /// Remove the character at `at` from row `row`.
    ///
    /// A missing row or a position past the row end is a no-op.
    pub fn delete_char(&mut self, row: usize, at: usize) {
        let removed = self.rows.get_mut(row).is_some_and(|target| target.remove(at));
        if removed {
            self.rehighlight_from(row);
            self.dirty += 1;
        }
    }

    /// Append `text` to the end of row `row`.
    pub fn append_text(&mut self, row: usize, text: &[u8]) {
        let Some(target) = self.rows.get_mut(row) else {
            return;
        };
        target.extend(text);
        self.rehighlight_from(row);
        self.dirty += 1;
    }

    /// Break row `row` at character `at`, moving the tail to a new row below.
    ///
    /// Splitting at column 0 inserts an empty row above instead, which
    /// leaves the original row (and its highlight) untouched.
    pub fn split_row(&mut self, row: usize, at: usize) {
        if row >= self.rows.len() {
            return;
        }
        if at == 0 {
            self.insert_row(row, Vec::new());
            return;
        }
        let tail = self.rows[row].split_off(at);
        self.rows.insert(row + 1, Row::new(row + 1, tail));
        self.reindex_from(row + 2);
        self.rehighlight_from(row);
        self.dirty += 1;
    }

    /// The whole document as file bytes: every row followed by `\n`.
    #[must_use]
    pub fn rows_to_bytes(&self) -> Vec<u8> {
        let total = self.rows.iter().map(|r| r.len() + 1).sum();
        let mut out = Vec::with_capacity(total);
        for row in &self.rows {
            out.extend_from_slice(row.chars());
            out.push(b'\n');
        }
        out
    }

    // -- Search overlay -----------------------------------------------------

    /// Paint `len` render columns of `row` from `start` as a search match.
    ///
    /// Returns the highlight as it was before, for
    /// [`restore_highlight`](Self::restore_highlight).
    pub fn overlay_match(&mut self, row: usize, start: usize, len: usize) -> Option<Vec<Highlight>> {
        let target = self.rows.get_mut(row)?;
        let saved = target.highlight().to_vec();
        target.overlay_match(start, len);
        Some(saved)
    }

    /// Undo an [`overlay_match`](Self::overlay_match).
    pub fn restore_highlight(&mut self, row: usize, saved: Vec<Highlight>) {
        if let Some(target) = self.rows.get_mut(row) {
            target.restore_highlight(saved);
        }
    }

    // -- File I/O -----------------------------------------------------------

    /// Write the document to its file.
    ///
    /// Returns the number of bytes written and marks the document clean.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::NoPath`] for an unnamed document, or the I/O
    /// error that stopped the write. The document is unchanged on error.
    pub fn save(&mut self) -> Result<usize, DocumentError> {
        let path = self.path.as_deref().ok_or(DocumentError::NoPath)?;
        let bytes = self.rows_to_bytes();

        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }

        let mut file = options.open(path)?;
        file.set_len(bytes.len() as u64)?;
        file.write_all(&bytes)?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "document saved");
        self.dirty = 0;
        Ok(bytes.len())
    }

    /// Give the document a file name, reselect its syntax and save.
    ///
    /// # Errors
    ///
    /// As for [`save`](Self::save). The new name sticks even if the write
    /// fails.
    pub fn save_as(&mut self, path: &Path) -> Result<usize, DocumentError> {
        self.path = Some(path.to_path_buf());
        self.select_syntax(&path.to_string_lossy());
        self.save()
    }

    // -- Internals ----------------------------------------------------------

    fn reindex_from(&mut self, start: usize) {
        for (index, row) in self.rows.iter_mut().enumerate().skip(start) {
            row.set_index(index);
        }
    }

    /// Rescan row `start`, then every following row whose incoming
    /// block-comment state changed.
    fn rehighlight_from(&mut self, start: usize) {
        let syntax = self.syntax;
        let mut incoming = start
            .checked_sub(1)
            .and_then(|prev| self.rows.get(prev))
            .is_some_and(Row::comment_open);

        let mut rescanned = 0usize;
        for row in self.rows.iter_mut().skip(start) {
            if rescanned > 0 && !row.is_stale(incoming) {
                break;
            }
            incoming = row.update_highlight(syntax, incoming);
            rescanned += 1;
        }

        if rescanned > 1 {
            tracing::trace!(start, rescanned, "highlight cascade");
        }
    }
}

/// Split file contents into lines the way `getline` sees them.
fn split_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let lines = (!bytes.is_empty()).then(|| body.split(|&b| b == b'\n'));
    lines.into_iter().flatten().map(|mut line| {
        while let [rest @ .., b'\r'] = line {
            line = rest;
        }
        line
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
