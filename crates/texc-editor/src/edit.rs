//! Cursor-relative edits.
//!
//! The [`Document`] edits by row and column; these functions edit "at the
//! cursor" and move the cursor to where the user expects it afterwards.

use crate::document::Document;
use crate::viewport::Viewport;

/// Type `byte` at the cursor.
///
/// On the virtual line past the last row, a new empty row is appended
/// first so there is something to type into.
pub fn insert_char(doc: &mut Document, viewport: &mut Viewport, byte: u8) {
    let (cx, cy) = viewport.cursor();
    if cy == doc.len() {
        doc.insert_row(doc.len(), Vec::new());
    }
    doc.insert_char(cy, cx, byte);
    viewport.set_cursor(cx + 1, cy);
}

/// Break the line at the cursor and move to the start of the new line.
pub fn insert_newline(doc: &mut Document, viewport: &mut Viewport) {
    let (cx, cy) = viewport.cursor();
    if cx == 0 {
        doc.insert_row(cy, Vec::new());
    } else {
        doc.split_row(cy, cx);
    }
    viewport.set_cursor(0, cy + 1);
}

/// Delete the character left of the cursor.
///
/// At column 0 the current line is joined onto the previous one and the
/// cursor lands at the join point. Nothing happens at the very start of
/// the document or on the virtual line.
pub fn delete_char(doc: &mut Document, viewport: &mut Viewport) {
    let (cx, cy) = viewport.cursor();
    if cy >= doc.len() || (cx == 0 && cy == 0) {
        return;
    }

    if cx > 0 {
        doc.delete_char(cy, cx - 1);
        viewport.set_cursor(cx - 1, cy);
        return;
    }

    let Some(current) = doc.row(cy).map(|row| row.chars().to_vec()) else {
        return;
    };
    let join_at = doc.row(cy - 1).map_or(0, |row| row.len());
    doc.append_text(cy - 1, &current);
    doc.delete_row(cy);
    viewport.set_cursor(join_at, cy - 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup(text: &str, cx: usize, cy: usize) -> (Document, Viewport) {
        let doc = Document::from_bytes(text.as_bytes());
        let mut vp = Viewport::new(10, 40);
        vp.set_cursor(cx, cy);
        (doc, vp)
    }

    fn lines(doc: &Document) -> Vec<String> {
        doc.rows()
            .iter()
            .map(|r| String::from_utf8_lossy(r.chars()).into_owned())
            .collect()
    }

    // -- insert_char --------------------------------------------------------

    #[test]
    fn insert_advances_cursor() {
        let (mut doc, mut vp) = setup("ac\n", 1, 0);
        insert_char(&mut doc, &mut vp, b'b');
        assert_eq!(lines(&doc), vec!["abc"]);
        assert_eq!(vp.cursor(), (2, 0));
    }

    #[test]
    fn insert_on_virtual_line_appends_row() {
        let (mut doc, mut vp) = setup("x\n", 0, 1);
        let before = doc.dirty();
        insert_char(&mut doc, &mut vp, b'y');
        assert_eq!(lines(&doc), vec!["x", "y"]);
        assert_eq!(vp.cursor(), (1, 1));
        assert!(doc.dirty() > before);
    }

    #[test]
    fn insert_into_empty_document() {
        let (mut doc, mut vp) = setup("", 0, 0);
        insert_char(&mut doc, &mut vp, b'a');
        assert_eq!(lines(&doc), vec!["a"]);
    }

    // -- insert_newline -----------------------------------------------------

    #[test]
    fn newline_splits_line() {
        let (mut doc, mut vp) = setup("hello world\n", 5, 0);
        insert_newline(&mut doc, &mut vp);
        assert_eq!(lines(&doc), vec!["hello", " world"]);
        assert_eq!(vp.cursor(), (0, 1));
    }

    #[test]
    fn newline_at_column_zero_pushes_line_down() {
        let (mut doc, mut vp) = setup("a\nb\n", 0, 1);
        insert_newline(&mut doc, &mut vp);
        assert_eq!(lines(&doc), vec!["a", "", "b"]);
        assert_eq!(vp.cursor(), (0, 2));
    }

    #[test]
    fn newline_on_virtual_line_appends_row() {
        let (mut doc, mut vp) = setup("a\n", 0, 1);
        insert_newline(&mut doc, &mut vp);
        assert_eq!(lines(&doc), vec!["a", ""]);
        assert_eq!(vp.cursor(), (0, 2));
    }

    // -- delete_char --------------------------------------------------------

    #[test]
    fn backspace_in_line() {
        let (mut doc, mut vp) = setup("abc\n", 2, 0);
        delete_char(&mut doc, &mut vp);
        assert_eq!(lines(&doc), vec!["ac"]);
        assert_eq!(vp.cursor(), (1, 0));
    }

    #[test]
    fn backspace_at_line_start_joins_previous() {
        let (mut doc, mut vp) = setup("foo\nbar\n", 0, 1);
        delete_char(&mut doc, &mut vp);
        assert_eq!(lines(&doc), vec!["foobar"]);
        assert_eq!(vp.cursor(), (3, 0));
    }

    #[test]
    fn backspace_at_document_start_is_noop() {
        let (mut doc, mut vp) = setup("abc\n", 0, 0);
        delete_char(&mut doc, &mut vp);
        assert_eq!(lines(&doc), vec!["abc"]);
        assert_eq!(doc.dirty(), 0);
    }

    #[test]
    fn backspace_on_virtual_line_is_noop() {
        let (mut doc, mut vp) = setup("abc\n", 0, 1);
        delete_char(&mut doc, &mut vp);
        assert_eq!(lines(&doc), vec!["abc"]);
        assert_eq!(vp.cursor(), (0, 1));
    }

    #[test]
    fn join_keeps_row_indexes_consistent() {
        let (mut doc, mut vp) = setup("a\nb\nc\n", 0, 1);
        delete_char(&mut doc, &mut vp);
        for (i, row) in doc.rows().iter().enumerate() {
            assert_eq!(row.index(), i);
        }
        assert_eq!(lines(&doc), vec!["ab", "c"]);
    }
}
