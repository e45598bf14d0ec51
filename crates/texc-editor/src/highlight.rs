//! Line-at-a-time syntax highlighting.
//!
//! [`highlight_line`] scans one row's render bytes left to right and
//! assigns each byte a [`Highlight`] class. The only state that crosses a
//! line boundary is whether the line ends inside a block comment; the
//! caller feeds that into the next row and rescans it when it changes.
//!
//! # Precedence
//!
//! At every position the scanner tries, in order:
//!
//! 1. a line comment marker (outside strings and block comments), which
//!    colors the rest of the row and stops
//! 2. block comments: inside one, look for the end marker; outside one
//!    (and outside a string), look for the start marker
//! 3. strings, with backslash escaping the next byte
//! 4. numbers: a digit after a separator or after another number byte, or a
//!    `.` after a number byte. `1.2.3` is a number as far as we care.
//! 5. keywords, only right after a separator and only when followed by one
//!
//! Anything else is [`Highlight::Normal`].

use texc_term::ansi::Color;

use crate::syntax::Syntax;

// ---------------------------------------------------------------------------
// Highlight classes
// ---------------------------------------------------------------------------

/// The highlight class of one rendered byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Highlight {
    #[default]
    Normal,
    String,
    Number,
    Comment,
    MultiLineComment,
    Keyword1,
    Keyword2,
    /// Current search match. Never produced by the scanner.
    Match,
}

impl Highlight {
    /// Foreground color used to draw this class.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Number => Color::Red,
            Self::Comment | Self::MultiLineComment => Color::Green,
            Self::String => Color::Yellow,
            Self::Match => Color::Blue,
            Self::Keyword1 => Color::Magenta,
            Self::Keyword2 => Color::Cyan,
            Self::Normal => Color::Default,
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Whether `byte` ends a word for number and keyword purposes.
#[must_use]
pub const fn is_separator(byte: u8) -> bool {
    byte.is_ascii_whitespace()
        || byte == 0
        || matches!(
            byte,
            b',' | b'.' | b'(' | b')' | b'+' | b'-' | b'/' | b'*' | b'=' | b'~' | b'%' | b'<'
                | b'>' | b'[' | b']' | b';'
        )
}

/// Highlight one row.
///
/// `in_comment` says whether the previous row ended inside a block comment.
/// Returns the class of every byte of `render` and whether this row ends
/// inside a block comment.
#[must_use]
pub fn highlight_line(render: &[u8], syntax: &Syntax, in_comment: bool) -> (Vec<Highlight>, bool) {
    let mut hl = vec![Highlight::Normal; render.len()];
    let line_comment = syntax.line_comment.filter(|m| !m.is_empty()).map(str::as_bytes);
    let block_comment = syntax
        .block_comment
        .filter(|(start, end)| !start.is_empty() && !end.is_empty())
        .map(|(start, end)| (start.as_bytes(), end.as_bytes()));

    let mut prev_sep = true;
    let mut in_string: Option<u8> = None;
    let mut in_comment = in_comment;
    let mut i = 0;

    while i < render.len() {
        let c = render[i];
        let rest = &render[i..];
        let prev_hl = if i > 0 { hl[i - 1] } else { Highlight::Normal };

        let line_comment_here = line_comment
            .is_some_and(|marker| in_string.is_none() && !in_comment && rest.starts_with(marker));
        if line_comment_here {
            hl[i..].fill(Highlight::Comment);
            break;
        }

        if let (Some((start, end)), None) = (block_comment, in_string) {
            if in_comment {
                if rest.starts_with(end) {
                    hl[i..i + end.len()].fill(Highlight::MultiLineComment);
                    i += end.len();
                    in_comment = false;
                    prev_sep = true;
                } else {
                    hl[i] = Highlight::MultiLineComment;
                    i += 1;
                }
                continue;
            }
            if rest.starts_with(start) {
                hl[i..i + start.len()].fill(Highlight::MultiLineComment);
                i += start.len();
                in_comment = true;
                continue;
            }
        }

        if syntax.highlight_strings {
            if let Some(quote) = in_string {
                hl[i] = Highlight::String;
                if c == b'\\' && i + 1 < render.len() {
                    hl[i + 1] = Highlight::String;
                    i += 2;
                    continue;
                }
                if c == quote {
                    in_string = None;
                }
                i += 1;
                prev_sep = true;
                continue;
            }
            if c == b'"' || c == b'\'' {
                in_string = Some(c);
                hl[i] = Highlight::String;
                i += 1;
                continue;
            }
        }

        if syntax.highlight_numbers
            && ((c.is_ascii_digit() && (prev_sep || prev_hl == Highlight::Number))
                || (c == b'.' && prev_hl == Highlight::Number))
        {
            hl[i] = Highlight::Number;
            i += 1;
            prev_sep = false;
            continue;
        }

        if prev_sep {
            if let Some((len, class)) = keyword_at(rest, syntax) {
                hl[i..i + len].fill(class);
                i += len;
                prev_sep = false;
                continue;
            }
        }

        prev_sep = is_separator(c);
        i += 1;
    }

    (hl, in_comment)
}

/// The keyword starting at `rest[0]`, if one is there and is followed by a
/// separator or the end of the row.
fn keyword_at(rest: &[u8], syntax: &Syntax) -> Option<(usize, Highlight)> {
    let tiers = [
        (syntax.keywords, Highlight::Keyword1),
        (syntax.secondary_keywords, Highlight::Keyword2),
    ];
    tiers.into_iter().find_map(|(words, class)| {
        words.iter().find_map(|word| {
            let word = word.as_bytes();
            let bounded = rest.get(word.len()).is_none_or(|&b| is_separator(b));
            (rest.starts_with(word) && bounded).then_some((word.len(), class))
        })
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::C;
    use pretty_assertions::assert_eq;

    use crate::highlight::Highlight::{
        Comment as Co, Keyword1 as K1, Keyword2 as K2, MultiLineComment as Ml, Normal as N,
        Number as Nu, String as St,
    };

    fn scan(text: &str) -> Vec<Highlight> {
        highlight_line(text.as_bytes(), &C, false).0
    }

    // -- Colors -------------------------------------------------------------

    #[test]
    fn class_colors() {
        assert_eq!(Highlight::Number.color(), Color::Red);
        assert_eq!(Highlight::Comment.color(), Color::Green);
        assert_eq!(Highlight::MultiLineComment.color(), Color::Green);
        assert_eq!(Highlight::String.color(), Color::Yellow);
        assert_eq!(Highlight::Match.color(), Color::Blue);
        assert_eq!(Highlight::Keyword1.color(), Color::Magenta);
        assert_eq!(Highlight::Keyword2.color(), Color::Cyan);
        assert_eq!(Highlight::Normal.color(), Color::Default);
    }

    // -- Separators ---------------------------------------------------------

    #[test]
    fn separators() {
        for &b in b" \t,.()+-/*=~%<>[];\0" {
            assert!(is_separator(b), "{b:?}");
        }
        for &b in b"a_Z09{}\"'#" {
            assert!(!is_separator(b), "{b:?}");
        }
    }

    // -- Comments -----------------------------------------------------------

    #[test]
    fn line_comment_colors_rest_of_row() {
        assert_eq!(scan("x // y"), vec![N, N, Co, Co, Co, Co]);
    }

    #[test]
    fn line_comment_inside_string_is_string() {
        assert_eq!(scan("\"//\""), vec![St; 4]);
    }

    #[test]
    fn block_comment_within_row() {
        let (hl, open) = highlight_line(b"a/**/b", &C, false);
        assert_eq!(hl, vec![N, Ml, Ml, Ml, Ml, N]);
        assert!(!open);
    }

    #[test]
    fn unterminated_block_comment_stays_open() {
        let (hl, open) = highlight_line(b"x /* y", &C, false);
        assert_eq!(hl, vec![N, N, Ml, Ml, Ml, Ml]);
        assert!(open);
    }

    #[test]
    fn incoming_comment_state_continues() {
        let (hl, open) = highlight_line(b"a */ if", &C, true);
        assert_eq!(hl, vec![Ml, Ml, Ml, Ml, N, K1, K1]);
        assert!(!open);
    }

    #[test]
    fn line_comment_marker_inside_block_comment_is_ignored() {
        let (hl, open) = highlight_line(b"// */", &C, true);
        assert_eq!(hl, vec![Ml; 5]);
        assert!(!open);
    }

    #[test]
    fn open_comment_on_empty_row_carries_through() {
        let (hl, open) = highlight_line(b"", &C, true);
        assert!(hl.is_empty());
        assert!(open);
    }

    // -- Strings ------------------------------------------------------------

    #[test]
    fn strings_with_both_quotes() {
        assert_eq!(scan("'a' \"b\""), vec![St, St, St, N, St, St, St]);
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        assert_eq!(scan(r#""\"" x"#), vec![St, St, St, St, N, N]);
    }

    #[test]
    fn block_start_inside_string_is_string() {
        let (hl, open) = highlight_line(b"\"/*\"", &C, false);
        assert_eq!(hl, vec![St; 4]);
        assert!(!open);
    }

    // -- Numbers ------------------------------------------------------------

    #[test]
    fn numbers_after_separator() {
        assert_eq!(scan("x=42;"), vec![N, N, Nu, Nu, N]);
    }

    #[test]
    fn digits_inside_identifiers_are_plain() {
        assert_eq!(scan("x1"), vec![N, N]);
    }

    #[test]
    fn permissive_decimal_points() {
        assert_eq!(scan("1.2.3"), vec![Nu; 5]);
    }

    #[test]
    fn leading_dot_is_not_a_number() {
        assert_eq!(scan(".5"), vec![N, Nu]);
    }

    // -- Keywords -----------------------------------------------------------

    #[test]
    fn keyword_tiers() {
        assert_eq!(scan("int x"), vec![K1, K1, K1, N, N]);
        assert_eq!(scan("struct"), vec![K1; 6]);
        assert_eq!(scan("long"), vec![K2; 4]);
    }

    #[test]
    fn type_names_other_than_int_are_secondary() {
        let unsigned_long = [vec![K2; 8], vec![N], vec![K2; 4], vec![N, N]].concat();
        assert_eq!(scan("unsigned long n"), unsigned_long);
        let static_void = [vec![K1; 6], vec![N], vec![K2; 4], vec![N, N]].concat();
        assert_eq!(scan("static void f"), static_void);
    }

    #[test]
    fn keyword_needs_trailing_separator() {
        assert_eq!(scan("integer"), vec![N; 7]);
    }

    #[test]
    fn keyword_needs_leading_separator() {
        assert_eq!(scan("xif"), vec![N; 3]);
    }

    #[test]
    fn keyword_followed_by_paren() {
        assert_eq!(scan("if(x)"), vec![K1, K1, N, N, N]);
    }

    #[test]
    fn keyword_after_string_end() {
        assert_eq!(scan("\"\"if"), vec![St, St, K1, K1]);
    }

    // -- Invariants ---------------------------------------------------------

    #[test]
    fn output_len_matches_input() {
        for text in ["", "int main(void) { return 0; } // x", "/* a \"b\" */ 'c"] {
            assert_eq!(scan(text).len(), text.len());
        }
    }

    #[test]
    fn rescanning_is_idempotent() {
        let line = b"for (int i = 0; i < 10; i++) /* loop";
        let first = highlight_line(line, &C, false);
        let second = highlight_line(line, &C, false);
        assert_eq!(first, second);
    }

    #[test]
    fn disabled_capabilities() {
        static PLAIN: Syntax = Syntax {
            name: "plain",
            file_match: &[],
            keywords: &[],
            secondary_keywords: &[],
            line_comment: None,
            block_comment: None,
            highlight_numbers: false,
            highlight_strings: false,
        };
        let (hl, open) = highlight_line(b"1 \"s\" /* //", &PLAIN, false);
        assert!(hl.iter().all(|&h| h == N));
        assert!(!open);
    }
}
