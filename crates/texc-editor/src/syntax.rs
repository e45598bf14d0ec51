//! Syntax definitions and filename-based selection.
//!
//! A definition is static data: which files it applies to, two tiers of
//! keywords, comment markers and two capability switches. The editor picks
//! one when a file is opened or saved under a new name.

/// Static description of a language's highlighting rules.
#[derive(Debug, PartialEq, Eq)]
pub struct Syntax {
    /// Short name shown in the status bar.
    pub name: &'static str,
    /// Filename patterns. Entries starting with `.` must equal the final
    /// extension; anything else matches as a substring of the name.
    pub file_match: &'static [&'static str],
    /// Primary keywords, shown as [`Keyword1`](crate::highlight::Highlight::Keyword1).
    pub keywords: &'static [&'static str],
    /// Type-ish keywords, shown as [`Keyword2`](crate::highlight::Highlight::Keyword2).
    pub secondary_keywords: &'static [&'static str],
    /// Marker that comments out the rest of the line.
    pub line_comment: Option<&'static str>,
    /// Start and end markers of a block comment.
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Color numeric literals.
    pub highlight_numbers: bool,
    /// Color quoted strings.
    pub highlight_strings: bool,
}

impl Syntax {
    /// Whether this definition applies to `filename`.
    #[must_use]
    pub fn matches(&self, filename: &str) -> bool {
        let ext = filename.rfind('.').map(|dot| &filename[dot..]);
        self.file_match.iter().any(|pattern| {
            if pattern.starts_with('.') {
                ext == Some(*pattern)
            } else {
                filename.contains(pattern)
            }
        })
    }
}

/// C and C-like sources.
pub static C: Syntax = Syntax {
    name: "c",
    file_match: &[".c", ".h", ".cpp"],
    keywords: &[
        "switch", "if", "while", "for", "break", "continue", "return", "else", "struct", "union",
        "typedef", "static", "enum", "class", "case", "int",
    ],
    secondary_keywords: &["long", "double", "float", "char", "unsigned", "signed", "void"],
    line_comment: Some("//"),
    block_comment: Some(("/*", "*/")),
    highlight_numbers: true,
    highlight_strings: true,
};

/// Every known definition, in match priority order.
pub static DATABASE: &[&Syntax] = &[&C];

/// The first definition in [`DATABASE`] that matches `filename`.
#[must_use]
pub fn select(filename: &str) -> Option<&'static Syntax> {
    DATABASE.iter().copied().find(|syntax| syntax.matches(filename))
}
