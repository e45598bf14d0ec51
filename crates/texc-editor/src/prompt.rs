//! Single-line input on the message bar.
//!
//! A [`Prompt`] is a small state machine fed one key at a time. It owns the
//! typed text and decides when input is confirmed or abandoned; whoever
//! drives it (save-as, search) reacts to the returned [`PromptEvent`].

use texc_term::input::Key;

/// What a key did to the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
    /// Still editing. The input may or may not have changed.
    Continue,
    /// Enter with non-empty input.
    Confirmed(String),
    /// Escape.
    Cancelled,
}

/// Prompt text and the input typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    template: &'static str,
    input: String,
}

impl Prompt {
    /// A prompt whose message is `template` with `{}` replaced by the input.
    #[must_use]
    pub const fn new(template: &'static str) -> Self {
        Self {
            template,
            input: String::new(),
        }
    }

    /// The input typed so far.
    #[inline]
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The message bar text for the current input.
    #[must_use]
    pub fn message(&self) -> String {
        self.template.replacen("{}", &self.input, 1)
    }

    /// Apply one key.
    ///
    /// Backspace, Delete and Ctrl-H remove the last byte. Printable ASCII
    /// is appended. Enter on empty input is ignored.
    pub fn on_key(&mut self, key: Key) -> PromptEvent {
        match key {
            Key::Backspace | Key::Delete | Key::Ctrl(b'h') => {
                self.input.pop();
                PromptEvent::Continue
            }
            Key::Escape => PromptEvent::Cancelled,
            Key::Enter if !self.input.is_empty() => {
                PromptEvent::Confirmed(std::mem::take(&mut self.input))
            }
            Key::Char(b @ 0x20..=0x7E) => {
                self.input.push(char::from(b));
                PromptEvent::Continue
            }
            _ => PromptEvent::Continue,
        }
    }
}
