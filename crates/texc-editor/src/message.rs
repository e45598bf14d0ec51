//! Transient status message shown under the status bar.

use std::time::{Duration, Instant};

/// How long a message stays on screen.
pub const MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// The message line's text and when it was set.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    text: String,
    set_at: Option<Instant>,
}

impl StatusMessage {
    /// An empty message.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            text: String::new(),
            set_at: None,
        }
    }

    /// Replace the message and restart its timer.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.set_at = Some(Instant::now());
    }

    /// The raw text, regardless of age.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text to draw at `now`, or `None` once it has expired.
    #[must_use]
    pub fn visible_at(&self, now: Instant) -> Option<&str> {
        let set_at = self.set_at?;
        (now.saturating_duration_since(set_at) < MESSAGE_TIMEOUT && !self.text.is_empty())
            .then_some(self.text.as_str())
    }

    /// The text to draw right now.
    #[must_use]
    pub fn visible(&self) -> Option<&str> {
        self.visible_at(Instant::now())
    }

    /// Whether the message was visible at `before` but no longer is at
    /// `now`. The event loop uses this to repaint exactly once on expiry.
    #[must_use]
    pub fn expired_between(&self, before: Instant, now: Instant) -> bool {
        self.visible_at(before).is_some() && self.visible_at(now).is_none()
    }
}

impl Default for StatusMessage {
    fn default() -> Self {
        Self::new()
    }
}
