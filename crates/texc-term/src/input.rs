// SPDX-License-Identifier: MIT
//
// Terminal key decoder.
//
// Turns raw stdin bytes into logical keys, one key per call:
//
// - Plain bytes: printable characters, Enter, Tab, Backspace, Ctrl+letter
// - CSI sequences `ESC [ <digit> ~` for Home/Delete/End/PageUp/PageDown
//   (both `1`/`7` and `4`/`8` encodings of Home/End)
// - CSI sequences `ESC [ <letter>` for arrows and Home/End
// - SS3 sequences `ESC O H` / `ESC O F` for the alternate Home/End encoding
//
// # Design
//
// The decoder has no state between calls. It pulls bytes from a
// [`ByteSource`] that waits a bounded time for each one. If no byte arrives
// at all, [`read_key`] returns `Ok(None)` and the caller simply tries again.
// After an ESC the next two bytes must arrive within the same timeout;
// otherwise the user pressed Escape on its own. Any sequence we don't
// recognize also degrades to a plain Escape. Its remaining bytes have
// already been consumed, so they never leak into the document as text.

use std::io;

use crate::reader::ByteSource;

// ─── Key ─────────────────────────────────────────────────────────────────────

/// A decoded key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A byte that is not a control code: printable ASCII or any byte
    /// `>= 0x80`. Bytes are columns; no UTF-8 decoding happens here.
    Char(u8),
    /// A control byte other than Tab, Enter and Escape, named by the key
    /// pressed with Ctrl: `0x11` is `Ctrl(b'q')`, `0x00` is `Ctrl(b'@')`.
    /// Letters are lowercase.
    Ctrl(u8),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

impl Key {
    /// Classify a single byte that is not the start of an escape sequence.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            b'\r' => Self::Enter,
            b'\t' => Self::Tab,
            0x1B => Self::Escape,
            0x7F => Self::Backspace,
            b @ 0x01..=0x1A => Self::Ctrl(b'a' + b - 1),
            b @ (0x00 | 0x1C..=0x1F) => Self::Ctrl(b + b'@'),
            b => Self::Char(b),
        }
    }

    /// The byte this key inserts into a row, if it inserts one.
    ///
    /// Control keys insert their raw control byte (the renderer shows them
    /// as inverse `^`-style glyphs); navigation keys insert nothing.
    #[must_use]
    pub const fn byte(self) -> Option<u8> {
        match self {
            Self::Char(b) => Some(b),
            Self::Ctrl(c) => Some(c & 0x1F),
            Self::Tab => Some(b'\t'),
            Self::Enter => Some(b'\r'),
            Self::Escape => Some(0x1B),
            Self::Backspace => Some(0x7F),
            _ => None,
        }
    }

    /// Whether this is `Ctrl` plus the given (lowercase) letter.
    #[inline]
    #[must_use]
    pub const fn is_ctrl(self, letter: u8) -> bool {
        matches!(self, Self::Ctrl(c) if c == letter)
    }
}

// ─── Decoder ─────────────────────────────────────────────────────────────────

/// Read one key from `source`.
///
/// Returns `Ok(None)` when no byte arrived within the source's timeout.
/// That is not an error; the caller should retry (and may redraw first).
///
/// # Errors
///
/// Propagates read errors from the byte source.
pub fn read_key(source: &mut impl ByteSource) -> io::Result<Option<Key>> {
    let Some(first) = source.read_byte()? else {
        return Ok(None);
    };

    if first == 0x1B {
        decode_escape(source).map(Some)
    } else {
        Ok(Some(Key::from_byte(first)))
    }
}

/// Decode what follows an ESC byte.
fn decode_escape(source: &mut impl ByteSource) -> io::Result<Key> {
    let Some(intro) = source.read_byte()? else {
        return Ok(Key::Escape);
    };
    let Some(code) = source.read_byte()? else {
        return Ok(Key::Escape);
    };

    let key = match (intro, code) {
        (b'[', b'0'..=b'9') => {
            let Some(terminator) = source.read_byte()? else {
                return Ok(Key::Escape);
            };
            if terminator == b'~' {
                tilde_key(code)
            } else {
                Key::Escape
            }
        }
        (b'[', _) => csi_letter_key(code),
        (b'O', b'H') => Key::Home,
        (b'O', b'F') => Key::End,
        _ => Key::Escape,
    };

    Ok(key)
}

/// `ESC [ <digit> ~` keys.
const fn tilde_key(digit: u8) -> Key {
    match digit {
        b'1' | b'7' => Key::Home,
        b'3' => Key::Delete,
        b'4' | b'8' => Key::End,
        b'5' => Key::PageUp,
        b'6' => Key::PageDown,
        _ => Key::Escape,
    }
}

/// `ESC [ <letter>` keys.
const fn csi_letter_key(letter: u8) -> Key {
    match letter {
        b'A' => Key::Up,
        b'B' => Key::Down,
        b'C' => Key::Right,
        b'D' => Key::Left,
        b'H' => Key::Home,
        b'F' => Key::End,
        _ => Key::Escape,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
