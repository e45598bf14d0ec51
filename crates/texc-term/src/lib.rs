// SPDX-License-Identifier: MIT
//
// texc-term: the terminal layer of the texc editor.
//
// Raw-mode control over termios, a bounded-timeout stdin reader, a
// stateless key decoder for the VT100 sequences the editor understands,
// and a frame buffer that turns a whole screen into one write. Everything
// above this crate talks in keys and bytes; nothing above it touches a file
// descriptor.
//
// There is no TUI framework underneath. The escape sequences live in
// `ansi`; the platform calls are limited to termios, ioctl, poll and
// sigaction.

pub mod ansi;
pub mod event_loop;
pub mod input;
pub mod output;
pub mod reader;
pub mod terminal;
