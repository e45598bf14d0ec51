//! # texc-editor: editor core for texc
//!
//! Everything between decoded keys and frame bytes:
//!
//! - **[`row`]**: one line, its tab-expanded render and per-byte highlight
//! - **[`syntax`]**: static language definitions and filename matching
//! - **[`highlight`]**: the line scanner and its highlight classes
//! - **[`document`]**: the row store, dirty tracking and file I/O
//! - **[`viewport`]**: cursor, scroll offsets and cursor motion
//! - **[`edit`]**: cursor-relative insert, newline and delete
//! - **[`view`]**: frame rendering (rows, status bar, message line)
//! - **[`message`]**: the timed status message
//! - **[`prompt`]**: single-line input on the message bar
//! - **[`search`]**: incremental search with match overlay
//!
//! The crate never touches the terminal directly. It writes escape
//! sequences into a texc-term [`OutputBuffer`](texc_term::output::OutputBuffer)
//! and leaves flushing to the caller.

pub mod document;
pub mod edit;
pub mod highlight;
pub mod message;
pub mod prompt;
pub mod row;
pub mod search;
pub mod syntax;
pub mod view;
pub mod viewport;
