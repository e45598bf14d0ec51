// SPDX-License-Identifier: MIT
//
// texc: a small terminal text editor.
//
// This is the main binary that wires together the two crates:
//
//   texc-term   → raw mode, key decoding, output buffering, event loop
//   texc-editor → document, viewport, highlighting, search, rendering
//
// The Editor struct implements texc-term's App trait. Each keypress flows
// through:
//
//   stdin → read_key → on_key → mode dispatch → document/viewport mutation
//   paint → view::render_frame → output buffer → terminal
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text rows                    │  ← h - 2 rows
//   ├──────────────────────────────┤
//   │ status bar (inverse)         │  ← 1 row
//   ├──────────────────────────────┤
//   │ message / prompt line        │  ← 1 row
//   └──────────────────────────────┘

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use texc_editor::document::{Document, DocumentError};
use texc_editor::edit;
use texc_editor::message::StatusMessage;
use texc_editor::prompt::{Prompt, PromptEvent};
use texc_editor::search::Search;
use texc_editor::view;
use texc_editor::viewport::{Motion, Viewport};

use texc_term::event_loop::{Action, App, EventLoop};
use texc_term::input::Key;
use texc_term::output::OutputBuffer;
use texc_term::terminal::{self, Size};

/// Extra Ctrl-Q presses needed to quit with unsaved changes.
const QUIT_TIMES: usize = 2;

const HELP_MESSAGE: &str = "HELP: Ctrl-S = save | Ctrl-Q = quit | Ctrl-F = find";
const SEARCH_PROMPT: &str = "Search: {} (ESC to cancel)";
const SAVE_AS_PROMPT: &str = "Save as: {} (ESC to cancel)";

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "TEXC_LOG";

// ─── Command line ───────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "texc", version, about = "A small terminal text editor")]
struct Cli {
    /// File to open. Without one, texc starts on an empty, unnamed document.
    file: Option<PathBuf>,

    /// Append diagnostic logs to this file. Filter with TEXC_LOG.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

// ─── Mode ───────────────────────────────────────────────────────────────────

/// What keys currently drive.
enum Mode {
    /// Normal editing.
    Edit,
    /// The search prompt is open.
    Search { prompt: Prompt, search: Search },
    /// The file-name prompt for saving an unnamed document is open.
    SaveAs { prompt: Prompt },
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// The editor session: one document, its viewport, the message line, and
/// whichever prompt is open.
struct Editor {
    document: Document,
    viewport: Viewport,
    message: StatusMessage,
    mode: Mode,

    /// Ctrl-Q presses still needed before a dirty document is abandoned.
    quit_times: usize,

    /// When [`App::on_tick`] last looked at the message, so its expiry
    /// triggers exactly one repaint.
    last_tick: Instant,
}

impl Editor {
    fn new(document: Document, size: Size) -> Self {
        let (rows, cols) = text_area(size);
        let mut message = StatusMessage::new();
        message.set(HELP_MESSAGE);
        Self {
            document,
            viewport: Viewport::new(rows, cols),
            message,
            mode: Mode::Edit,
            quit_times: QUIT_TIMES,
            last_tick: Instant::now(),
        }
    }

    // ── Edit mode ─────────────────────────────────────────────────────────

    fn handle_edit(&mut self, key: Key) -> Action {
        match key {
            Key::Ctrl(b'q') => {
                if self.document.is_dirty() && self.quit_times > 0 {
                    self.message.set(format!(
                        "WARNING!!! File has unsaved changes. Press Ctrl-Q {} more times to quit.",
                        self.quit_times
                    ));
                    self.quit_times -= 1;
                    return Action::Continue;
                }
                return Action::Quit;
            }
            Key::Ctrl(b's') => self.save(),
            Key::Ctrl(b'f') => self.start_search(),
            Key::Ctrl(b'l') | Key::Escape => {}

            Key::Enter => edit::insert_newline(&mut self.document, &mut self.viewport),
            Key::Backspace | Key::Ctrl(b'h') => {
                edit::delete_char(&mut self.document, &mut self.viewport);
            }
            Key::Delete => {
                self.viewport.move_cursor(&self.document, Motion::Right);
                edit::delete_char(&mut self.document, &mut self.viewport);
            }

            Key::Up => self.viewport.move_cursor(&self.document, Motion::Up),
            Key::Down => self.viewport.move_cursor(&self.document, Motion::Down),
            Key::Left => self.viewport.move_cursor(&self.document, Motion::Left),
            Key::Right => self.viewport.move_cursor(&self.document, Motion::Right),
            Key::Home => self.viewport.home(),
            Key::End => self.viewport.end(&self.document),
            Key::PageUp => self.viewport.page_up(&self.document),
            Key::PageDown => self.viewport.page_down(&self.document),

            other => {
                if let Some(byte) = other.byte() {
                    edit::insert_char(&mut self.document, &mut self.viewport, byte);
                }
            }
        }

        self.quit_times = QUIT_TIMES;
        Action::Continue
    }

    // ── Saving ────────────────────────────────────────────────────────────

    fn save(&mut self) {
        if self.document.path().is_none() {
            let prompt = Prompt::new(SAVE_AS_PROMPT);
            self.message.set(prompt.message());
            self.mode = Mode::SaveAs { prompt };
            return;
        }
        let result = self.document.save();
        self.report_save(result);
    }

    fn handle_save_as(&mut self, mut prompt: Prompt, key: Key) {
        match prompt.on_key(key) {
            PromptEvent::Continue => {
                self.message.set(prompt.message());
                self.mode = Mode::SaveAs { prompt };
            }
            PromptEvent::Confirmed(name) => {
                let result = self.document.save_as(Path::new(&name));
                self.report_save(result);
            }
            PromptEvent::Cancelled => self.message.set("Save aborted"),
        }
    }

    fn report_save(&mut self, result: Result<usize, DocumentError>) {
        match result {
            Ok(bytes) => self.message.set(format!("{bytes} bytes written to disk")),
            Err(e) => {
                warn!(error = %e, "save failed");
                self.message.set(format!("Can't save I/O error: {e}"));
            }
        }
    }

    // ── Search ────────────────────────────────────────────────────────────

    fn start_search(&mut self) {
        let prompt = Prompt::new(SEARCH_PROMPT);
        let search = Search::start(&self.viewport);
        self.message.set(prompt.message());
        self.mode = Mode::Search { prompt, search };
    }

    fn handle_search(&mut self, mut prompt: Prompt, mut search: Search, key: Key) {
        match prompt.on_key(key) {
            PromptEvent::Continue => {
                search.on_key(&mut self.document, &mut self.viewport, prompt.input(), key);
                self.message.set(prompt.message());
                self.mode = Mode::Search { prompt, search };
            }
            PromptEvent::Confirmed(_) => {
                search.confirm(&mut self.document);
                self.message.set("");
            }
            PromptEvent::Cancelled => {
                search.cancel(&mut self.document, &mut self.viewport);
                self.message.set("");
            }
        }
    }

    // ── Timers ────────────────────────────────────────────────────────────

    /// Whether the message line changed since the last tick.
    fn tick_at(&mut self, now: Instant) -> bool {
        let expired = self.message.expired_between(self.last_tick, now);
        self.last_tick = now;
        expired
    }
}

/// Text-area dimensions for a terminal of `size`: everything but the
/// status bar and the message line.
fn text_area(size: Size) -> (usize, usize) {
    (
        usize::from(size.rows).saturating_sub(2),
        usize::from(size.cols),
    )
}

impl App for Editor {
    fn on_key(&mut self, key: Key) -> Action {
        match std::mem::replace(&mut self.mode, Mode::Edit) {
            Mode::Edit => return self.handle_edit(key),
            Mode::Search { prompt, search } => self.handle_search(prompt, search, key),
            Mode::SaveAs { prompt } => self.handle_save_as(prompt, key),
        }
        Action::Continue
    }

    fn on_resize(&mut self, size: Size) {
        let (rows, cols) = text_area(size);
        self.viewport.resize(rows, cols);
    }

    fn on_tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    fn paint(&mut self, out: &mut OutputBuffer, _size: Size) {
        view::render_frame(
            out,
            &self.document,
            &mut self.viewport,
            self.message.visible(),
        );
    }
}

// ─── Startup ────────────────────────────────────────────────────────────────

/// Install a file-backed subscriber when `--log-file` is given.
///
/// The terminal belongs to the editor, so logs never go to stdout or
/// stderr. The returned guard flushes the writer when dropped.
fn init_logging(path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("cannot install the log subscriber")?;

    Ok(Some(guard))
}

fn run(cli: &Cli) -> Result<()> {
    let document = match &cli.file {
        Some(path) => Document::open(path)?,
        None => Document::new(),
    };

    let mut event_loop = EventLoop::new();
    let size = event_loop
        .start()
        .context("failed to initialize terminal")?;
    let mut editor = Editor::new(document, size);
    event_loop.run(&mut editor)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let _log_guard = match init_logging(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("texc: {e:#}");
            process::exit(1);
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), file = ?cli.file, "texc starting");
    if let Err(e) = run(&cli) {
        terminal::clear_for_exit();
        tracing::error!(error = %format!("{e:#}"), "fatal");
        eprintln!("texc: {e:#}");
        process::exit(1);
    }
    info!("texc exiting");
}

// ─── Tests ──────────────────────────────────────────────────────────────────
