//! Application state for the TUI.
//!
//! Wraps the [`QueryPanel`] with the purely visual state (focus, scroll,
//! spinners) and maps key presses to panel operations.

use super::widgets::spinner::Spinner;
use crate::editor::ActiveQueryEditor;
use crate::error::Result;
use crate::executor::{QueryRequest, ResultSet};
use crate::export::{DownloadSink, ExportFormat};
use crate::notify::Toasts;
use crate::panel::{QueryPanel, RunTicket};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Rows moved by PageUp/PageDown in the results table.
const PAGE_SIZE: usize = 10;

/// Which area currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Editor,
    Results,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Self::Editor => Self::Results,
            Self::Results => Self::Editor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Results => "results",
        }
    }
}

/// Work the event loop must carry out after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Run,
    Export(ExportFormat),
    Quit,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub focus: Focus,
    pub panel: QueryPanel<Toasts>,
    /// First visible data row of the results table.
    pub results_scroll: usize,
    /// Shown in the controls bar while a run is pending.
    pub run_spinner: Option<Spinner>,
    /// Shown in place of the editor until it has loaded.
    pub editor_spinner: Spinner,
}

impl App {
    pub fn new(database: impl Into<String>, toast_duration: Duration) -> Self {
        Self {
            running: true,
            focus: Focus::default(),
            panel: QueryPanel::new(database, ActiveQueryEditor::new(), Toasts::new(toast_duration)),
            results_scroll: 0,
            run_spinner: None,
            editor_spinner: Spinner::loading_editor(),
        }
    }

    /// Hides toasts whose display time has passed.
    pub fn tick(&mut self, now: Instant) {
        self.panel.notifier_mut().clear_expired(now);
    }

    /// Issues a run of the current query, see [`QueryPanel::begin_run`].
    pub fn begin_run(&mut self) -> Option<(RunTicket, QueryRequest)> {
        let issued = self.panel.begin_run();
        self.sync_run_spinner();
        issued
    }

    /// Applies a run outcome, see [`QueryPanel::finish_run`].
    pub fn finish_run(&mut self, ticket: RunTicket, outcome: Result<ResultSet>) -> bool {
        let applied = self.panel.finish_run(ticket, outcome);
        if applied {
            self.results_scroll = 0;
        }
        self.sync_run_spinner();
        applied
    }

    pub fn export(&mut self, format: ExportFormat, sink: &mut dyn DownloadSink) -> bool {
        self.panel.export(format, sink)
    }

    fn sync_run_spinner(&mut self) {
        match (self.panel.is_running(), self.run_spinner.is_some()) {
            (true, false) => self.run_spinner = Some(Spinner::executing()),
            (false, true) => self.run_spinner = None,
            _ => {}
        }
    }

    fn row_count(&self) -> usize {
        self.panel.results().map(|rows| rows.len()).unwrap_or(0)
    }

    fn scroll_results(&mut self, delta: isize) {
        let max = self.row_count().saturating_sub(1);
        self.results_scroll = self
            .results_scroll
            .saturating_add_signed(delta)
            .min(max);
    }

    /// Handles a key press and returns the work left for the caller.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.running = false;
                Action::Quit
            }
            KeyCode::F(5) => Action::Run,
            KeyCode::Enter | KeyCode::Char('r') if ctrl => Action::Run,
            KeyCode::F(2) => Action::Export(ExportFormat::SqlQuery),
            KeyCode::F(3) => Action::Export(ExportFormat::Csv),
            KeyCode::F(4) => Action::Export(ExportFormat::Json),
            KeyCode::Char('t') if ctrl => {
                self.panel.editor_mut().new_tab();
                Action::None
            }
            KeyCode::Char('w') if ctrl => {
                self.panel.editor_mut().close_active_tab();
                Action::None
            }
            KeyCode::Right if ctrl => {
                self.panel.editor_mut().select_next();
                Action::None
            }
            KeyCode::Left if ctrl => {
                self.panel.editor_mut().select_previous();
                Action::None
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                Action::None
            }
            KeyCode::Esc => {
                self.panel.notifier_mut().dismiss();
                Action::None
            }
            _ if self.focus == Focus::Results => {
                self.handle_results_key(key);
                Action::None
            }
            _ => {
                self.handle_editor_key(key);
                Action::None
            }
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.scroll_results(-1),
            KeyCode::Down => self.scroll_results(1),
            KeyCode::PageUp => self.scroll_results(-(PAGE_SIZE as isize)),
            KeyCode::PageDown => self.scroll_results(PAGE_SIZE as isize),
            KeyCode::Home => self.results_scroll = 0,
            _ => {}
        }
    }

    /// Routes editing keys to the active buffer once the editor has loaded.
    fn handle_editor_key(&mut self, key: KeyEvent) {
        if !self.panel.is_editor_ready() {
            return;
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return;
        }

        let buffer = self.panel.editor_mut().buffer_mut();
        match key.code {
            KeyCode::Char(c) => buffer.insert(c),
            KeyCode::Enter => buffer.newline(),
            KeyCode::Backspace => buffer.backspace(),
            KeyCode::Delete => buffer.delete(),
            KeyCode::Left => buffer.move_left(),
            KeyCode::Right => buffer.move_right(),
            KeyCode::Up => buffer.move_up(),
            KeyCode::Down => buffer.move_down(),
            KeyCode::Home => buffer.move_home(),
            KeyCode::End => buffer.move_end(),
            _ => {}
        }
    }
}
