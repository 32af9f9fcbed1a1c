//! Headless mode for scripted testing and automation.
//!
//! Drives the same [`App`] and renderer as the interactive terminal, but
//! against a [`TestBackend`] and a list of scripted events. Runs are awaited
//! before the next event, so a script always sees the finished result.

mod events;
mod output;

pub use events::{parse_size, Assertion, Event, EventParser};
pub use output::{HeadlessOutput, OutputFormat, ScreenRenderer};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::executor::{HttpQueryBackend, MockQueryBackend, QueryBackend, ResultSet};
use crate::export::{DownloadSink, FileDownloader};
use crate::panel::{load_editor, LoadState, ResultsView};
use crate::tui::app::{Action, App};
use crate::tui::ui;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Settings for one headless run.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    pub width: u16,
    pub height: u16,
    pub output_format: OutputFormat,
    /// Stop at the first failed assertion.
    pub fail_fast: bool,
    /// Write output here instead of stdout.
    pub output_file: Option<PathBuf>,
}

impl HeadlessConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (width, height) = cli.parse_screen_size()?;
        Ok(Self {
            width,
            height,
            output_format: cli.parse_output_format()?,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            output_format: OutputFormat::Text,
            fail_fast: false,
            output_file: None,
        }
    }
}

/// Outcome of a headless run.
#[derive(Debug)]
pub struct HeadlessResult {
    pub screen: String,
    pub screen_lines: Vec<String>,
    pub events_executed: usize,
    pub duration: Duration,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    pub state: HeadlessState,
    /// Captured frames, only filled in frames mode.
    pub frames: Vec<Frame>,
}

/// Snapshot of the panel state, as reported in JSON output and checked by
/// `assert:state:` events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessState {
    pub query_text: String,
    pub active_tab: String,
    pub tab_count: usize,
    pub focus: String,
    pub database: String,
    /// `loading`, `ready` or `failed`.
    pub editor_state: String,
    /// `empty` or `results`.
    pub view: String,
    pub row_count: Option<usize>,
    pub toast_visible: bool,
    pub toast_kind: Option<String>,
    pub toast_message: Option<String>,
    /// Requests handed to the backend.
    pub requests_sent: usize,
    pub running: bool,
}

impl HeadlessState {
    pub fn from_app(app: &App, requests_sent: usize) -> Self {
        let editor = app.panel.editor();
        let toasts = app.panel.notifier();
        let (view, row_count) = match app.panel.view() {
            ResultsView::Empty => ("empty", None),
            ResultsView::Results(rows) => ("results", Some(rows.len())),
        };
        let editor_state = match app.panel.editor_state() {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
        };

        Self {
            query_text: editor.current_query().to_string(),
            active_tab: editor.active_tab().title.clone(),
            tab_count: editor.editor_tabs().len(),
            focus: app.focus.as_str().to_string(),
            database: app.panel.database().to_string(),
            editor_state: editor_state.to_string(),
            view: view.to_string(),
            row_count,
            toast_visible: toasts.is_visible(),
            toast_kind: toasts
                .is_visible()
                .then(|| toasts.kind().as_str().to_string()),
            toast_message: toasts.is_visible().then(|| toasts.message().to_string()),
            requests_sent,
            running: app.running,
        }
    }
}

/// Screen captured after an event.
#[derive(Debug, Clone)]
pub struct Frame {
    /// 0 is the initial screen.
    pub number: usize,
    pub event: Option<String>,
    pub screen: String,
}

/// Executes scripted events against an [`App`].
pub struct HeadlessRunner {
    config: HeadlessConfig,
    terminal: Terminal<TestBackend>,
    app: App,
    backend: Arc<dyn QueryBackend>,
    downloads: Box<dyn DownloadSink>,
    events: Vec<Event>,
    frames: Vec<Frame>,
    requests_sent: usize,
    assertions_passed: usize,
    assertions_failed: usize,
}

impl HeadlessRunner {
    pub fn new(
        config: HeadlessConfig,
        app: App,
        backend: Arc<dyn QueryBackend>,
        downloads: Box<dyn DownloadSink>,
    ) -> Result<Self> {
        let terminal = Terminal::new(TestBackend::new(config.width, config.height))
            .map_err(|e| PanelError::internal(format!("Failed to create test terminal: {e}")))?;

        Ok(Self {
            config,
            terminal,
            app,
            backend,
            downloads,
            events: Vec::new(),
            frames: Vec::new(),
            requests_sent: 0,
            assertions_passed: 0,
            assertions_failed: 0,
        })
    }

    pub fn load_events(&mut self, input: &str) -> Result<()> {
        self.events = EventParser::new().parse_all(input)?;
        Ok(())
    }

    /// Loads events from a script file, or stdin when `path` is `-`.
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            std::io::read_to_string(std::io::stdin())
                .map_err(|e| PanelError::internal(format!("Failed to read stdin: {e}")))?
        } else {
            std::fs::read_to_string(path).map_err(|e| {
                PanelError::config(format!("Failed to read script file {path}: {e}"))
            })?
        };
        self.load_events(&content)
    }

    pub async fn run(mut self) -> Result<HeadlessResult> {
        let start = Instant::now();

        self.app.panel.set_editor_loaded(load_editor().await);
        self.capture_frame(None)?;

        let events = std::mem::take(&mut self.events);
        let mut events_executed = 0;

        for event in events {
            let label = event.to_string();
            let mut stop = false;

            match &event {
                Event::Key(key) => {
                    let action = self.app.handle_key(*key);
                    self.perform(action).await;
                }
                Event::Type(text) => {
                    for c in text.chars() {
                        let action = self
                            .app
                            .handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
                        self.perform(action).await;
                    }
                }
                Event::Wait(duration) => tokio::time::sleep(*duration).await,
                Event::Resize(w, h) => {
                    self.terminal
                        .resize(Rect::new(0, 0, *w, *h))
                        .map_err(|e| PanelError::internal(format!("Resize failed: {e}")))?;
                }
                Event::Snapshot(_) => {}
                Event::Assert(assertion) => {
                    self.draw()?;
                    let screen = self.screen();
                    let state = HeadlessState::from_app(&self.app, self.requests_sent);
                    if assertion.check(&screen, &state) {
                        self.assertions_passed += 1;
                    } else {
                        info!(assertion = %label, "Assertion failed");
                        self.assertions_failed += 1;
                        stop = self.config.fail_fast;
                    }
                }
            }

            events_executed += 1;
            self.draw()?;

            if self.config.output_format == OutputFormat::Frames
                || matches!(event, Event::Snapshot(_))
            {
                self.capture_frame(Some(label))?;
            }

            if stop || !self.app.running {
                break;
            }
        }

        self.draw()?;
        let screen = self.screen();

        Ok(HeadlessResult {
            screen_lines: screen.lines().map(String::from).collect(),
            screen,
            events_executed,
            duration: start.elapsed(),
            assertions_passed: self.assertions_passed,
            assertions_failed: self.assertions_failed,
            state: HeadlessState::from_app(&self.app, self.requests_sent),
            frames: self.frames,
        })
    }

    async fn perform(&mut self, action: Action) {
        match action {
            Action::None | Action::Quit => {}
            Action::Run => {
                if let Some((ticket, request)) = self.app.begin_run() {
                    self.requests_sent += 1;
                    let outcome = self.backend.execute(&request).await;
                    self.app.finish_run(ticket, outcome);
                }
            }
            Action::Export(format) => {
                self.app.export(format, self.downloads.as_mut());
            }
        }
    }

    fn draw(&mut self) -> Result<()> {
        self.app.tick(Instant::now());
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| PanelError::internal(format!("Failed to render: {e}")))?;
        Ok(())
    }

    fn screen(&self) -> String {
        ScreenRenderer::render(self.terminal.backend().buffer())
    }

    fn capture_frame(&mut self, event: Option<String>) -> Result<()> {
        self.draw()?;
        let screen = self.screen();
        self.frames.push(Frame {
            number: self.frames.len(),
            event,
            screen,
        });
        Ok(())
    }
}

/// Chooses the backend for a headless run.
fn headless_backend(cli: &Cli, config: &Config) -> Result<Arc<dyn QueryBackend>> {
    if !cli.mock_backend {
        return Ok(Arc::new(HttpQueryBackend::new(&config.backend)?));
    }

    let mock = match &cli.mock_response {
        Some(json) => {
            let rows: ResultSet = serde_json::from_str(json).map_err(|e| {
                PanelError::config(format!("--mock-response is not a JSON array of objects: {e}"))
            })?;
            MockQueryBackend::new(rows)
        }
        None => MockQueryBackend::with_sample_data(),
    };
    Ok(Arc::new(mock))
}

/// Runs headless mode and returns the process exit code.
pub async fn run_headless(cli: &Cli, config: &Config) -> Result<i32> {
    cli.validate_headless()?;

    let headless_config = HeadlessConfig::from_cli(cli)?;
    let app = App::new(
        config.panel.database.clone().unwrap_or_default(),
        config.panel.toast_duration(),
    );
    let downloads = Box::new(FileDownloader::new(config.panel.download_dir()));
    let backend = headless_backend(cli, config)?;

    let mut runner = HeadlessRunner::new(headless_config.clone(), app, backend, downloads)?;
    if let Some(events) = &cli.events {
        runner.load_events(events)?;
    } else if let Some(path) = &cli.script {
        runner.load_script(path)?;
    }

    let result = runner.run().await?;
    let rendered = HeadlessOutput::new(headless_config.output_format).format(&result);

    match &headless_config.output_file {
        Some(path) => std::fs::write(path, &rendered)
            .map_err(|e| PanelError::internal(format!("Failed to write output file: {e}")))?,
        None => print!("{rendered}"),
    }

    Ok(if result.assertions_failed > 0 { 1 } else { 0 })
}
