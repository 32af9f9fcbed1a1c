//! Terminal user interface for the query panel.
//!
//! Runs the main event loop using ratatui and crossterm. Query runs and the
//! editor load happen on background tasks and report back over a channel.

pub mod app;
pub mod headless;
mod ui;
pub mod widgets;

pub use app::App;

use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::executor::{HttpQueryBackend, QueryBackend, ResultSet};
use crate::export::FileDownloader;
use crate::highlight::SqlHighlighter;
use crate::panel::{load_editor, RunTicket};
use app::Action;
use crossterm::{
    event::{Event as CEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long to wait for terminal input before redrawing.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Messages sent from background tasks to the main loop.
#[derive(Debug)]
pub enum AsyncMessage {
    RunFinished(RunTicket, Result<ResultSet>),
    EditorLoaded(std::result::Result<SqlHighlighter, String>),
}

/// Reads terminal input on a blocking task that outlives a lost `select!`.
///
/// `next` is cancel-safe: a read that completes while another branch wins is
/// kept and returned by the following call.
struct InputPoller {
    poll: fn() -> Option<CEvent>,
    pending: JoinHandle<Option<CEvent>>,
}

impl InputPoller {
    fn new(poll: fn() -> Option<CEvent>) -> Self {
        Self {
            poll,
            pending: tokio::task::spawn_blocking(poll),
        }
    }

    /// Waits for the in-flight read, then starts the next one.
    async fn next(&mut self) -> Option<CEvent> {
        let result = (&mut self.pending).await;
        self.pending = tokio::task::spawn_blocking(self.poll);
        result.ok().flatten()
    }
}

fn poll_terminal() -> Option<CEvent> {
    if crossterm::event::poll(TICK_RATE).unwrap_or(false) {
        crossterm::event::read().ok()
    } else {
        None
    }
}

/// The interactive terminal runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    backend: Arc<dyn QueryBackend>,
    downloads: FileDownloader,
}

impl Tui {
    pub fn new(backend: Arc<dyn QueryBackend>, downloads: FileDownloader) -> Result<Self> {
        Ok(Self {
            terminal: Self::setup_terminal()?,
            backend,
            downloads,
        })
    }

    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| PanelError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| PanelError::internal(format!("Failed to enter alternate screen: {e}")))?;

        Terminal::new(CrosstermBackend::new(stdout))
            .map_err(|e| PanelError::internal(format!("Failed to create terminal: {e}")))
    }

    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| PanelError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| PanelError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| PanelError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the panel until the user quits.
    pub async fn run(&mut self, mut app: App) -> Result<()> {
        // Restore the terminal before the default hook prints the panic
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let (tx, mut rx) = mpsc::channel::<AsyncMessage>(32);

        // The editor loads in the background; the rest of the panel is usable meanwhile
        {
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(AsyncMessage::EditorLoaded(load_editor().await)).await;
            });
        }

        let result = self.run_event_loop(&mut app, tx, &mut rx).await;

        let _ = panic::take_hook();
        result
    }

    async fn run_event_loop(
        &mut self,
        app: &mut App,
        tx: mpsc::Sender<AsyncMessage>,
        rx: &mut mpsc::Receiver<AsyncMessage>,
    ) -> Result<()> {
        let mut input = InputPoller::new(poll_terminal);

        loop {
            app.tick(Instant::now());

            self.terminal
                .draw(|frame| ui::render(frame, app))
                .map_err(|e| PanelError::internal(format!("Failed to draw: {e}")))?;

            if !app.running {
                break;
            }

            tokio::select! {
                event = input.next() => {
                    if let Some(event) = event {
                        self.handle_crossterm_event(event, app, &tx);
                    }
                }

                Some(msg) = rx.recv() => {
                    Self::handle_async_message(msg, app);
                }
            }
        }

        Ok(())
    }

    fn handle_crossterm_event(
        &mut self,
        event: CEvent,
        app: &mut App,
        tx: &mpsc::Sender<AsyncMessage>,
    ) {
        // Resize needs no handling: the next draw picks up the new size
        let CEvent::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        match app.handle_key(key) {
            Action::None | Action::Quit => {}
            Action::Run => self.spawn_run(app, tx),
            Action::Export(format) => {
                app.export(format, &mut self.downloads);
            }
        }
    }

    /// Issues a run and executes it on a background task.
    fn spawn_run(&self, app: &mut App, tx: &mpsc::Sender<AsyncMessage>) {
        let Some((ticket, request)) = app.begin_run() else {
            return;
        };

        let backend = Arc::clone(&self.backend);
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = backend.execute(&request).await;
            if tx
                .send(AsyncMessage::RunFinished(ticket, outcome))
                .await
                .is_err()
            {
                warn!("Run finished after the panel closed");
            }
        });
    }

    fn handle_async_message(msg: AsyncMessage, app: &mut App) {
        match msg {
            AsyncMessage::RunFinished(ticket, outcome) => {
                app.finish_run(ticket, outcome);
            }
            AsyncMessage::EditorLoaded(outcome) => {
                app.panel.set_editor_loaded(outcome);
            }
        }
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the interactive panel with the given configuration.
pub async fn run(config: &Config) -> Result<()> {
    let backend = HttpQueryBackend::new(&config.backend)?;
    info!(endpoint = backend.endpoint(), "Query endpoint");

    let database = config.panel.database.clone().unwrap_or_default();
    if database.is_empty() {
        warn!("No database selected; queries are sent with an empty database name");
    }

    let downloads = FileDownloader::new(config.panel.download_dir());
    info!(dir = %downloads.dir().display(), "Exports directory");

    let app = App::new(database, config.panel.toast_duration());
    let mut tui = Tui::new(Arc::new(backend), downloads)?;
    tui.run(app).await
}
