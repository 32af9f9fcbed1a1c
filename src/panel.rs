//! The query panel: state shared by the terminal UI and headless mode.
//!
//! A [`QueryPanel`] is built from its collaborators (database selection,
//! editor, notification sink) and drives three flows:
//!
//! - running the current query, split into [`QueryPanel::begin_run`] and
//!   [`QueryPanel::finish_run`] so the request can run on another task;
//! - exporting the query or the last result set;
//! - tracking whether the editor has finished loading.
//!
//! Every run is stamped with a [`RunTicket`]. Only the completion carrying the
//! latest ticket is applied, so an older request that resolves late can never
//! replace newer results.

use crate::editor::ActiveQueryEditor;
use crate::error::Result;
use crate::executor::{QueryBackend, QueryRequest, ResultSet};
use crate::export::{build_export, DownloadSink, ExportFormat};
use crate::highlight::SqlHighlighter;
use crate::notify::{NotificationSink, ToastKind, Toasts};
use tracing::{debug, error, info, warn};

pub const RUN_SUCCESS_MESSAGE: &str = "Query Ran Successfully";
pub const RUN_FAILURE_MESSAGE: &str = "Error running query";
pub const EXPORT_FAILURE_MESSAGE: &str = "Export failed";

pub const EMPTY_STATE_TITLE: &str = "Welcome to the Query Editor";
pub const EMPTY_STATE_SUBTITLE: &str = "Write a query above and press F5 to run it";
pub const EDITOR_PLACEHOLDER: &str = "Enter your SQL query here...";

/// Identifies one issued run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTicket(u64);

/// Loading state of a deferred component.
#[derive(Debug)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// What the results area shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultsView<'a> {
    /// No run has succeeded yet.
    Empty,
    Results(&'a ResultSet),
}

/// State of the query panel.
#[derive(Debug)]
pub struct QueryPanel<N: NotificationSink = Toasts> {
    database: String,
    editor: ActiveQueryEditor,
    notifier: N,
    results: Option<ResultSet>,
    latest_ticket: u64,
    pending: Option<RunTicket>,
    editor_state: LoadState<SqlHighlighter>,
}

impl<N: NotificationSink> QueryPanel<N> {
    /// Creates a panel with no results and the editor still loading.
    pub fn new(database: impl Into<String>, editor: ActiveQueryEditor, notifier: N) -> Self {
        Self {
            database: database.into(),
            editor,
            notifier,
            results: None,
            latest_ticket: 0,
            pending: None,
            editor_state: LoadState::Loading,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn editor(&self) -> &ActiveQueryEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut ActiveQueryEditor {
        &mut self.editor
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    pub fn view(&self) -> ResultsView<'_> {
        match &self.results {
            Some(rows) => ResultsView::Results(rows),
            None => ResultsView::Empty,
        }
    }

    /// True while the latest issued run has not completed.
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Validates the current query and issues a new run.
    ///
    /// Returns `None` (after showing the validation toast) when the query is
    /// blank; no request must be sent in that case.
    pub fn begin_run(&mut self) -> Option<(RunTicket, QueryRequest)> {
        let request = match QueryRequest::new(self.editor.current_query(), &self.database) {
            Ok(request) => request,
            Err(e) => {
                self.notifier.show_toast(ToastKind::Error, e.detail());
                return None;
            }
        };

        self.latest_ticket += 1;
        let ticket = RunTicket(self.latest_ticket);
        self.pending = Some(ticket);
        info!(run = self.latest_ticket, database = %self.database, "Running query");
        Some((ticket, request))
    }

    /// Applies the outcome of a run.
    ///
    /// Returns false when the ticket is stale; the outcome is then dropped
    /// without touching results or toasts.
    pub fn finish_run(&mut self, ticket: RunTicket, outcome: Result<ResultSet>) -> bool {
        if ticket.0 != self.latest_ticket {
            debug!(
                run = ticket.0,
                latest = self.latest_ticket,
                "Discarding stale query response"
            );
            return false;
        }
        self.pending = None;

        match outcome {
            Ok(rows) => {
                info!(run = ticket.0, rows = rows.len(), "Query finished");
                self.results = Some(rows);
                self.notifier
                    .show_toast(ToastKind::Success, RUN_SUCCESS_MESSAGE);
            }
            Err(e) => {
                error!(run = ticket.0, "Error running query: {}", e);
                self.notifier.show_toast(ToastKind::Error, RUN_FAILURE_MESSAGE);
            }
        }
        true
    }

    /// Runs the current query to completion against `backend`.
    pub async fn run(&mut self, backend: &dyn QueryBackend) -> bool {
        let Some((ticket, request)) = self.begin_run() else {
            return false;
        };
        let outcome = backend.execute(&request).await;
        self.finish_run(ticket, outcome)
    }

    /// Exports in `format` and hands the file to `sink`.
    ///
    /// Returns true when a file was delivered.
    pub fn export(&mut self, format: ExportFormat, sink: &mut dyn DownloadSink) -> bool {
        let query = self.editor.current_query();
        let file = match build_export(format, query, self.results.as_ref()) {
            Ok(file) => file,
            Err(e) => {
                warn!(format = %format, "Export rejected: {}", e.detail());
                self.notifier.show_toast(ToastKind::Error, e.detail());
                return false;
            }
        };

        match sink.deliver(&file) {
            Ok(()) => {
                info!(format = %format, file = file.file_name, "Exported");
                self.notifier
                    .show_toast(ToastKind::Success, &format!("Exported {}", file.file_name));
                true
            }
            Err(e) => {
                error!(format = %format, "Export failed: {}", e);
                self.notifier
                    .show_toast(ToastKind::Error, EXPORT_FAILURE_MESSAGE);
                false
            }
        }
    }

    pub fn editor_state(&self) -> &LoadState<SqlHighlighter> {
        &self.editor_state
    }

    pub fn is_editor_ready(&self) -> bool {
        self.editor_state.is_ready()
    }

    /// Records the outcome of loading the editor.
    pub fn set_editor_loaded(&mut self, outcome: std::result::Result<SqlHighlighter, String>) {
        self.editor_state = match outcome {
            Ok(highlighter) => {
                debug!("Editor ready");
                LoadState::Ready(highlighter)
            }
            Err(reason) => {
                error!("Editor failed to load: {}", reason);
                LoadState::Failed(reason)
            }
        };
    }
}

/// Builds the editor highlighter off the async runtime's worker threads.
pub async fn load_editor() -> std::result::Result<SqlHighlighter, String> {
    tokio::task::spawn_blocking(SqlHighlighter::new)
        .await
        .map_err(|e| format!("editor task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PanelError;
    use crate::executor::{MockQueryBackend, EMPTY_QUERY_MESSAGE};
    use crate::export::{ExportFile, NO_DATA_MESSAGE, NO_QUERY_MESSAGE};
    use serde_json::json;
    use std::time::Duration;

    /// Records every toast instead of displaying it.
    #[derive(Debug, Default)]
    struct RecordingSink {
        toasts: Vec<(ToastKind, String)>,
    }

    impl NotificationSink for RecordingSink {
        fn show_toast(&mut self, kind: ToastKind, message: &str) {
            self.toasts.push((kind, message.to_string()));
        }
    }

    impl RecordingSink {
        fn last(&self) -> Option<(ToastKind, &str)> {
            self.toasts.last().map(|(k, m)| (*k, m.as_str()))
        }
    }

    struct FailingDownloads;

    impl DownloadSink for FailingDownloads {
        fn deliver(&mut self, _file: &ExportFile) -> Result<()> {
            Err(PanelError::export("disk full"))
        }
    }

    fn panel_with(query: &str) -> QueryPanel<RecordingSink> {
        let mut editor = ActiveQueryEditor::new();
        editor.handle_query_change(query);
        QueryPanel::new("shop", editor, RecordingSink::default())
    }

    fn rows(value: serde_json::Value) -> ResultSet {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_run_select_one() {
        let backend = MockQueryBackend::new(rows(json!([{ "a": 1 }])));
        let mut panel = panel_with("SELECT 1");
        assert_eq!(panel.view(), ResultsView::Empty);

        assert!(panel.run(&backend).await);

        assert_eq!(panel.results(), Some(&rows(json!([{ "a": 1 }]))));
        assert!(matches!(panel.view(), ResultsView::Results(r) if r.len() == 1));
        assert_eq!(
            panel.notifier().last(),
            Some((ToastKind::Success, RUN_SUCCESS_MESSAGE))
        );
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.requests()[0].database_name, "shop");
        assert!(!panel.is_running());
    }

    #[tokio::test]
    async fn test_blank_queries_never_reach_backend() {
        let backend = MockQueryBackend::with_sample_data();
        for query in ["", " ", "\n\t  "] {
            let mut panel = panel_with(query);
            assert!(!panel.run(&backend).await);
            assert_eq!(
                panel.notifier().last(),
                Some((ToastKind::Error, EMPTY_QUERY_MESSAGE))
            );
            assert_eq!(panel.view(), ResultsView::Empty);
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_one_call_per_run() {
        let backend = MockQueryBackend::with_sample_data();
        let mut panel = panel_with("SELECT * FROM users");
        for expected in 1..=3 {
            panel.run(&backend).await;
            assert_eq!(backend.call_count(), expected);
        }
    }

    #[tokio::test]
    async fn test_failed_run_keeps_previous_results() {
        let backend = MockQueryBackend::new(rows(json!([{ "a": 1 }])));
        let mut panel = panel_with("SELECT 1");
        panel.run(&backend).await;

        backend.push_failure("connection reset");
        panel.run(&backend).await;

        assert_eq!(
            panel.notifier().last(),
            Some((ToastKind::Error, RUN_FAILURE_MESSAGE))
        );
        assert_eq!(panel.results().map(|r| r.len()), Some(1));
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut panel = panel_with("SELECT 1");
        let (first, _) = panel.begin_run().unwrap();
        let (second, _) = panel.begin_run().unwrap();

        assert!(panel.finish_run(second, Ok(rows(json!([{ "v": "new" }])))));
        assert!(!panel.finish_run(first, Ok(rows(json!([{ "v": "old" }])))));

        assert_eq!(panel.results(), Some(&rows(json!([{ "v": "new" }]))));
        assert_eq!(panel.notifier().toasts.len(), 1);
    }

    #[test]
    fn test_stale_completion_before_latest_keeps_running() {
        let mut panel = panel_with("SELECT 1");
        let (first, _) = panel.begin_run().unwrap();
        let (second, _) = panel.begin_run().unwrap();

        assert!(!panel.finish_run(first, Err(PanelError::network("timeout"))));
        assert!(panel.is_running());
        assert!(panel.notifier().toasts.is_empty());

        assert!(panel.finish_run(second, Ok(ResultSet::new())));
        assert!(!panel.is_running());
    }

    #[tokio::test]
    async fn test_overlapping_runs_latest_wins() {
        let slow = std::sync::Arc::new(
            MockQueryBackend::new(rows(json!([{ "run": 1 }])))
                .with_delay(Duration::from_millis(50)),
        );
        let fast = MockQueryBackend::new(rows(json!([{ "run": 2 }])));

        let mut panel = panel_with("SELECT run");
        let (t1, r1) = panel.begin_run().unwrap();
        let (t2, r2) = panel.begin_run().unwrap();

        let slow_task = {
            let slow = slow.clone();
            tokio::spawn(async move { slow.execute(&r1).await })
        };
        let fast_outcome = fast.execute(&r2).await;

        // The newer request resolves first, the older one afterwards
        assert!(panel.finish_run(t2, fast_outcome));
        assert!(!panel.finish_run(t1, slow_task.await.unwrap()));

        assert_eq!(panel.results(), Some(&rows(json!([{ "run": 2 }]))));
    }

    #[tokio::test]
    async fn test_results_never_return_to_empty() {
        let backend = MockQueryBackend::new(ResultSet::new());
        let mut panel = panel_with("SELECT 1 WHERE false");
        panel.run(&backend).await;
        assert_eq!(panel.view(), ResultsView::Results(&ResultSet::new()));

        panel.editor_mut().handle_query_change("");
        panel.run(&backend).await;
        assert!(matches!(panel.view(), ResultsView::Results(_)));
    }

    #[tokio::test]
    async fn test_export_csv_after_run() {
        let backend = MockQueryBackend::new(rows(json!([{ "x": 1, "y": 2 }])));
        let mut panel = panel_with("SELECT x, y");
        panel.run(&backend).await;

        let mut downloads: Vec<ExportFile> = Vec::new();
        assert!(panel.export(ExportFormat::Csv, &mut downloads));

        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].file_name, "data.csv");
        assert_eq!(downloads[0].contents, "x,y\n1,2");
        assert_eq!(
            panel.notifier().last(),
            Some((ToastKind::Success, "Exported data.csv"))
        );
    }

    #[test]
    fn test_export_without_results_is_rejected() {
        let mut panel = panel_with("SELECT 1");
        let mut downloads: Vec<ExportFile> = Vec::new();

        for format in [ExportFormat::Csv, ExportFormat::Json] {
            assert!(!panel.export(format, &mut downloads));
            assert_eq!(
                panel.notifier().last(),
                Some((ToastKind::Error, NO_DATA_MESSAGE))
            );
        }
        assert!(downloads.is_empty());
    }

    #[test]
    fn test_export_sql_needs_query_text() {
        let mut panel = panel_with("");
        let mut downloads: Vec<ExportFile> = Vec::new();
        assert!(!panel.export(ExportFormat::SqlQuery, &mut downloads));
        assert_eq!(
            panel.notifier().last(),
            Some((ToastKind::Error, NO_QUERY_MESSAGE))
        );

        panel.editor_mut().handle_query_change("SELECT 1");
        assert!(panel.export(ExportFormat::SqlQuery, &mut downloads));
        assert_eq!(downloads[0].contents, "SELECT 1");
    }

    #[tokio::test]
    async fn test_export_sink_failure() {
        let backend = MockQueryBackend::with_sample_data();
        let mut panel = panel_with("SELECT 1");
        panel.run(&backend).await;

        assert!(!panel.export(ExportFormat::Json, &mut FailingDownloads));
        assert_eq!(
            panel.notifier().last(),
            Some((ToastKind::Error, EXPORT_FAILURE_MESSAGE))
        );
    }

    #[tokio::test]
    async fn test_editor_load_state() {
        let mut panel = panel_with("");
        assert!(matches!(panel.editor_state(), LoadState::Loading));

        panel.set_editor_loaded(load_editor().await);
        assert!(panel.is_editor_ready());

        panel.set_editor_loaded(Err("missing keywords".to_string()));
        assert!(matches!(panel.editor_state(), LoadState::Failed(r) if r == "missing keywords"));
    }
}
