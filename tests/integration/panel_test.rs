//! End-to-end panel flows against a local HTTP endpoint.

use pretty_assertions::assert_eq;
use qpanel::config::BackendConfig;
use qpanel::editor::ActiveQueryEditor;
use qpanel::executor::HttpQueryBackend;
use qpanel::export::{ExportFormat, FileDownloader};
use qpanel::notify::{ToastKind, Toasts};
use qpanel::panel::{QueryPanel, ResultsView, RUN_FAILURE_MESSAGE, RUN_SUCCESS_MESSAGE};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> HttpQueryBackend {
    HttpQueryBackend::new(&BackendConfig {
        endpoint: Some(format!("{}/api/exportQuery", server.uri())),
        timeout_secs: Some(5),
        ..Default::default()
    })
    .unwrap()
}

fn panel_with(query: &str) -> QueryPanel<Toasts> {
    let mut editor = ActiveQueryEditor::new();
    editor.handle_query_change(query);
    QueryPanel::new("inventory", editor, Toasts::new(Duration::from_secs(3)))
}

#[tokio::test]
async fn test_run_then_export_all_formats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/exportQuery"))
        .and(body_json(
            json!({ "databaseName": "inventory", "query": "SELECT sku, qty FROM stock" }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"[{"sku":"A-1","qty":3},{"sku":"B-2","qty":null}]"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let mut panel = panel_with("SELECT sku, qty FROM stock");
    assert!(panel.run(&backend).await);
    assert!(matches!(panel.view(), ResultsView::Results(rows) if rows.len() == 2));
    assert_eq!(panel.notifier().message(), RUN_SUCCESS_MESSAGE);

    let dir = tempfile::tempdir().unwrap();
    let mut downloads = FileDownloader::new(dir.path());
    for format in ExportFormat::ALL {
        assert!(panel.export(format, &mut downloads));
    }

    let read = |name: &str| std::fs::read_to_string(dir.path().join(name)).unwrap();
    assert_eq!(read("query.sql"), "SELECT sku, qty FROM stock");
    assert_eq!(read("data.csv"), "sku,qty\nA-1,3\nB-2,");
    assert_eq!(
        read("data.json"),
        r#"[{"sku":"A-1","qty":3},{"sku":"B-2","qty":null}]"#
    );
    assert_eq!(panel.notifier().message(), "Exported data.json");
}

#[tokio::test]
async fn test_endpoint_failure_shows_error_toast() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let mut panel = panel_with("SELECT 1");
    assert!(panel.run(&backend).await);

    assert_eq!(panel.notifier().kind(), ToastKind::Error);
    assert_eq!(panel.notifier().message(), RUN_FAILURE_MESSAGE);
    assert_eq!(panel.view(), ResultsView::Empty);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_reported() {
    let backend = HttpQueryBackend::new(&BackendConfig {
        // Port 9 (discard) is closed on test machines
        endpoint: Some("http://127.0.0.1:9/api/exportQuery".to_string()),
        timeout_secs: Some(2),
        ..Default::default()
    })
    .unwrap();

    let mut panel = panel_with("SELECT 1");
    panel.run(&backend).await;
    assert_eq!(panel.notifier().message(), RUN_FAILURE_MESSAGE);
    assert!(!panel.is_running());
}
