//! Remote query execution.
//!
//! Queries are never executed locally: the query text and the selected
//! database name are POSTed to an export endpoint, which answers with a JSON
//! array of row objects.

use crate::config::BackendConfig;
use crate::error::{PanelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// One result row: column name to scalar value, in the order the server sent them.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Ordered rows returned by one query execution.
pub type ResultSet = Vec<Row>;

/// Message shown when a run is attempted without query text.
pub const EMPTY_QUERY_MESSAGE: &str = "Please Enter Query";

/// Body of the request sent to the query endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub database_name: String,
    pub query: String,
}

impl QueryRequest {
    /// Builds a request, rejecting empty or whitespace-only queries.
    pub fn new(query: &str, database: &str) -> Result<Self> {
        if query.trim().is_empty() {
            return Err(PanelError::validation(EMPTY_QUERY_MESSAGE));
        }
        Ok(Self {
            database_name: database.to_string(),
            query: query.to_string(),
        })
    }
}

/// Something that can answer a [`QueryRequest`] with rows.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Executes the request. Exactly one remote call per invocation.
    async fn execute(&self, request: &QueryRequest) -> Result<ResultSet>;
}

/// Backend that POSTs to the configured HTTP(S) endpoint.
#[derive(Debug, Clone)]
pub struct HttpQueryBackend {
    endpoint: String,
    client: Client,
}

impl HttpQueryBackend {
    /// Creates a backend from the endpoint settings.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder =
            Client::builder().danger_accept_invalid_certs(config.accept_invalid_certs);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PanelError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.endpoint().to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryBackend for HttpQueryBackend {
    async fn execute(&self, request: &QueryRequest) -> Result<ResultSet> {
        debug!(endpoint = %self.endpoint, database = %request.database_name, "Sending query");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| PanelError::network(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PanelError::network(format!(
                "Endpoint returned {status}: {body}"
            )));
        }

        response
            .json::<ResultSet>()
            .await
            .map_err(|e| PanelError::network(format!("Invalid response body: {e}")))
    }
}

/// In-memory backend for headless runs and tests.
///
/// Answers queued failures first, then falls back to the default rows.
#[derive(Debug, Default)]
pub struct MockQueryBackend {
    default_rows: ResultSet,
    queued: Mutex<VecDeque<std::result::Result<ResultSet, String>>>,
    requests: Mutex<Vec<QueryRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockQueryBackend {
    /// Creates a mock that answers every request with `rows`.
    pub fn new(rows: ResultSet) -> Self {
        Self {
            default_rows: rows,
            ..Default::default()
        }
    }

    /// Creates a mock with a small sample table.
    pub fn with_sample_data() -> Self {
        let rows = serde_json::json!([
            { "id": 1, "name": "Alice", "email": "alice@example.com" },
            { "id": 2, "name": "Bob", "email": null }
        ]);
        Self::new(serde_json::from_value(rows).unwrap_or_default())
    }

    /// Delays every answer by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a one-shot failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(Err(message.into()));
        }
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl QueryBackend for MockQueryBackend {
    async fn execute(&self, request: &QueryRequest) -> Result<ResultSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self.queued.lock().ok().and_then(|mut q| q.pop_front());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(PanelError::network(message)),
            None => Ok(self.default_rows.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> HttpQueryBackend {
        let config = BackendConfig {
            endpoint: Some(format!("{}/api/exportQuery", server.uri())),
            ..Default::default()
        };
        HttpQueryBackend::new(&config).unwrap()
    }

    async fn run_query(backend: &dyn QueryBackend, query: &str, database: &str) -> Result<ResultSet> {
        let request = QueryRequest::new(query, database)?;
        backend.execute(&request).await
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = QueryRequest::new("SELECT 1", "inventory").unwrap();
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({ "databaseName": "inventory", "query": "SELECT 1" }));
    }

    #[test]
    fn test_request_rejects_blank_query() {
        for query in ["", "   ", "\n\t"] {
            let err = QueryRequest::new(query, "db").unwrap_err();
            assert_eq!(err.category(), "Validation Error");
            assert_eq!(err.detail(), EMPTY_QUERY_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_http_backend_posts_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/exportQuery"))
            .and(body_json(json!({ "databaseName": "shop", "query": "SELECT 1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "a": 1 }])))
            .expect(1)
            .mount(&server)
            .await;

        let rows = run_query(&backend_for(&server), "SELECT 1", "shop")
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["a"], json!(1));
    }

    #[tokio::test]
    async fn test_http_backend_preserves_column_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"[{"zeta":1,"alpha":2,"mid":3}]"#, "application/json"),
            )
            .mount(&server)
            .await;

        let rows = run_query(&backend_for(&server), "SELECT 1", "db")
            .await
            .unwrap();

        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_http_backend_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("syntax error near FROM"))
            .mount(&server)
            .await;

        let err = run_query(&backend_for(&server), "SELEC 1", "db")
            .await
            .unwrap_err();

        assert_eq!(err.category(), "Network Error");
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("syntax error near FROM"));
    }

    #[tokio::test]
    async fn test_http_backend_invalid_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = run_query(&backend_for(&server), "SELECT 1", "db")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid response body"));
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let result = run_query(&backend_for(&server), "  ", "db").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_backend_queue_then_default() {
        let mock = MockQueryBackend::with_sample_data();
        mock.push_failure("boom");

        let request = QueryRequest::new("SELECT 1", "db").unwrap();
        assert!(mock.execute(&request).await.is_err());
        assert_eq!(mock.execute(&request).await.unwrap().len(), 2);
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.requests()[0], request);
    }
}
