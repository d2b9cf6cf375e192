//! HTTP record store client
//!
//! The endpoint is a spreadsheet-backed web app exposing three actions:
//! `GET ?action=read`, `POST ?action=save` with `{ "review": ... }` and
//! `POST ?action=delete&id=...`. Writes carry no transactional guarantee and
//! concurrent writers are not coordinated.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use evalsenior_core::{Config, RecordStore, ReviewRecord};
use reqwest::header::CONTENT_TYPE;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::{Error, Result};

const TEXT_PLAIN: &str = "text/plain;charset=utf-8";

/// Record store reached over HTTP
#[derive(Clone)]
pub struct HttpRecordStore {
    client: reqwest::Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl HttpRecordStore {
    /// Create a client for the given endpoint
    ///
    /// An empty endpoint is accepted: reads then return nothing and writes
    /// fail with a configuration error.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::build(endpoint.into(), None)
    }

    /// Create a client from configuration (endpoint and timeout)
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::build(config.active_db_url(), config.store.request_timeout)
    }

    fn build(endpoint: String, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = endpoint.trim().to_string();
        if !endpoint.is_empty() {
            Url::parse(&endpoint)
                .map_err(|e| Error::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        }

        let mut builder = reqwest::Client::builder().user_agent("evalsenior");
        if cfg!(test) {
            builder = builder.no_proxy();
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        debug!(endpoint = %endpoint, ?timeout, "Created record store client");
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Endpoint URL with the given query parameters appended
    fn action_url(&self, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| Error::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;
        url.query_pairs_mut().extend_pairs(params);
        Ok(url)
    }

    fn require_endpoint(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(Error::InvalidEndpoint("database URL is missing".to_string()));
        }
        Ok(())
    }

    /// Fetch every record
    ///
    /// A non-JSON answer usually means the endpoint demands an interactive
    /// login and is reported as a configuration error.
    pub async fn fetch_all(&self) -> Result<Vec<ReviewRecord>> {
        if self.endpoint.is_empty() {
            return Ok(Vec::new());
        }

        let cache_buster = Utc::now().timestamp_millis().to_string();
        let url = self.action_url(&[("action", "read"), ("_t", cache_buster.as_str())])?;
        debug!(url = %url, "Fetching reviews");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Status {
                action: "read",
                status: response.status(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("application/json") {
            warn!(content_type = %content_type, "Record store did not answer JSON");
            return Err(Error::NotJson { content_type });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse reviews: {}", e)))?;

        let records = parse_records(body);
        info!(count = records.len(), "Fetched reviews");
        Ok(records)
    }

    /// Write the full record
    pub async fn save(&self, review: &ReviewRecord) -> Result<()> {
        self.require_endpoint()?;
        let url = self.action_url(&[("action", "save")])?;
        let body = json!({ "review": review });

        debug!(review_id = %review.id, "Saving review");
        self.dispatch("save", url, body.to_string()).await
    }

    /// Delete a record by id
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.require_endpoint()?;
        let url = self.action_url(&[("action", "delete"), ("id", id)])?;

        debug!(review_id = %id, "Deleting review");
        self.dispatch("delete", url, "{}".to_string()).await
    }

    /// Single best-effort POST; the response body is ignored
    async fn dispatch(&self, action: &'static str, url: Url, body: String) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, TEXT_PLAIN)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(action, %status, "Record store rejected write");
            return Err(Error::Status { action, status });
        }
        Ok(())
    }
}

/// Non-array bodies yield nothing; malformed entries are skipped
fn parse_records(body: serde_json::Value) -> Vec<ReviewRecord> {
    let serde_json::Value::Array(items) = body else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ReviewRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Skipping malformed review");
                None
            }
        })
        .collect()
}

impl std::fmt::Debug for HttpRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecordStore")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn rebind(&self, endpoint: &str) -> evalsenior_core::Result<Self> {
        Ok(Self::build(endpoint.to_string(), self.timeout)?)
    }

    async fn list(&self) -> evalsenior_core::Result<Vec<ReviewRecord>> {
        Ok(self.fetch_all().await?)
    }

    async fn put(&self, review: &ReviewRecord) -> evalsenior_core::Result<()> {
        Ok(self.save(review).await?)
    }

    async fn remove(&self, id: &str) -> evalsenior_core::Result<()> {
        Ok(self.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;
    use chrono::NaiveDate;
    use evalsenior_core::ReviewStatus;

    fn review() -> ReviewRecord {
        ReviewRecord::new(
            "1712345678901",
            "Jean Dupont",
            "Cuisinier",
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        )
    }

    #[test]
    fn test_action_url() {
        let store = HttpRecordStore::new("https://script.example.com/macros/s/abc/exec").unwrap();
        let url = store.action_url(&[("action", "delete"), ("id", "a&b")]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://script.example.com/macros/s/abc/exec?action=delete&id=a%26b"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            HttpRecordStore::new("not a url"),
            Err(Error::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_parse_records() {
        let body = serde_json::json!([
            {"id": "1", "employeeName": "A", "status": "Non commencé"},
            {"employeeName": "missing id"},
            {"id": 2, "employeeName": "B", "status": "Terminé & Signé", "validatedAt": "2025-04-01"}
        ]);
        let records = parse_records(body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "2");
        assert_eq!(records[1].status, ReviewStatus::Completed);

        let blank_cells = serde_json::json!([
            {"id": "3", "employeeName": "C", "employeeRole": null, "status": "", "validatedAt": ""}
        ]);
        let records = parse_records(blank_cells);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ReviewStatus::NotStarted);
        assert!(records[0].validated_at.is_none());

        assert!(parse_records(serde_json::json!({"error": "nope"})).is_empty());
    }

    #[tokio::test]
    async fn test_empty_endpoint() {
        let store = HttpRecordStore::new("").unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());
        assert!(matches!(
            store.save(&review()).await,
            Err(Error::InvalidEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_list_reads_json_array() {
        let body = serde_json::to_string(&vec![review()]).unwrap();
        let (url, handle) = serve_once("200 OK", "application/json; charset=utf-8", &body).await;

        let store = HttpRecordStore::new(url).unwrap();
        let records = store.fetch_all().await.unwrap();
        assert_eq!(records, vec![review()]);

        let request = handle.await.unwrap();
        assert!(request.request_line.starts_with("GET /exec?action=read&_t="));
    }

    #[tokio::test]
    async fn test_list_non_json_is_configuration_error() {
        let (url, handle) = serve_once("200 OK", "text/html", "<html>Sign in</html>").await;

        let store = HttpRecordStore::new(url).unwrap();
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, evalsenior_core::Error::Config(_)));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_list_non_array_is_empty() {
        let (url, handle) = serve_once("200 OK", "application/json", "{\"status\":\"ok\"}").await;

        let store = HttpRecordStore::new(url).unwrap();
        assert!(store.fetch_all().await.unwrap().is_empty());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_save_payload() {
        let (url, handle) = serve_once("200 OK", "text/plain", "").await;

        let store = HttpRecordStore::new(url).unwrap();
        store.put(&review()).await.unwrap();

        let request = handle.await.unwrap();
        assert_eq!(request.request_line, "POST /exec?action=save HTTP/1.1");
        assert!(request
            .headers
            .to_ascii_lowercase()
            .contains("content-type: text/plain;charset=utf-8"));
        let payload: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(payload["review"]["id"], "1712345678901");
        assert_eq!(payload["review"]["employeeName"], "Jean Dupont");
    }

    #[tokio::test]
    async fn test_delete_request() {
        let (url, handle) = serve_once("200 OK", "text/plain", "").await;

        let store = HttpRecordStore::new(url).unwrap();
        store.remove("42").await.unwrap();

        let request = handle.await.unwrap();
        assert_eq!(request.request_line, "POST /exec?action=delete&id=42 HTTP/1.1");
        assert_eq!(request.body, "{}");
    }

    #[tokio::test]
    async fn test_rejected_write_surfaces() {
        let (url, handle) = serve_once("500 Internal Server Error", "text/plain", "boom").await;

        let store = HttpRecordStore::new(url).unwrap();
        let err = store.put(&review()).await.unwrap_err();
        assert!(matches!(err, evalsenior_core::Error::Transport(_)));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_network_failure_surfaces() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = HttpRecordStore::new(format!("http://{}/exec", addr)).unwrap();
        let err = store.remove("1").await.unwrap_err();
        assert!(matches!(err, evalsenior_core::Error::Transport(_)));
    }

    #[test]
    fn test_rebind_keeps_timeout() {
        let mut config = Config::default();
        config.store.request_timeout = Some(Duration::from_secs(5));
        let store = HttpRecordStore::from_config(&config).unwrap();
        let other = store.rebind("https://other.example.com/exec").unwrap();
        assert_eq!(other.endpoint(), "https://other.example.com/exec");
        assert_eq!(other.timeout, Some(Duration::from_secs(5)));
    }
}
