//! Presto / Trino through the client REST protocol.
//!
//! A statement is posted to `/v1/statement`; the answer and each following
//! page carry columns, data and a `nextUri` to follow until the query is
//! finished. Cancelling deletes the current `nextUri`.

use crate::http::{
    JobTable, ResultSet, bounded, first_count, http_client, json_body, not_connected, pause, send,
    service_root, zip_row,
};
use async_trait::async_trait;
use quarry_core::{BackendKind, BackendSettings, ExecutionOutcome, Row, Task, TaskId};
use quarry_error::{ConnectionError, ExecutionError, ExecutionErrorKind, QuarryResult};
use quarry_interface::{BackendStatus, ExecutionBackend, HealthStatus};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

const DEFAULT_USER: &str = "quarry";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResults {
    id: String,
    #[serde(default)]
    next_uri: Option<String>,
    #[serde(default)]
    columns: Option<Vec<Column>>,
    #[serde(default)]
    data: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    error: Option<QueryError>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryError {
    message: String,
    #[serde(default)]
    error_name: Option<String>,
}

/// Presto / Trino coordinator client.
#[derive(Debug)]
pub struct TrinoBackend {
    client: Client,
    root: String,
    user: String,
    settings: BackendSettings,
    connected: AtomicBool,
    /// Current `nextUri` per task
    queries: JobTable<String>,
}

impl TrinoBackend {
    /// Backend for the coordinator at `settings.url()`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(settings: BackendSettings) -> QuarryResult<Self> {
        let user = settings
            .username()
            .clone()
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        Ok(Self {
            client: http_client()?,
            root: service_root(settings.url()),
            user,
            settings,
            connected: AtomicBool::new(false),
            queries: JobTable::new(),
        })
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header("X-Trino-User", &self.user);
        if let Some(catalog) = self.settings.catalog() {
            request = request.header("X-Trino-Catalog", catalog);
        }
        if let Some(schema) = self.settings.schema() {
            request = request.header("X-Trino-Schema", schema);
        }
        request
    }

    async fn info(&self) -> QuarryResult<Value> {
        let response = send(self.client.get(format!("{}/v1/info", self.root)), "Trino info").await?;
        json_body(response, "Trino info").await
    }

    async fn run(&self, sql: &str, task_id: TaskId) -> QuarryResult<ResultSet> {
        let request = self.with_session(
            self.client
                .post(format!("{}/v1/statement", self.root))
                .body(sql.trim().trim_end_matches(';').to_string()),
        );
        let mut page: QueryResults =
            json_body(send(request, "Trino submit").await?, "Trino statement").await?;
        debug!(query_id = %page.id, "Trino query submitted");

        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Row> = Vec::new();
        let result: QuarryResult<()> = async {
            loop {
                if let Some(error) = page.error.take() {
                    return Err(ExecutionError::new(ExecutionErrorKind::Query(format!(
                        "{}: {}",
                        error.error_name.unwrap_or_else(|| "QUERY_FAILED".to_string()),
                        error.message
                    )))
                    .into());
                }
                if columns.is_empty()
                    && let Some(page_columns) = page.columns.take()
                {
                    columns = page_columns.into_iter().map(|c| c.name).collect();
                }
                let has_data = page.data.is_some();
                for values in page.data.take().unwrap_or_default() {
                    rows.push(zip_row(&columns, values));
                }

                let Some(next) = page.next_uri.take() else {
                    break;
                };
                self.queries.insert(task_id, next.clone()).await;
                if !has_data {
                    pause(*self.settings.poll_interval_ms()).await;
                }
                let request = self.with_session(self.client.get(&next));
                page = json_body(send(request, "Trino poll").await?, "Trino statement").await?;
            }
            Ok(())
        }
        .await;

        self.queries.remove(task_id).await;
        result?;
        Ok((columns, rows))
    }
}

#[async_trait]
impl ExecutionBackend for TrinoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Presto
    }

    #[instrument(skip(self), fields(backend = "presto", url = %self.root))]
    async fn connect(&self) -> QuarryResult<()> {
        let info = self.info().await.map_err(|e| {
            ConnectionError::new(format!("Trino at {} unreachable: {}", self.root, e))
        })?;
        if info.get("starting").and_then(Value::as_bool) == Some(true) {
            return Err(ConnectionError::new("Trino coordinator is still starting").into());
        }
        self.connected.store(true, Ordering::SeqCst);
        info!(
            version = ?info.pointer("/nodeVersion/version"),
            "Connected to Trino"
        );
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    #[instrument(skip(self, sql, task), fields(backend = "presto", task_id = %task.id()))]
    async fn execute(&self, sql: &str, task: &Task) -> ExecutionOutcome {
        if !self.connected.load(Ordering::SeqCst) {
            return not_connected(self.kind(), task);
        }
        let outcome = bounded(self.kind(), task, self.run(sql, task.id())).await;
        // A job still tracked here was abandoned by the timeout.
        if self.cancel(task.id()).await {
            warn!(task_id = %task.id(), "Cancelled job abandoned after timeout");
        }
        self.queries.remove(task.id()).await;
        outcome
    }

    async fn execute_count(&self, sql: &str, task: &Task) -> u64 {
        first_count(&self.execute(sql, task).await)
    }

    async fn status(&self) -> BackendStatus {
        let connected = self.connected.load(Ordering::SeqCst);
        let running = self.queries.len().await;
        match self.info().await {
            Ok(info) => {
                let health = if info.get("starting").and_then(Value::as_bool) == Some(true) {
                    HealthStatus::Degraded {
                        message: "coordinator starting".into(),
                    }
                } else {
                    HealthStatus::Healthy
                };
                let version = info
                    .pointer("/nodeVersion/version")
                    .cloned()
                    .unwrap_or(Value::Null);
                BackendStatus::new(BackendKind::Presto, connected, health)
                    .with_detail("url", self.root.clone())
                    .with_detail("version", version)
                    .with_detail("running_queries", running)
            }
            Err(e) => BackendStatus::new(
                BackendKind::Presto,
                connected,
                HealthStatus::Unhealthy {
                    message: e.to_string(),
                },
            )
            .with_detail("url", self.root.clone())
            .with_detail("running_queries", running),
        }
    }

    #[instrument(skip(self), fields(backend = "presto"))]
    async fn cancel(&self, task_id: TaskId) -> bool {
        let Some(next) = self.queries.get(task_id).await else {
            return false;
        };
        match send(self.with_session(self.client.delete(&next)), "Trino cancel").await {
            Ok(_) => {
                info!("Trino query cancelled");
                true
            }
            Err(e) => {
                warn!(error = %e, "Trino cancel failed");
                false
            }
        }
    }
}
