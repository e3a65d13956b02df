//! ClickHouse over its HTTP interface.

use crate::http::{
    JobTable, ResultSet, bounded, first_count, http_client, json_body, not_connected, send,
    service_root,
};
use async_trait::async_trait;
use quarry_core::{BackendKind, BackendSettings, ExecutionOutcome, Row, Task, TaskId};
use quarry_error::{ConnectionError, QuarryResult};
use quarry_interface::{BackendStatus, ExecutionBackend, HealthStatus};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument, warn};

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

#[derive(Debug, Deserialize)]
struct JsonResult {
    #[serde(default)]
    meta: Vec<Column>,
    #[serde(default)]
    data: Vec<Row>,
}

/// ClickHouse HTTP client. Queries are tagged with the task id so they can
/// be killed.
#[derive(Debug)]
pub struct ClickHouseBackend {
    client: Client,
    root: String,
    settings: BackendSettings,
    connected: AtomicBool,
    running: JobTable<String>,
}

impl ClickHouseBackend {
    /// Backend for the server at `settings.url()`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(settings: BackendSettings) -> QuarryResult<Self> {
        Ok(Self {
            client: http_client()?,
            root: service_root(settings.url()),
            settings,
            connected: AtomicBool::new(false),
            running: JobTable::new(),
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match self.settings.database() {
            Some(database) => request.query(&[("database", database.as_str())]),
            None => request,
        };
        match self.settings.username() {
            Some(user) => request.basic_auth(user, self.settings.password().as_ref()),
            None => request,
        }
    }

    async fn run(&self, sql: &str, task_id: TaskId) -> QuarryResult<ResultSet> {
        let query_id = task_id.to_string();
        let body = format!("{} FORMAT JSON", sql.trim().trim_end_matches(';'));
        self.running.insert(task_id, query_id.clone()).await;

        let request = self.authed(
            self.client
                .post(format!("{}/", self.root))
                .query(&[("query_id", query_id.as_str())])
                .body(body),
        );
        let result: QuarryResult<JsonResult> = async {
            let response = send(request, "ClickHouse query").await?;
            json_body(response, "ClickHouse query").await
        }
        .await;

        self.running.remove(task_id).await;
        let result = result?;
        let columns = result.meta.into_iter().map(|column| column.name).collect();
        Ok((columns, result.data))
    }

    async fn ping(&self) -> QuarryResult<()> {
        send(self.client.get(format!("{}/ping", self.root)), "ClickHouse ping").await?;
        Ok(())
    }
}

#[async_trait]
impl ExecutionBackend for ClickHouseBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ClickHouse
    }

    #[instrument(skip(self), fields(backend = "clickhouse", url = %self.root))]
    async fn connect(&self) -> QuarryResult<()> {
        self.ping().await.map_err(|e| {
            ConnectionError::new(format!("ClickHouse at {} unreachable: {}", self.root, e))
        })?;
        self.connected.store(true, Ordering::SeqCst);
        info!("Connected to ClickHouse");
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    #[instrument(skip(self, sql, task), fields(backend = "clickhouse", task_id = %task.id()))]
    async fn execute(&self, sql: &str, task: &Task) -> ExecutionOutcome {
        if !self.connected.load(Ordering::SeqCst) {
            return not_connected(self.kind(), task);
        }
        let outcome = bounded(self.kind(), task, self.run(sql, task.id())).await;
        // A job still tracked here was abandoned by the timeout.
        if self.cancel(task.id()).await {
            warn!(task_id = %task.id(), "Cancelled job abandoned after timeout");
        }
        self.running.remove(task.id()).await;
        outcome
    }

    async fn execute_count(&self, sql: &str, task: &Task) -> u64 {
        first_count(&self.execute(sql, task).await)
    }

    async fn status(&self) -> BackendStatus {
        let connected = self.connected.load(Ordering::SeqCst);
        let health = match self.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy {
                message: e.to_string(),
            },
        };
        BackendStatus::new(BackendKind::ClickHouse, connected, health)
            .with_detail("url", self.root.clone())
            .with_detail("running_queries", self.running.len().await)
    }

    #[instrument(skip(self), fields(backend = "clickhouse"))]
    async fn cancel(&self, task_id: TaskId) -> bool {
        let Some(query_id) = self.running.get(task_id).await else {
            return false;
        };
        let kill = format!("KILL QUERY WHERE query_id = '{}'", query_id);
        let request = self.authed(self.client.post(format!("{}/", self.root)).body(kill));
        match send(request, "ClickHouse kill").await {
            Ok(_) => {
                info!(query_id = %query_id, "Query killed");
                true
            }
            Err(e) => {
                warn!(query_id = %query_id, error = %e, "Query kill failed");
                false
            }
        }
    }
}
