//! Plumbing shared by the HTTP backends.

use quarry_core::{BackendKind, ExecutionOutcome, Row, Task, TaskId};
use quarry_error::{
    ConfigError, ExecutionError, ExecutionErrorKind, HttpError, JsonError, QuarryResult,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Per-request HTTP timeout. Whole executions are bounded by the task timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Column names and rows of one result set.
pub(crate) type ResultSet = (Vec<String>, Vec<Row>);

/// Build the shared HTTP client.
pub(crate) fn http_client() -> QuarryResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)).into())
}

/// `url` without a trailing slash.
pub(crate) fn service_root(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// Send `request`, turning transport failures and non-2xx answers into errors.
pub(crate) async fn send(request: RequestBuilder, what: &str) -> QuarryResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| HttpError::new(format!("{} request failed: {}", what, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ExecutionError::new(ExecutionErrorKind::Query(format!(
            "{} returned {}: {}",
            what,
            status.as_u16(),
            body.trim()
        )))
        .into());
    }
    Ok(response)
}

/// Deserialize a response body.
pub(crate) async fn json_body<T: DeserializeOwned>(response: Response, what: &str) -> QuarryResult<T> {
    let text = response
        .text()
        .await
        .map_err(|e| HttpError::new(format!("Failed to read {} response: {}", what, e)))?;
    serde_json::from_str(&text)
        .map_err(|e| JsonError::new(format!("Failed to parse {} response: {}", what, e)).into())
}

/// Pair column names with one positional row.
pub(crate) fn zip_row(columns: &[String], values: Vec<Value>) -> Row {
    columns.iter().cloned().zip(values).collect()
}

/// Sleep between status polls.
pub(crate) async fn pause(poll_interval_ms: u64) {
    tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await;
}

/// Outcome for a backend used before [`quarry_interface::ExecutionBackend::connect`].
pub(crate) fn not_connected(kind: BackendKind, task: &Task) -> ExecutionOutcome {
    ExecutionOutcome::failed(
        Some(task.id().to_string()),
        format!("{} backend is not connected", kind),
        0.0,
    )
}

/// Run one execution under the task timeout and wrap the result.
pub(crate) async fn bounded<F>(kind: BackendKind, task: &Task, run: F) -> ExecutionOutcome
where
    F: Future<Output = QuarryResult<ResultSet>>,
{
    let started = Instant::now();
    let timeout_secs = *task.config().timeout_secs();
    let task_id = Some(task.id().to_string());

    let result = tokio::time::timeout(Duration::from_secs(timeout_secs), run).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(Ok((columns, rows))) => {
            debug!(backend = %kind, rows = rows.len(), elapsed, "Query completed");
            ExecutionOutcome::completed(task_id, columns, rows, elapsed)
        }
        Ok(Err(e)) => {
            warn!(backend = %kind, error = %e, "Query failed");
            ExecutionOutcome::failed(task_id, e.to_string(), elapsed)
        }
        Err(_) => {
            let reason = ExecutionErrorKind::Timeout(timeout_secs);
            warn!(backend = %kind, %reason, "Query timed out");
            ExecutionOutcome::failed(task_id, reason.to_string(), elapsed)
        }
    }
}

/// First cell of a count query, or 0.
pub(crate) fn first_count(outcome: &ExecutionOutcome) -> u64 {
    let cell = outcome
        .rows()
        .first()
        .and_then(|row| match outcome.columns().first() {
            Some(column) => row.get(column),
            None => row.values().next(),
        });

    match cell {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Server-side handles of running jobs, for cancellation.
#[derive(Debug)]
pub(crate) struct JobTable<H> {
    jobs: Mutex<HashMap<TaskId, H>>,
}

impl<H: Clone> JobTable<H> {
    pub(crate) fn new() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) async fn insert(&self, task_id: TaskId, handle: H) {
        self.jobs.lock().await.insert(task_id, handle);
    }

    pub(crate) async fn remove(&self, task_id: TaskId) -> Option<H> {
        self.jobs.lock().await.remove(&task_id)
    }

    pub(crate) async fn get(&self, task_id: TaskId) -> Option<H> {
        self.jobs.lock().await.get(&task_id).cloned()
    }

    pub(crate) async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }
}
