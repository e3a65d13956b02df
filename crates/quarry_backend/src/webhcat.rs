//! Apache Hive through WebHCat (Templeton).
//!
//! Statements run as Hive CLI jobs whose stdout lands in a per-task status
//! directory on HDFS; results are read back over WebHDFS as tab-separated
//! text with a header line.

use crate::http::{
    JobTable, ResultSet, bounded, first_count, http_client, json_body, not_connected, pause, send,
    service_root, zip_row,
};
use async_trait::async_trait;
use quarry_core::{BackendKind, BackendSettings, ExecutionOutcome, Task, TaskId};
use quarry_error::{ConnectionError, ExecutionError, ExecutionErrorKind, QuarryResult};
use quarry_interface::{BackendStatus, ExecutionBackend, HealthStatus};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument, warn};

const DEFAULT_USER: &str = "hive";
const DEFAULT_STATUS_DIR: &str = "/tmp/quarry";

#[derive(Debug, Deserialize)]
struct Submitted {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobState {
    status: JobStatus,
    #[serde(rename = "exitValue", default)]
    exit_value: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    state: String,
    #[serde(rename = "failureInfo", default)]
    failure_info: Option<String>,
}

/// Hive over WebHCat, with output read from WebHDFS.
#[derive(Debug)]
pub struct WebHcatBackend {
    client: Client,
    root: String,
    webhdfs: String,
    user: String,
    settings: BackendSettings,
    connected: AtomicBool,
    jobs: JobTable<String>,
}

impl WebHcatBackend {
    /// Backend for the WebHCat server at `settings.url()`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(settings: BackendSettings) -> QuarryResult<Self> {
        let root = service_root(settings.url());
        let webhdfs = settings
            .webhdfs_url()
            .as_deref()
            .map(service_root)
            .unwrap_or_else(|| root.clone());
        let user = settings
            .username()
            .clone()
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        Ok(Self {
            client: http_client()?,
            root,
            webhdfs,
            user,
            settings,
            connected: AtomicBool::new(false),
            jobs: JobTable::new(),
        })
    }

    fn status_dir(&self, task_id: TaskId) -> String {
        let base = self
            .settings
            .status_dir()
            .as_deref()
            .unwrap_or(DEFAULT_STATUS_DIR)
            .trim_end_matches('/');
        format!("{}/{}", base, task_id)
    }

    fn script(&self, sql: &str) -> String {
        let mut script = String::from("set hive.cli.print.header=true;\n");
        if let Some(database) = self.settings.database() {
            script.push_str(&format!("use {};\n", database));
        }
        script.push_str(sql.trim().trim_end_matches(';'));
        script.push(';');
        script
    }

    async fn job_state(&self, job_id: &str) -> QuarryResult<JobState> {
        let response = send(
            self.client
                .get(format!("{}/templeton/v1/jobs/{}", self.root, job_id))
                .query(&[("user.name", self.user.as_str())]),
            "WebHCat job status",
        )
        .await?;
        json_body(response, "WebHCat job").await
    }

    async fn read_stdout(&self, status_dir: &str) -> QuarryResult<String> {
        let response = send(
            self.client
                .get(format!("{}/webhdfs/v1{}/stdout", self.webhdfs, status_dir))
                .query(&[("op", "OPEN"), ("user.name", self.user.as_str())]),
            "WebHDFS read",
        )
        .await?;
        response.text().await.map_err(|e| {
            ExecutionError::new(ExecutionErrorKind::Protocol(format!(
                "Failed to read job output: {}",
                e
            )))
            .into()
        })
    }

    async fn run(&self, sql: &str, task_id: TaskId) -> QuarryResult<ResultSet> {
        let status_dir = self.status_dir(task_id);
        let script = self.script(sql);
        let response = send(
            self.client
                .post(format!("{}/templeton/v1/hive", self.root))
                .form(&[
                    ("user.name", self.user.as_str()),
                    ("execute", script.as_str()),
                    ("statusdir", status_dir.as_str()),
                ]),
            "WebHCat submit",
        )
        .await?;
        let submitted: Submitted = json_body(response, "WebHCat submit").await?;
        self.jobs.insert(task_id, submitted.id.clone()).await;
        debug!(job_id = %submitted.id, "Hive job submitted");

        let result: QuarryResult<ResultSet> = async {
            loop {
                let state = self.job_state(&submitted.id).await?;
                match state.status.state.as_str() {
                    "SUCCEEDED" => {
                        if let Some(code) = state.exit_value.filter(|code| *code != 0) {
                            return Err(ExecutionError::new(ExecutionErrorKind::Query(format!(
                                "Hive job {} exited with {}",
                                submitted.id, code
                            )))
                            .into());
                        }
                        break;
                    }
                    "FAILED" => {
                        return Err(ExecutionError::new(ExecutionErrorKind::Query(
                            state
                                .status
                                .failure_info
                                .unwrap_or_else(|| format!("Hive job {} failed", submitted.id)),
                        ))
                        .into());
                    }
                    "KILLED" => {
                        return Err(ExecutionError::new(ExecutionErrorKind::Cancelled(format!(
                            "Hive job {}",
                            submitted.id
                        )))
                        .into());
                    }
                    _ => pause(*self.settings.poll_interval_ms()).await,
                }
            }
            let stdout = self.read_stdout(&status_dir).await?;
            Ok(parse_tsv(&stdout))
        }
        .await;

        self.jobs.remove(task_id).await;
        result
    }
}

/// Parse Hive CLI output: a header line then tab-separated rows.
///
/// Header names lose their `table.` prefix; `NULL` becomes null and numeric
/// cells become numbers.
fn parse_tsv(text: &str) -> ResultSet {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return (Vec::new(), Vec::new());
    };
    let columns: Vec<String> = header
        .split('\t')
        .map(|name| name.rsplit('.').next().unwrap_or(name).trim().to_string())
        .collect();

    let rows = lines
        .map(|line| {
            let values = line.split('\t').map(cell).collect();
            zip_row(&columns, values)
        })
        .collect();
    (columns, rows)
}

fn cell(text: &str) -> Value {
    if text == "NULL" {
        return Value::Null;
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = text.parse::<f64>()
        && f.is_finite()
    {
        return Value::from(f);
    }
    Value::from(text)
}

#[async_trait]
impl ExecutionBackend for WebHcatBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Hive
    }

    #[instrument(skip(self), fields(backend = "hive", url = %self.root))]
    async fn connect(&self) -> QuarryResult<()> {
        let request = self
            .client
            .get(format!("{}/templeton/v1/status", self.root))
            .query(&[("user.name", self.user.as_str())]);
        let response = send(request, "WebHCat status").await.map_err(|e| {
            ConnectionError::new(format!("WebHCat at {} unreachable: {}", self.root, e))
        })?;
        let body: Value = json_body(response, "WebHCat status").await?;
        if body.get("status").and_then(Value::as_str) != Some("ok") {
            return Err(ConnectionError::new(format!("WebHCat reported {}", body)).into());
        }
        self.connected.store(true, Ordering::SeqCst);
        info!("Connected to WebHCat");
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    #[instrument(skip(self, sql, task), fields(backend = "hive", task_id = %task.id()))]
    async fn execute(&self, sql: &str, task: &Task) -> ExecutionOutcome {
        if !self.connected.load(Ordering::SeqCst) {
            return not_connected(self.kind(), task);
        }
        let outcome = bounded(self.kind(), task, self.run(sql, task.id())).await;
        // A job still tracked here was abandoned by the timeout.
        if self.cancel(task.id()).await {
            warn!(task_id = %task.id(), "Cancelled job abandoned after timeout");
        }
        self.jobs.remove(task.id()).await;
        outcome
    }

    async fn execute_count(&self, sql: &str, task: &Task) -> u64 {
        first_count(&self.execute(sql, task).await)
    }

    async fn status(&self) -> BackendStatus {
        let connected = self.connected.load(Ordering::SeqCst);
        let health = if connected {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy {
                message: "not connected".into(),
            }
        };
        BackendStatus::new(BackendKind::Hive, connected, health)
            .with_detail("url", self.root.clone())
            .with_detail("webhdfs_url", self.webhdfs.clone())
            .with_detail("user", self.user.clone())
            .with_detail("running_jobs", self.jobs.len().await)
    }

    #[instrument(skip(self), fields(backend = "hive"))]
    async fn cancel(&self, task_id: TaskId) -> bool {
        let Some(job_id) = self.jobs.get(task_id).await else {
            return false;
        };
        let request = self
            .client
            .delete(format!("{}/templeton/v1/jobs/{}", self.root, job_id))
            .query(&[("user.name", self.user.as_str())]);
        match send(request, "WebHCat job kill").await {
            Ok(_) => {
                info!(job_id = %job_id, "Hive job killed");
                true
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Hive job kill failed");
                false
            }
        }
    }
}
