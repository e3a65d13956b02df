//! Apache Spark through the Livy REST server.
//!
//! One interactive `sql` session is opened on connect and shared by every
//! statement. Each execution submits a statement, polls it until it leaves
//! the `waiting`/`running` states and decodes the `application/json` output.

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
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Session polls before giving up on a session that never becomes idle.
const MAX_SESSION_POLLS: u32 = 240;

#[derive(Debug, Deserialize)]
struct Session {
    id: u64,
    state: String,
}

#[derive(Debug, Deserialize)]
struct Statement {
    id: u64,
    state: String,
    #[serde(default)]
    output: Option<StatementOutput>,
}

#[derive(Debug, Deserialize)]
struct StatementOutput {
    status: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    ename: Option<String>,
    #[serde(default)]
    evalue: Option<String>,
}

/// Spark SQL over Livy.
#[derive(Debug)]
pub struct LivyBackend {
    client: Client,
    root: String,
    settings: BackendSettings,
    session: RwLock<Option<u64>>,
    /// Running statement id per task
    statements: JobTable<(u64, u64)>,
}

impl LivyBackend {
    /// Backend for the Livy server at `settings.url()`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(settings: BackendSettings) -> QuarryResult<Self> {
        Ok(Self {
            client: http_client()?,
            root: service_root(settings.url()),
            settings,
            session: RwLock::new(None),
            statements: JobTable::new(),
        })
    }

    fn session_body(&self) -> Value {
        let mut body = json!({"kind": "sql", "name": format!("quarry-{}", TaskId::new())});
        if let Some(queue) = self.settings.queue() {
            body["queue"] = json!(queue);
        }
        if let Some(user) = self.settings.username() {
            body["proxyUser"] = json!(user);
        }
        body
    }

    async fn open_session(&self) -> QuarryResult<u64> {
        let response = send(
            self.client
                .post(format!("{}/sessions", self.root))
                .json(&self.session_body()),
            "Livy session create",
        )
        .await?;
        let mut session: Session = json_body(response, "Livy session").await?;
        debug!(session_id = session.id, state = %session.state, "Livy session created");

        let mut polls = 0;
        while session.state != "idle" {
            if matches!(session.state.as_str(), "dead" | "error" | "killed" | "shutting_down")
                || polls >= MAX_SESSION_POLLS
            {
                return Err(ConnectionError::new(format!(
                    "Livy session {} did not become idle (state {})",
                    session.id, session.state
                ))
                .into());
            }
            pause(*self.settings.poll_interval_ms()).await;
            session = self.fetch_session(session.id).await?;
            polls += 1;
        }
        Ok(session.id)
    }

    async fn fetch_session(&self, id: u64) -> QuarryResult<Session> {
        let response = send(
            self.client.get(format!("{}/sessions/{}", self.root, id)),
            "Livy session status",
        )
        .await?;
        json_body(response, "Livy session").await
    }

    async fn fetch_statement(&self, session: u64, statement: u64) -> QuarryResult<Statement> {
        let response = send(
            self.client
                .get(format!("{}/sessions/{}/statements/{}", self.root, session, statement)),
            "Livy statement status",
        )
        .await?;
        json_body(response, "Livy statement").await
    }

    async fn run(&self, session: u64, sql: &str, task_id: TaskId) -> QuarryResult<ResultSet> {
        let response = send(
            self.client
                .post(format!("{}/sessions/{}/statements", self.root, session))
                .json(&json!({"code": sql, "kind": "sql"})),
            "Livy statement submit",
        )
        .await?;
        let mut statement: Statement = json_body(response, "Livy statement").await?;
        self.statements.insert(task_id, (session, statement.id)).await;
        debug!(session_id = session, statement_id = statement.id, "Statement submitted");

        let result: QuarryResult<ResultSet> = async {
            while matches!(statement.state.as_str(), "waiting" | "running" | "cancelling") {
                pause(*self.settings.poll_interval_ms()).await;
                statement = self.fetch_statement(session, statement.id).await?;
            }
            decode_statement(statement)
        }
        .await;

        self.statements.remove(task_id).await;
        result
    }
}

fn decode_statement(statement: Statement) -> QuarryResult<ResultSet> {
    if statement.state == "cancelled" {
        return Err(ExecutionError::new(ExecutionErrorKind::Cancelled(format!(
            "Livy statement {}",
            statement.id
        )))
        .into());
    }
    let output = statement.output.ok_or_else(|| {
        ExecutionError::new(ExecutionErrorKind::Protocol(format!(
            "statement {} finished in state {} without output",
            statement.id, statement.state
        )))
    })?;

    if output.status != "ok" {
        return Err(ExecutionError::new(ExecutionErrorKind::Query(format!(
            "{}: {}",
            output.ename.unwrap_or_else(|| "Error".to_string()),
            output.evalue.unwrap_or_default()
        )))
        .into());
    }

    let payload = output
        .data
        .as_ref()
        .and_then(|data| data.get("application/json"))
        .ok_or_else(|| {
            ExecutionError::new(ExecutionErrorKind::Protocol(
                "statement output has no application/json payload".into(),
            ))
        })?;

    let columns: Vec<String> = payload
        .pointer("/schema/fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|f| f.get("name").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let rows = payload
        .get("data")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    let values = row.as_array().cloned().unwrap_or_default();
                    zip_row(&columns, values)
                })
                .collect()
        })
        .unwrap_or_default();

    Ok((columns, rows))
}

#[async_trait]
impl ExecutionBackend for LivyBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Spark
    }

    #[instrument(skip(self), fields(backend = "spark", url = %self.root))]
    async fn connect(&self) -> QuarryResult<()> {
        let mut session = self.session.write().await;
        if let Some(id) = *session {
            if self.fetch_session(id).await.is_ok_and(|s| s.state == "idle") {
                return Ok(());
            }
            warn!(session_id = id, "Livy session lost, opening a new one");
        }
        let id = self.open_session().await.map_err(|e| {
            ConnectionError::new(format!("Could not open Livy session at {}: {}", self.root, e))
        })?;
        *session = Some(id);
        info!(session_id = id, "Connected to Livy");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "spark"))]
    async fn disconnect(&self) {
        if let Some(id) = self.session.write().await.take() {
            let request = self.client.delete(format!("{}/sessions/{}", self.root, id));
            match send(request, "Livy session delete").await {
                Ok(_) => info!(session_id = id, "Livy session closed"),
                Err(e) => warn!(session_id = id, error = %e, "Failed to close Livy session"),
            }
        }
    }

    #[instrument(skip(self, sql, task), fields(backend = "spark", task_id = %task.id()))]
    async fn execute(&self, sql: &str, task: &Task) -> ExecutionOutcome {
        let Some(session) = *self.session.read().await else {
            return not_connected(self.kind(), task);
        };
        let outcome = bounded(self.kind(), task, self.run(session, sql, task.id())).await;
        // A job still tracked here was abandoned by the timeout.
        if self.cancel(task.id()).await {
            warn!(task_id = %task.id(), "Cancelled job abandoned after timeout");
        }
        self.statements.remove(task.id()).await;
        outcome
    }

    async fn execute_count(&self, sql: &str, task: &Task) -> u64 {
        first_count(&self.execute(sql, task).await)
    }

    async fn status(&self) -> BackendStatus {
        let running = self.statements.len().await;
        let base = |connected, health| {
            BackendStatus::new(BackendKind::Spark, connected, health)
                .with_detail("url", self.root.clone())
                .with_detail("running_statements", running)
        };

        let Some(id) = *self.session.read().await else {
            return base(false, HealthStatus::Unhealthy {
                message: "no Livy session".into(),
            });
        };

        match self.fetch_session(id).await {
            Ok(session) => {
                let health = match session.state.as_str() {
                    "idle" | "busy" => HealthStatus::Healthy,
                    "starting" => HealthStatus::Degraded {
                        message: "session starting".into(),
                    },
                    other => HealthStatus::Unhealthy {
                        message: format!("session state {}", other),
                    },
                };
                base(true, health)
                    .with_detail("session_id", id)
                    .with_detail("session_state", session.state)
            }
            Err(e) => base(true, HealthStatus::Unhealthy {
                message: e.to_string(),
            })
            .with_detail("session_id", id),
        }
    }

    #[instrument(skip(self), fields(backend = "spark"))]
    async fn cancel(&self, task_id: TaskId) -> bool {
        let Some((session, statement)) = self.statements.get(task_id).await else {
            return false;
        };
        let request = self.client.post(format!(
            "{}/sessions/{}/statements/{}/cancel",
            self.root, session, statement
        ));
        match send(request, "Livy statement cancel").await {
            Ok(_) => {
                info!(statement_id = statement, "Statement cancelled");
                true
            }
            Err(e) => {
                warn!(error = %e, "Statement cancel failed");
                false
            }
        }
    }
}
