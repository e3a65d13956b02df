//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use quarry::{
    BackendKind, BackendStatus, ConnectionError, ExecutionBackend, ExecutionOutcome, HealthStatus,
    NluDriver, NluError, NluErrorKind, NluRequest, QuarryResult, Row, Task,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Language model that is always unreachable, so compilation uses the
/// rule-based fallback.
pub struct MockNlu;

#[async_trait]
impl NluDriver for MockNlu {
    async fn invoke(&self, _request: &NluRequest) -> QuarryResult<String> {
        Err(NluError::new(NluErrorKind::Request("connection refused".into())).into())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

#[derive(Default)]
struct Recorded {
    executed: Mutex<Vec<String>>,
    counted: Mutex<Vec<String>>,
    disconnects: AtomicUsize,
}

/// Backend returning canned rows, recording every statement.
///
/// Clones share their recordings, so a test can keep one after handing the
/// other to an agent.
#[derive(Clone)]
pub struct MockBackend {
    kind: BackendKind,
    refuse_connect: bool,
    fail_on: Option<String>,
    rows: Vec<Row>,
    count: u64,
    recorded: Arc<Recorded>,
}

impl MockBackend {
    /// Spark backend answering with two province rows and a count of 42.
    pub fn new() -> Self {
        Self {
            kind: BackendKind::Spark,
            refuse_connect: false,
            fail_on: None,
            rows: vec![row("zhejiang", 12), row("hubei", 7)],
            count: 42,
            recorded: Arc::new(Recorded::default()),
        }
    }

    /// Refuse every connection attempt.
    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::new()
        }
    }

    /// Fail any statement containing `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::new()
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.recorded.executed.lock().unwrap().clone()
    }

    pub fn counted(&self) -> Vec<String> {
        self.recorded.counted.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.recorded.disconnects.load(Ordering::SeqCst)
    }
}

pub fn row(province: &str, total: i64) -> Row {
    let mut row = Row::new();
    row.insert("province".into(), json!(province));
    row.insert("total".into(), json!(total));
    row
}

#[async_trait]
impl ExecutionBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn connect(&self) -> QuarryResult<()> {
        if self.refuse_connect {
            return Err(ConnectionError::new("mock backend refused the connection").into());
        }
        Ok(())
    }

    async fn disconnect(&self) {
        self.recorded.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    async fn execute(&self, sql: &str, task: &Task) -> ExecutionOutcome {
        self.recorded.executed.lock().unwrap().push(sql.to_string());
        let task_id = Some(task.id().to_string());
        match &self.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => {
                ExecutionOutcome::failed(task_id, "Table not found", 0.01)
            }
            _ => ExecutionOutcome::completed(
                task_id,
                vec!["province".into(), "total".into()],
                self.rows.clone(),
                0.01,
            ),
        }
    }

    async fn execute_count(&self, sql: &str, _task: &Task) -> u64 {
        self.recorded.counted.lock().unwrap().push(sql.to_string());
        self.count
    }

    async fn status(&self) -> BackendStatus {
        BackendStatus::new(self.kind, true, HealthStatus::Healthy).with_detail("mock", true)
    }
}
