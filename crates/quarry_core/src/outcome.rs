//! Raw execution results reported by backends.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One result row, keyed by column name in select order.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// What a backend reports after running a statement.
///
/// # Examples
///
/// ```
/// use quarry_core::ExecutionOutcome;
///
/// let outcome = ExecutionOutcome::failed(Some("t-1".into()), "table not found", 0.4);
/// assert!(!*outcome.success());
/// assert!(outcome.rows().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct ExecutionOutcome {
    success: bool,
    error: Option<String>,
    #[serde(rename = "data")]
    rows: Vec<Row>,
    columns: Vec<String>,
    row_count: usize,
    /// Wall-clock seconds
    execution_time: f64,
    task_id: Option<String>,
}

impl ExecutionOutcome {
    /// Successful run. Columns default to the first row's keys when empty.
    pub fn completed(
        task_id: Option<String>,
        columns: Vec<String>,
        rows: Vec<Row>,
        execution_time: f64,
    ) -> Self {
        let columns = if columns.is_empty() {
            rows.first()
                .map(|row| row.keys().cloned().collect())
                .unwrap_or_default()
        } else {
            columns
        };
        Self {
            success: true,
            error: None,
            row_count: rows.len(),
            rows,
            columns,
            execution_time,
            task_id,
        }
    }

    /// Failed run; carries no rows.
    pub fn failed(task_id: Option<String>, error: impl Into<String>, execution_time: f64) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            rows: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
            execution_time,
            task_id,
        }
    }
}
