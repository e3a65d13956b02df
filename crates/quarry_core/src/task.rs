//! Executable task descriptors and their lifecycle.

use crate::{AnalyzedQuery, BackendKind, Dialect, Intent};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use quarry_error::{QuarryResult, TaskError, TaskErrorKind};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Unique task identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of work a task performs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskType {
    /// Plain retrieval
    Query,
    /// Multi-pass analytical work
    Analysis,
    /// Grouped aggregation
    Aggregation,
}

impl TaskType {
    /// Task type implied by an intent.
    pub fn from_intent(intent: Intent) -> Self {
        match intent {
            Intent::Statistics | Intent::Filter | Intent::Ranking | Intent::Unknown => {
                TaskType::Query
            }
            Intent::Analysis
            | Intent::Trend
            | Intent::Comparison
            | Intent::Distribution
            | Intent::Correlation => TaskType::Analysis,
            Intent::Aggregation => TaskType::Aggregation,
        }
    }
}

/// Lifecycle state of a task.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    /// Built, not yet dispatched
    #[default]
    Pending,
    /// Handed to a backend
    Running,
    /// Finished with rows
    Completed,
    /// Finished with an error
    Failed,
    /// Stopped on request
    Cancelled,
}

impl TaskStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Retry settings carried with a task. Enforced by whoever dispatches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RetryPolicy {
    max_retries: u32,
    delay_secs: u64,
}

impl RetryPolicy {
    /// Policy with the given attempt count and delay.
    pub fn new(max_retries: u32, delay_secs: u64) -> Self {
        Self {
            max_retries,
            delay_secs,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0, 60)
    }
}

/// Execution metadata for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct TaskConfig {
    id: TaskId,
    task_type: TaskType,
    /// 1 (lowest) to 5 (highest)
    priority: u8,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl TaskConfig {
    /// Default priority.
    pub const DEFAULT_PRIORITY: u8 = 1;
    /// Default timeout, one hour.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 3600;

    /// New config with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if `priority` is outside 1..=5.
    pub fn new(task_type: TaskType, priority: u8, timeout_secs: u64) -> QuarryResult<Self> {
        if !(1..=5).contains(&priority) {
            return Err(TaskError::new(TaskErrorKind::InvalidPriority(priority)).into());
        }
        Ok(Self {
            id: TaskId::new(),
            task_type,
            priority,
            timeout_secs,
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Resources requested for a task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Getters)]
pub struct ResourceLimits {
    memory_gb: f64,
    cores: f64,
    instances: f64,
}

impl ResourceLimits {
    /// Allocation for the simplest query.
    pub const BASE: ResourceLimits = ResourceLimits {
        memory_gb: 2.0,
        cores: 1.0,
        instances: 1.0,
    };

    /// Largest allocation ever requested.
    pub const CEILING: ResourceLimits = ResourceLimits {
        memory_gb: 16.0,
        cores: 8.0,
        instances: 4.0,
    };

    /// Base allocation multiplied by `factor`, each dimension capped.
    pub fn scaled(factor: f64) -> Self {
        let factor = factor.max(1.0);
        Self {
            memory_gb: (Self::BASE.memory_gb * factor).min(Self::CEILING.memory_gb),
            cores: (Self::BASE.cores * factor).min(Self::CEILING.cores),
            instances: (Self::BASE.instances * factor).min(Self::CEILING.instances),
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::BASE
    }
}

/// Statements generated for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SqlBundle {
    /// The user-facing statement
    sql: String,
    /// `COUNT(*)` over the same source and filters
    count_sql: String,
    /// Small preview over the same source and filters
    sample_sql: String,
    dialect: Dialect,
    /// Non-fatal validation findings
    warnings: Vec<String>,
}

impl SqlBundle {
    /// Bundle the three statements.
    pub fn new(
        sql: String,
        count_sql: String,
        sample_sql: String,
        dialect: Dialect,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            sql,
            count_sql,
            sample_sql,
            dialect,
            warnings,
        }
    }
}

/// Which backend runs a task and how its cluster is addressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct BackendDescriptor {
    kind: BackendKind,
    cluster: serde_json::Map<String, serde_json::Value>,
}

impl BackendDescriptor {
    /// Descriptor for `kind` with the given cluster settings.
    pub fn new(kind: BackendKind, cluster: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { kind, cluster }
    }
}

/// An executable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct Task {
    config: TaskConfig,
    query: AnalyzedQuery,
    backend: BackendDescriptor,
    resources: ResourceLimits,
    sql: SqlBundle,
    created_at: DateTime<Utc>,
    status: TaskStatus,
}

impl Task {
    /// A pending task created now.
    pub fn new(
        config: TaskConfig,
        query: AnalyzedQuery,
        backend: BackendDescriptor,
        resources: ResourceLimits,
        sql: SqlBundle,
    ) -> Self {
        Self {
            config,
            query,
            backend,
            resources,
            sql,
            created_at: Utc::now(),
            status: TaskStatus::Pending,
        }
    }

    /// Shorthand for the task id.
    pub fn id(&self) -> TaskId {
        self.config.id
    }

    /// Move to `next`, rejecting transitions outside the table.
    ///
    /// # Errors
    ///
    /// Returns a task error when the transition is not allowed.
    pub fn transition(&mut self, next: TaskStatus) -> QuarryResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(TaskError::new(TaskErrorKind::InvalidTransition {
                task_id: self.id().to_string(),
                from: self.status.to_string(),
                to: next.to_string(),
            })
            .into());
        }
        debug!(task_id = %self.id(), from = %self.status, to = %next, "Task status change");
        self.status = next;
        Ok(())
    }
}
