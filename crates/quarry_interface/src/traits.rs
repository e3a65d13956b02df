//! Collaborator traits.

use crate::BackendStatus;
use async_trait::async_trait;
use quarry_core::{BackendKind, ExecutionOutcome, NluRequest, Task, TaskId};
use quarry_error::QuarryResult;

/// A language model that answers one prompt pair with text.
#[async_trait]
pub trait NluDriver: Send + Sync {
    /// Send the prompts and return the completion text.
    async fn invoke(&self, request: &NluRequest) -> QuarryResult<String>;

    /// Provider name (e.g., "siliconflow", "offline").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "deepseek-ai/DeepSeek-V3").
    fn model_name(&self) -> &str;
}

/// A data platform that runs generated SQL.
///
/// Query failures are reported inside [`ExecutionOutcome`], never as errors;
/// only connection setup returns an error.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Open (or verify) the connection.
    async fn connect(&self) -> QuarryResult<()>;

    /// Release server-side resources. Safe to call when not connected.
    async fn disconnect(&self);

    /// Run `sql` on behalf of `task`.
    async fn execute(&self, sql: &str, task: &Task) -> ExecutionOutcome;

    /// Run a `COUNT(*)` statement and return the first cell, or 0 on failure.
    async fn execute_count(&self, sql: &str, task: &Task) -> u64;

    /// Connection and health details.
    async fn status(&self) -> BackendStatus;

    /// Best-effort cancellation. Returns whether a running job was signalled.
    async fn cancel(&self, _task_id: TaskId) -> bool {
        false
    }
}
