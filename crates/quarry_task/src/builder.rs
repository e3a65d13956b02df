//! Analyzed query to [`Task`].

use crate::cluster::{cluster_settings, cluster_template};
use crate::{CostEstimate, CostModel};
use quarry_core::{
    AnalyzedQuery, BackendDescriptor, BackendKind, BackendSettings, QuarryConfig, RetryPolicy,
    Task, TaskConfig, TaskType,
};
use quarry_error::QuarryResult;
use quarry_sql::SqlGenerator;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Builds executable tasks.
///
/// SQL validation failures abort construction; nothing partially built is
/// returned.
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    generator: SqlGenerator,
    clusters: BTreeMap<BackendKind, Map<String, Value>>,
    retry: RetryPolicy,
}

impl TaskBuilder {
    /// Builder using `generator` and the default cluster templates.
    pub fn new(generator: SqlGenerator) -> Self {
        Self {
            generator,
            clusters: BTreeMap::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Builder with cluster settings for every configured backend.
    pub fn from_config(config: &QuarryConfig, generator: SqlGenerator) -> Self {
        BackendKind::ALL
            .into_iter()
            .fold(Self::new(generator), |builder, kind| {
                builder.with_settings(kind, &config.backend(kind))
            })
    }

    /// Lay `settings` over the template for `kind`.
    pub fn with_settings(mut self, kind: BackendKind, settings: &BackendSettings) -> Self {
        self.clusters.insert(kind, cluster_settings(kind, settings));
        self
    }

    /// Retry policy stored on every task built.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The SQL generator.
    pub fn generator(&self) -> &SqlGenerator {
        &self.generator
    }

    /// Build one task.
    ///
    /// # Errors
    ///
    /// Returns a task error for a priority outside 1..=5, or a SQL error if
    /// generation or validation fails.
    #[instrument(
        skip(self, query),
        fields(backend = %kind, intent = %query.intent().intent())
    )]
    pub fn build(
        &self,
        query: &AnalyzedQuery,
        kind: BackendKind,
        priority: u8,
        timeout_secs: u64,
    ) -> QuarryResult<Task> {
        let task_type = TaskType::from_intent(*query.intent().intent());
        let config = TaskConfig::new(task_type, priority, timeout_secs)?.with_retry(self.retry);
        let sql = self.generator.generate(query, kind.dialect())?;
        let resources = CostModel::resources(query);
        let cluster = self
            .clusters
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| cluster_template(kind));

        let task = Task::new(
            config,
            query.clone(),
            BackendDescriptor::new(kind, cluster),
            resources,
            sql,
        );
        debug!(task_id = %task.id(), task_type = %task_type, "Built task");
        Ok(task)
    }

    /// Build tasks one after another; each failure stays in its own slot.
    pub fn build_batch(
        &self,
        queries: &[AnalyzedQuery],
        kind: BackendKind,
        priority: u8,
        timeout_secs: u64,
    ) -> Vec<QuarryResult<Task>> {
        queries
            .iter()
            .enumerate()
            .map(|(index, query)| {
                let result = self.build(query, kind, priority, timeout_secs);
                if let Err(e) = &result {
                    warn!(index, error = %e, "Batch item failed to build");
                }
                result
            })
            .collect()
    }

    /// Estimate run time for a built task.
    pub fn estimate(&self, task: &Task) -> CostEstimate {
        CostModel::estimate(task)
    }
}
