//! Heuristic complexity, resource and run-time estimates.

use derive_getters::Getters;
use quarry_core::{AnalyzedQuery, ResourceLimits, Task, TimeWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Seconds a query of complexity 1 takes on the reference backend.
const BASE_SECONDS: f64 = 30.0;
const MIN_COMPLEXITY: f64 = 1.0;
const MAX_COMPLEXITY: f64 = 5.0;
const MIN_RESOURCE_FACTOR: f64 = 0.25;
const MAX_RESOURCE_FACTOR: f64 = 2.0;

/// Estimated cost of running a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
pub struct CostEstimate {
    estimated_seconds: f64,
    estimated_minutes: f64,
    complexity_factor: f64,
    backend_factor: f64,
    resource_factor: f64,
    /// How far to trust the number; always "medium" for the heuristic model
    confidence: String,
}

/// Scores queries and estimates task run time.
///
/// # Examples
///
/// ```
/// use quarry_core::ResourceLimits;
/// use quarry_task::CostModel;
///
/// // One core and 2 GB is below the reference allocation
/// assert_eq!(CostModel::resource_factor(&ResourceLimits::BASE), 2.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CostModel;

impl CostModel {
    /// Multiplicative complexity in [1, 5].
    pub fn complexity(query: &AnalyzedQuery) -> f64 {
        let mut factor = 1.0;

        if query.conditions().len() > 3 {
            factor *= 1.5;
        }
        if let Some(aggregation) = query.aggregation() {
            factor *= 2.0;
            if aggregation.group_by().len() > 2 {
                factor *= 1.5;
            }
        }
        if let Some(TimeWindow::Relative { days }) = query.time_window()
            && *days > 30
        {
            factor *= 1.2;
        }
        if query.intent().intent().is_analytical() {
            factor *= 1.5;
        }

        f64::clamp(factor, MIN_COMPLEXITY, MAX_COMPLEXITY)
    }

    /// Resources for a query, scaled by its complexity.
    pub fn resources(query: &AnalyzedQuery) -> ResourceLimits {
        ResourceLimits::scaled(Self::complexity(query))
    }

    /// Speed-up (below 1) or slow-down (above 1) from the allocation.
    pub fn resource_factor(resources: &ResourceLimits) -> f64 {
        let capacity = resources.cores() * resources.memory_gb();
        if capacity <= 0.0 {
            return MAX_RESOURCE_FACTOR;
        }
        f64::clamp(4.0 / capacity, MIN_RESOURCE_FACTOR, MAX_RESOURCE_FACTOR)
    }

    /// Estimate run time for a built task.
    #[instrument(skip(task), fields(task_id = %task.id(), backend = %task.backend().kind()))]
    pub fn estimate(task: &Task) -> CostEstimate {
        let complexity_factor = Self::complexity(task.query());
        let backend_factor = task.backend().kind().cost_factor();
        let resource_factor = Self::resource_factor(task.resources());
        let estimated_seconds = BASE_SECONDS * complexity_factor * backend_factor * resource_factor;

        debug!(estimated_seconds, complexity_factor, "Estimated task cost");

        CostEstimate {
            estimated_seconds,
            estimated_minutes: estimated_seconds / 60.0,
            complexity_factor,
            backend_factor,
            resource_factor,
            confidence: "medium".to_string(),
        }
    }
}
