//! Core data types for the Quarry query-compilation pipeline.
//!
//! This crate holds the intermediate representation shared by every stage:
//! intent classification results, the analyzed query, executable tasks,
//! raw execution outcomes, and the layered configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dialect;
mod intent;
mod nlu;
mod outcome;
mod query;
mod source;
mod task;

pub use config::{BackendSettings, NluConfig, PipelineConfig, QuarryConfig};
pub use dialect::Dialect;
pub use intent::{Entity, Intent, IntentParameters, IntentResult};
pub use nlu::{NluAnalysis, NluRequest, NluRequestBuilder};
pub use outcome::{ExecutionOutcome, Row};
pub use query::{
    Aggregate, AggregationSpec, AnalyzedQuery, AnalyzedQueryBuilder, ConditionValue, Literal,
    LogicalOp, Operator, OutputFormat, OutputSpec, QueryCondition, SortDirection, TimeWindow,
};
pub use source::{BackendKind, DataSourceRef, DataSourceRefBuilder, SourceCatalog, SourceEntry};
pub use task::{
    BackendDescriptor, ResourceLimits, RetryPolicy, SqlBundle, Task, TaskConfig, TaskId,
    TaskStatus, TaskType,
};
