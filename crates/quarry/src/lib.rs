//! Quarry - natural-language analytics compiled to SQL
//!
//! Quarry turns free-text analytic requests ("top 10 provinces by order
//! amount last month") into validated SQL for Spark, Hive, ClickHouse or
//! Presto, runs it on the chosen backend and reshapes the rows as JSON, CSV,
//! a display table or a chart specification.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quarry::{Agent, BackendRegistry, NluClient, QuarryConfig, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = QuarryConfig::load()?;
//!     let agent = Agent::from_config(&config, NluClient::offline(), &BackendRegistry::standard(), None)?;
//!     agent.connect().await?;
//!
//!     let envelope = agent
//!         .query("count active users by province", None, &QueryOptions::default())
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&envelope)?);
//!     Ok(())
//! }
//! ```
//!
//! # Cargo Features
//!
//! - `observability` - OpenTelemetry span export to stdout
//!
//! # Architecture
//!
//! - `quarry_error` - Error types
//! - `quarry_core` - Query IR, tasks, outcomes and configuration
//! - `quarry_interface` - `NluDriver` and `ExecutionBackend` traits
//! - `quarry_models` - Language-model clients
//! - `quarry_nlp` - Intent classification and query compilation
//! - `quarry_sql` - Multi-dialect SQL generation and validation
//! - `quarry_task` - Task construction and cost model
//! - `quarry_result` - Formatting, pagination and export
//! - `quarry_backend` - Livy, WebHCat, ClickHouse and Trino backends
//!
//! This crate adds the [`Agent`] facade and re-exports the rest.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod agent;

pub use agent::{Agent, AgentStatus, CostReport, QueryOptions};

pub use quarry_backend::*;
pub use quarry_core::*;
pub use quarry_error::*;
pub use quarry_interface::*;
pub use quarry_models::{NluClient, OfflineNlu, OpenAiCompatibleClient};
pub use quarry_nlp::{IntentClassifier, QueryCompiler};
pub use quarry_result::*;
pub use quarry_sql::{SqlGenerator, SqlValidation, validate_sql};
pub use quarry_task::{CostEstimate, CostModel, TaskBuilder};

#[cfg(feature = "observability")]
pub mod observability;
