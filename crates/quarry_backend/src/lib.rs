//! Execution backends for Quarry.
//!
//! Each backend speaks the REST protocol of one data platform and implements
//! [`quarry_interface::ExecutionBackend`]:
//!
//! - [`LivyBackend`] - Spark SQL through Apache Livy sessions
//! - [`WebHcatBackend`] - Hive jobs through WebHCat, output via WebHDFS
//! - [`ClickHouseBackend`] - ClickHouse HTTP interface
//! - [`TrinoBackend`] - Presto / Trino client protocol
//!
//! [`BackendRegistry`] builds them by kind or by name.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clickhouse;
mod http;
mod livy;
mod registry;
mod trino;
mod webhcat;

pub use clickhouse::ClickHouseBackend;
pub use livy::LivyBackend;
pub use registry::{BackendFactory, BackendRegistry};
pub use trino::TrinoBackend;
pub use webhcat::WebHcatBackend;
