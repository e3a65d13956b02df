//! SQL dialects targeted by generation.

use serde::{Deserialize, Serialize};

/// SQL variant emitted by the generator.
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
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Dialect {
    /// HiveQL, the fallback for unknown names
    #[default]
    Hive,
    /// Spark SQL
    Spark,
    /// ClickHouse SQL
    ClickHouse,
    /// Presto / Trino SQL
    Presto,
}

impl Dialect {
    /// Whether `FROM` may carry a `database.table` qualifier.
    pub fn supports_qualified_names(self) -> bool {
        matches!(self, Dialect::Hive | Dialect::Spark)
    }
}
