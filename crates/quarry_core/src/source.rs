//! Data sources and the backends that host them.

use crate::Dialect;
use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Execution backends known to the registry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendKind {
    /// Apache Spark via Livy
    Spark,
    /// Apache Hive via WebHCat
    Hive,
    /// ClickHouse HTTP interface
    ClickHouse,
    /// Presto / Trino REST
    Presto,
}

impl BackendKind {
    /// Every backend, in registry order.
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Spark,
        BackendKind::Hive,
        BackendKind::ClickHouse,
        BackendKind::Presto,
    ];

    /// Relative speed multiplier used by the cost model.
    pub fn cost_factor(self) -> f64 {
        match self {
            BackendKind::Spark => 1.0,
            BackendKind::Hive => 1.5,
            BackendKind::ClickHouse => 0.8,
            BackendKind::Presto => 1.2,
        }
    }

    /// SQL dialect spoken by the backend.
    pub fn dialect(self) -> Dialect {
        match self {
            BackendKind::Spark => Dialect::Spark,
            BackendKind::Hive => Dialect::Hive,
            BackendKind::ClickHouse => Dialect::ClickHouse,
            BackendKind::Presto => Dialect::Presto,
        }
    }
}

fn default_date_column() -> String {
    "date".to_string()
}

fn default_backend() -> BackendKind {
    BackendKind::Hive
}

/// The table a request resolves to.
///
/// # Examples
///
/// ```
/// use quarry_core::{BackendKind, DataSourceRef};
///
/// let source = DataSourceRef::builder()
///     .name("orders")
///     .backend(BackendKind::Hive)
///     .table("order_info")
///     .database("default")
///     .build()
///     .unwrap();
///
/// assert_eq!(source.date_column(), "date");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, Builder)]
#[builder(setter(into))]
pub struct DataSourceRef {
    /// Logical name (e.g. "users")
    name: String,
    /// Backend that hosts the table
    backend: BackendKind,
    /// Table name
    table: String,
    /// Database / schema qualifier
    #[builder(setter(into, strip_option), default)]
    database: Option<String>,
    /// Storage path, for file-backed tables
    #[builder(setter(into, strip_option), default)]
    path: Option<String>,
    /// Column used for time filtering
    #[builder(default = "default_date_column()")]
    date_column: String,
}

impl DataSourceRef {
    /// Create a new builder.
    pub fn builder() -> DataSourceRefBuilder {
        DataSourceRefBuilder::default()
    }
}

/// One catalog entry: a source plus the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct SourceEntry {
    /// Logical name
    name: String,
    /// Lowercase keywords matched as substrings
    keywords: Vec<String>,
    /// Backend that hosts the table
    #[serde(default = "default_backend")]
    backend: BackendKind,
    /// Table name
    table: String,
    /// Database qualifier
    #[serde(default)]
    database: Option<String>,
    /// Storage path
    #[serde(default)]
    path: Option<String>,
    /// Column used for time filtering
    #[serde(default = "default_date_column")]
    date_column: String,
}

impl SourceEntry {
    /// Entry on the `default` Hive database.
    pub fn new(name: &str, keywords: &[&str], table: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            backend: BackendKind::Hive,
            table: table.to_string(),
            database: Some("default".to_string()),
            path: None,
            date_column: default_date_column(),
        }
    }

    /// Whether any keyword occurs in the (lowercased) haystack.
    pub fn matches(&self, haystack: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
    }

    /// The reference this entry resolves to.
    pub fn to_ref(&self) -> DataSourceRef {
        DataSourceRef {
            name: self.name.clone(),
            backend: self.backend,
            table: self.table.clone(),
            database: self.database.clone(),
            path: self.path.clone(),
            date_column: self.date_column.clone(),
        }
    }
}

/// Ordered list of known sources with a fallback.
///
/// Resolution walks entries in order; the first entry whose keywords occur in
/// either the NLU entity text or the raw request wins.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SourceCatalog {
    entries: Vec<SourceEntry>,
    fallback: SourceEntry,
}

impl SourceCatalog {
    /// Build a catalog; `fallback` is used when nothing matches.
    pub fn new(entries: Vec<SourceEntry>, fallback: SourceEntry) -> Self {
        Self { entries, fallback }
    }

    /// Users, orders, products and logs on the `default` database.
    pub fn standard() -> Self {
        let users = SourceEntry::new("users", &["user", "customer", "用户"], "user_info");
        let entries = vec![
            users.clone(),
            SourceEntry::new("orders", &["order", "订单"], "order_info"),
            SourceEntry::new("products", &["product", "商品"], "product_info"),
            SourceEntry::new("logs", &["log", "日志"], "user_logs"),
        ];
        Self::new(entries, users)
    }

    /// Resolve a source from the NLU entity text and the raw request.
    pub fn resolve(&self, entity: Option<&str>, raw_text: &str) -> DataSourceRef {
        let entity = entity.map(str::to_lowercase).unwrap_or_default();
        let raw = raw_text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.matches(&entity) || entry.matches(&raw))
            .unwrap_or(&self.fallback)
            .to_ref()
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
