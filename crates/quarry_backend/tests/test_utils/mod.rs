//! Shared fixtures for backend tests.

#![allow(dead_code)]

use quarry_core::{
    AnalyzedQuery, BackendDescriptor, BackendKind, BackendSettings, Dialect, Intent,
    IntentParameters, IntentResult, ResourceLimits, SourceCatalog, SqlBundle, Task, TaskConfig,
    TaskType,
};
use serde_json::{Value, json};

/// Settings for a mock server, polling every millisecond.
pub fn settings(url: &str) -> BackendSettings {
    settings_with(json!({"url": url, "poll_interval_ms": 1}))
}

/// Settings from a JSON object (unlisted fields take their defaults).
pub fn settings_with(value: Value) -> BackendSettings {
    serde_json::from_value(value).unwrap()
}

/// A pending task for `kind` with the given timeout.
pub fn task_with_timeout(kind: BackendKind, timeout_secs: u64) -> Task {
    let mut builder = AnalyzedQuery::builder();
    builder
        .original_query("total orders by province")
        .intent(IntentResult::new(
            Intent::Aggregation,
            0.7,
            IntentParameters::default(),
            "total orders by province",
        ))
        .data_source(SourceCatalog::standard().resolve(None, "orders"))
        .confidence_score(0.7);
    let query = builder.build().unwrap();

    let sql = "SELECT province, COUNT(*) AS total FROM order_info GROUP BY province";
    Task::new(
        TaskConfig::new(TaskType::Aggregation, 1, timeout_secs).unwrap(),
        query,
        BackendDescriptor::new(kind, serde_json::Map::new()),
        ResourceLimits::BASE,
        SqlBundle::new(
            sql.to_string(),
            "SELECT COUNT(*) AS total_count FROM order_info".to_string(),
            format!("{} LIMIT 5", sql),
            Dialect::Hive,
            Vec::new(),
        ),
    )
}

/// A pending task for `kind` with a generous timeout.
pub fn task(kind: BackendKind) -> Task {
    task_with_timeout(kind, 30)
}
