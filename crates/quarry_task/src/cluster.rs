//! Per-backend cluster settings attached to task descriptors.

use quarry_core::{BackendKind, BackendSettings};
use serde_json::{Map, Value, json};

/// Default cluster settings for `kind`.
///
/// # Examples
///
/// ```
/// use quarry_core::BackendKind;
/// use quarry_task::cluster_template;
///
/// let spark = cluster_template(BackendKind::Spark);
/// assert_eq!(spark["master"], "yarn");
/// ```
pub fn cluster_template(kind: BackendKind) -> Map<String, Value> {
    let template = match kind {
        BackendKind::Spark => json!({
            "master": "yarn",
            "deploy_mode": "cluster",
            "queue": "default",
        }),
        BackendKind::Hive => json!({
            "url": "thrift://localhost:10000",
            "auth": "PLAIN",
        }),
        BackendKind::ClickHouse => json!({
            "host": "localhost",
            "port": 9000,
            "database": "default",
        }),
        BackendKind::Presto => json!({
            "host": "localhost",
            "port": 8080,
            "catalog": "hive",
            "schema": "default",
        }),
    };
    match template {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Template for `kind` with the configured values laid over it.
///
/// Credentials are never copied into the descriptor.
pub(crate) fn cluster_settings(kind: BackendKind, settings: &BackendSettings) -> Map<String, Value> {
    let mut cluster = cluster_template(kind);
    if !settings.url().is_empty() {
        cluster.insert("endpoint".into(), settings.url().clone().into());
    }
    let overrides = [
        ("user", settings.username()),
        ("database", settings.database()),
        ("catalog", settings.catalog()),
        ("schema", settings.schema()),
        ("queue", settings.queue()),
    ];
    for (key, value) in overrides {
        if let Some(value) = value {
            cluster.insert(key.into(), value.clone().into());
        }
    }
    cluster
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_template() {
        for kind in BackendKind::ALL {
            assert!(!cluster_template(kind).is_empty(), "{}", kind);
        }
    }

    #[test]
    fn test_settings_override_template() {
        let settings = BackendSettings::default_for(BackendKind::Presto).with_url("http://trino:8080");
        let cluster = cluster_settings(BackendKind::Presto, &settings);
        assert_eq!(cluster["endpoint"], "http://trino:8080");
        assert_eq!(cluster["user"], "quarry");
        assert_eq!(cluster["catalog"], "hive");
        assert_eq!(cluster["port"], 8080);
        assert!(!cluster.contains_key("password"));
    }
}
