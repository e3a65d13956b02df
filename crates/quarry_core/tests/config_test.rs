//! Tests for layered configuration loading.

use quarry_core::{BackendKind, OutputFormat, QuarryConfig};
use std::io::Write;

#[test]
fn test_bundled_defaults_load() -> anyhow::Result<()> {
    let config = QuarryConfig::load()?;

    assert_eq!(config.nlu().model(), "deepseek-ai/DeepSeek-V3");
    assert_eq!(*config.nlu().max_tokens(), 4000);
    assert_eq!(*config.pipeline().default_backend(), BackendKind::Spark);
    assert_eq!(*config.pipeline().sample_size(), 5);
    assert_eq!(config.sources().len(), 4);
    Ok(())
}

#[test]
fn test_from_file_overrides_and_fills_defaults() -> anyhow::Result<()> {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile()?;
    writeln!(
        file,
        r#"
[pipeline]
default_backend = "clickhouse"
default_format = "csv"

[backends.clickhouse]
url = "http://ch.internal:8123"

[[sources]]
name = "events"
keywords = ["event"]
table = "events"
"#
    )?;

    let config = QuarryConfig::from_file(file.path())?;

    assert_eq!(*config.pipeline().default_backend(), BackendKind::ClickHouse);
    assert_eq!(*config.pipeline().default_format(), OutputFormat::Csv);
    assert_eq!(*config.pipeline().priority(), 1);
    assert_eq!(
        config.backend(BackendKind::ClickHouse).url(),
        "http://ch.internal:8123"
    );
    assert_eq!(
        config.backend(BackendKind::Presto).url(),
        "http://localhost:8080"
    );

    let source = config.catalog().resolve(None, "how many events");
    assert_eq!(source.table(), "events");
    assert_eq!(source.date_column(), "date");
    assert_eq!(*source.backend(), BackendKind::Hive);
    Ok(())
}

#[test]
fn test_missing_file_is_a_configuration_error() {
    let result = QuarryConfig::from_file("/definitely/not/here/quarry.toml");
    assert!(result.is_err());
    let message = result.unwrap_err().to_string();
    assert!(message.contains("Configuration Error"));
}

#[test]
fn test_bundled_file_parses_as_plain_toml() -> anyhow::Result<()> {
    let text = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/../../quarry.toml"))?;
    let value: toml::Value = toml::from_str(&text)?;
    assert!(value.get("nlu").is_some());
    assert!(value.get("sources").is_some());
    Ok(())
}
