mod test_utils;

use chrono::NaiveDate;
use quarry_core::{BackendKind, Intent, OutputFormat, SourceCatalog, TimeWindow};
use quarry_nlp::{QueryCompiler, SYSTEM_PROMPT};
use test_utils::MockNlu;

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn compiler(nlu: MockNlu) -> anyhow::Result<QueryCompiler<MockNlu>> {
    Ok(QueryCompiler::new(nlu, SourceCatalog::standard())?.with_reference_date(reference_date()))
}

#[tokio::test]
async fn test_fenced_model_reply_is_used() -> anyhow::Result<()> {
    let reply = r#"Here is the analysis:
```json
{
  "data_entity": "orders",
  "query_type": "statistics",
  "conditions": "paid orders",
  "aggregations": "",
  "time_range": "yesterday",
  "output_requirements": "a csv file",
  "description": "Number of paid orders yesterday"
}
```"#;
    let compiler = compiler(MockNlu::replying(reply))?;

    let query = compiler.compile("How many paid orders yesterday?").await?;

    assert_eq!(compiler.nlu().call_count(), 1);
    assert!(!query.analysis().fallback);
    assert_eq!(query.data_source().name(), "orders");
    assert_eq!(query.description(), "Number of paid orders yesterday");
    assert_eq!(*query.output().format(), OutputFormat::Csv);
    assert_eq!(query.conditions().len(), 1);
    assert_eq!(
        *query.time_window(),
        Some(TimeWindow::single_day(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()))
    );
    Ok(())
}

#[tokio::test]
async fn test_request_carries_prompts_and_sampling() -> anyhow::Result<()> {
    let compiler = compiler(MockNlu::replying("{}"))?.with_sampling(0.2, 512);

    compiler.compile("count users").await?;

    let request = compiler.nlu().last_request().expect("request recorded");
    assert_eq!(request.system_prompt(), SYSTEM_PROMPT);
    assert!(request.user_prompt().contains("Query: count users"));
    assert!(request.user_prompt().contains("Detected intent: statistics"));
    assert_eq!(*request.temperature(), 0.2);
    assert_eq!(*request.max_tokens(), 512);
    Ok(())
}

#[tokio::test]
async fn test_garbage_reply_falls_back() -> anyhow::Result<()> {
    let compiler = compiler(MockNlu::replying("I am not sure what you mean."))?;

    let query = compiler.compile("count users registered yesterday").await?;

    assert!(query.analysis().fallback);
    assert_eq!(query.analysis().query_type.as_deref(), Some("statistics"));
    assert_eq!(query.description(), "statistics query");
    assert_eq!(query.data_source().name(), "users");
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_falls_back() -> anyhow::Result<()> {
    let compiler = compiler(MockNlu::failing())?;

    let query = compiler.compile("统计昨天新用户数量").await?;

    assert!(query.analysis().fallback);
    assert_eq!(*query.intent().intent(), Intent::Statistics);
    assert_eq!(query.data_source().table(), "user_info");
    assert_eq!(*query.data_source().backend(), BackendKind::Hive);
    assert_eq!(query.conditions()[0].field(), "is_new");
    assert_eq!(
        *query.time_window(),
        Some(TimeWindow::single_day(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()))
    );
    Ok(())
}

#[tokio::test]
async fn test_unmatched_source_defaults_to_users() -> anyhow::Result<()> {
    let compiler = compiler(MockNlu::failing())?;

    let query = compiler.compile("xyz123").await?;

    assert_eq!(query.data_source().name(), "users");
    assert_eq!(query.data_source().database().as_deref(), Some("default"));
    assert!(query.conditions().is_empty());
    assert!(query.aggregation().is_none());
    assert!(query.time_window().is_none());
    assert_eq!(*query.confidence_score(), 0.5);
    Ok(())
}

#[tokio::test]
async fn test_model_fields_boost_confidence() -> anyhow::Result<()> {
    let reply = r#"{"data_entity": "users", "conditions": "active", "aggregations": "count"}"#;
    let compiler = compiler(MockNlu::replying(reply))?;

    let query = compiler.compile("xyz123").await?;

    assert!((*query.confidence_score() - 0.9).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn test_model_time_range_fills_in_window() -> anyhow::Result<()> {
    let reply = r#"{"data_entity": "logs", "time_range": "the last 30 days"}"#;
    let compiler = compiler(MockNlu::replying(reply))?;

    let query = compiler.compile("show error events").await?;

    assert_eq!(query.data_source().name(), "logs");
    assert_eq!(*query.time_window(), Some(TimeWindow::Relative { days: 30 }));
    Ok(())
}

#[tokio::test]
async fn test_ranking_with_grouping_sorts_by_aggregate() -> anyhow::Result<()> {
    let compiler = compiler(MockNlu::failing())?;

    let query = compiler
        .compile("Top 5 provinces ranked by total order amount, grouped by province")
        .await?;

    assert_eq!(*query.intent().intent(), Intent::Ranking);
    let aggregation = query.aggregation().as_ref().expect("aggregation");
    assert_eq!(aggregation.group_by(), &vec!["province".to_string()]);
    assert_eq!(query.output().sort_by().as_deref(), Some("total"));
    assert_eq!(*query.output().limit(), Some(5));
    Ok(())
}
