use chrono::NaiveDate;
use proptest::prelude::*;
use quarry_core::{
    AggregationSpec, AnalyzedQuery, BackendKind, BackendSettings, Intent, IntentParameters,
    IntentResult, Operator, QuarryConfig, QueryCondition, ResourceLimits, SourceCatalog,
    TaskStatus, TaskType, TimeWindow,
};
use quarry_error::{QuarryErrorKind, TaskErrorKind};
use quarry_sql::SqlGenerator;
use quarry_task::{CostModel, TaskBuilder};

fn analyzed(
    intent: Intent,
    table: &str,
    conditions: Vec<QueryCondition>,
    aggregation: Option<AggregationSpec>,
    window: Option<TimeWindow>,
) -> AnalyzedQuery {
    let mut source = SourceCatalog::standard().resolve(Some("users"), "");
    if table != source.table() {
        source = quarry_core::DataSourceRef::builder()
            .name("custom")
            .backend(BackendKind::Hive)
            .table(table)
            .build()
            .unwrap();
    }
    let intent = IntentResult::new(intent, 0.8, IntentParameters::default(), "q");
    let mut builder = AnalyzedQuery::builder();
    builder
        .original_query("q")
        .intent(intent)
        .data_source(source)
        .conditions(conditions)
        .confidence_score(0.8);
    if let Some(aggregation) = aggregation {
        builder.aggregation(aggregation);
    }
    if let Some(window) = window {
        builder.time_window(window);
    }
    builder.build().unwrap()
}

fn simple(intent: Intent) -> AnalyzedQuery {
    analyzed(intent, "user_info", vec![], None, None)
}

fn task_builder() -> TaskBuilder {
    TaskBuilder::new(
        SqlGenerator::new().with_reference_date(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()),
    )
}

#[test]
fn test_build_pending_query_task() -> anyhow::Result<()> {
    let task = task_builder().build(&simple(Intent::Statistics), BackendKind::Hive, 1, 3600)?;

    assert_eq!(*task.status(), TaskStatus::Pending);
    assert_eq!(*task.config().task_type(), TaskType::Query);
    assert_eq!(*task.config().timeout_secs(), 3600);
    assert_eq!(*task.backend().kind(), BackendKind::Hive);
    assert_eq!(task.backend().cluster()["url"], "thrift://localhost:10000");
    assert_eq!(task.sql().sql(), "SELECT * FROM default.user_info");
    assert_eq!(*task.resources(), ResourceLimits::BASE);
    Ok(())
}

#[test]
fn test_task_type_follows_intent() -> anyhow::Result<()> {
    let builder = task_builder();
    for (intent, expected) in [
        (Intent::Trend, TaskType::Analysis),
        (Intent::Aggregation, TaskType::Aggregation),
        (Intent::Ranking, TaskType::Query),
    ] {
        let task = builder.build(&simple(intent), BackendKind::Spark, 3, 60)?;
        assert_eq!(*task.config().task_type(), expected);
    }
    Ok(())
}

#[test]
fn test_ids_are_unique() -> anyhow::Result<()> {
    let builder = task_builder();
    let query = simple(Intent::Statistics);
    let a = builder.build(&query, BackendKind::Spark, 1, 60)?;
    let b = builder.build(&query, BackendKind::Spark, 1, 60)?;
    assert_ne!(a.id(), b.id());
    Ok(())
}

#[test]
fn test_invalid_priority_is_rejected() {
    let err = task_builder()
        .build(&simple(Intent::Statistics), BackendKind::Spark, 0, 60)
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        QuarryErrorKind::Task(e) if e.kind == TaskErrorKind::InvalidPriority(0)
    ));
}

#[test]
fn test_batch_isolates_failures() {
    let queries = vec![
        simple(Intent::Statistics),
        analyzed(Intent::Statistics, "bad table", vec![], None, None),
        simple(Intent::Filter),
    ];

    let results = task_builder().build_batch(&queries, BackendKind::ClickHouse, 1, 60);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1].as_ref().map_err(|e| e.kind()),
        Err(QuarryErrorKind::Sql(_))
    ));
    assert!(results[2].is_ok());
}

#[test]
fn test_config_settings_reach_descriptor() -> anyhow::Result<()> {
    let config = QuarryConfig::default().with_backend(
        BackendKind::Spark,
        BackendSettings::default_for(BackendKind::Spark).with_url("http://livy.internal:8998"),
    );
    let builder = TaskBuilder::from_config(&config, SqlGenerator::new());

    let task = builder.build(&simple(Intent::Statistics), BackendKind::Spark, 1, 60)?;

    let cluster = task.backend().cluster();
    assert_eq!(cluster["endpoint"], "http://livy.internal:8998");
    assert_eq!(cluster["master"], "yarn");
    Ok(())
}

#[test]
fn test_estimate_for_simple_query() -> anyhow::Result<()> {
    let builder = task_builder();

    let spark = builder.build(&simple(Intent::Statistics), BackendKind::Spark, 1, 60)?;
    let estimate = builder.estimate(&spark);
    assert_eq!(*estimate.complexity_factor(), 1.0);
    assert_eq!(*estimate.resource_factor(), 2.0);
    assert_eq!(*estimate.estimated_seconds(), 60.0);
    assert_eq!(*estimate.estimated_minutes(), 1.0);
    assert_eq!(estimate.confidence(), "medium");

    let hive = builder.build(&simple(Intent::Statistics), BackendKind::Hive, 1, 60)?;
    assert_eq!(*builder.estimate(&hive).estimated_seconds(), 90.0);
    Ok(())
}

#[test]
fn test_heavy_query_hits_ceilings() -> anyhow::Result<()> {
    let conditions = (0..4)
        .map(|i| QueryCondition::new(format!("f{}", i), Operator::Gt, i64::from(i)))
        .collect();
    let aggregation = AggregationSpec::new()
        .with_group_by("province")
        .with_group_by("city")
        .with_group_by("date")
        .with_aggregate("count", "count(*)");
    let query = analyzed(
        Intent::Correlation,
        "user_info",
        conditions,
        Some(aggregation),
        Some(TimeWindow::Relative { days: 90 }),
    );

    assert_eq!(CostModel::complexity(&query), 5.0);

    let task = task_builder().build(&query, BackendKind::ClickHouse, 5, 60)?;
    assert_eq!(*task.resources().memory_gb(), 10.0);
    assert_eq!(*task.resources().cores(), 5.0);
    assert_eq!(*task.resources().instances(), 4.0);
    let estimate = CostModel::estimate(&task);
    assert_eq!(*estimate.resource_factor(), 0.25);
    assert!((*estimate.estimated_seconds() - 30.0 * 5.0 * 0.8 * 0.25).abs() < 1e-9);
    Ok(())
}

fn intent_strategy() -> impl Strategy<Value = Intent> {
    prop::sample::select(Intent::PRIORITY.to_vec())
}

proptest! {
    #[test]
    fn complexity_stays_in_range(
        intent in intent_strategy(),
        condition_count in 0usize..8,
        group_count in proptest::option::of(0usize..4),
        days in proptest::option::of(0u32..400),
    ) {
        let conditions = (0..condition_count)
            .map(|i| QueryCondition::new(format!("f{}", i), Operator::Eq, "x"))
            .collect();
        let aggregation = group_count.map(|n| {
            ["province", "city", "date", "region"][..n]
                .iter()
                .fold(AggregationSpec::new().with_aggregate("count", "count(*)"), |spec, g| {
                    spec.with_group_by(*g)
                })
        });
        let window = days.map(|days| TimeWindow::Relative { days });
        let query = analyzed(intent, "user_info", conditions, aggregation, window);

        let complexity = CostModel::complexity(&query);
        prop_assert!((1.0..=5.0).contains(&complexity));

        let resources = CostModel::resources(&query);
        prop_assert!(*resources.memory_gb() <= 16.0);
        prop_assert!(*resources.cores() <= 8.0);
        prop_assert!(*resources.instances() <= 4.0);
    }
}
