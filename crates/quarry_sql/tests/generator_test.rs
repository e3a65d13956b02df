use chrono::NaiveDate;
use proptest::prelude::*;
use quarry_core::{
    AggregationSpec, AnalyzedQuery, BackendKind, ConditionValue, DataSourceRef, Dialect, Intent,
    IntentParameters, IntentResult, LogicalOp, Operator, OutputSpec, QueryCondition, TimeWindow,
};
use quarry_error::{QuarryErrorKind, SqlErrorKind};
use quarry_sql::SqlGenerator;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn generator() -> SqlGenerator {
    SqlGenerator::new().with_reference_date(today())
}

fn source(table: &str, database: Option<&str>) -> DataSourceRef {
    let mut builder = DataSourceRef::builder();
    builder.name("users").backend(BackendKind::Hive).table(table);
    if let Some(database) = database {
        builder.database(database);
    }
    builder.build().unwrap()
}

fn query(
    source: DataSourceRef,
    conditions: Vec<QueryCondition>,
    aggregation: Option<AggregationSpec>,
    window: Option<TimeWindow>,
    output: OutputSpec,
) -> AnalyzedQuery {
    let intent = IntentResult::new(Intent::Statistics, 0.5, IntentParameters::default(), "q");
    let mut builder = AnalyzedQuery::builder();
    builder
        .original_query("q")
        .intent(intent)
        .data_source(source)
        .conditions(conditions)
        .output(output)
        .confidence_score(0.5);
    if let Some(aggregation) = aggregation {
        builder.aggregation(aggregation);
    }
    if let Some(window) = window {
        builder.time_window(window);
    }
    builder.build().unwrap()
}

fn yesterday_users() -> AnalyzedQuery {
    query(
        source("user_info", Some("default")),
        vec![],
        None,
        Some(TimeWindow::single_day(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap())),
        OutputSpec::default(),
    )
}

#[test]
fn test_single_day_on_hive() -> anyhow::Result<()> {
    let bundle = generator().generate(&yesterday_users(), Dialect::Hive)?;

    assert_eq!(bundle.sql(), "SELECT * FROM default.user_info WHERE date = '2024-06-14'");
    assert_eq!(
        bundle.count_sql(),
        "SELECT COUNT(*) AS total_count FROM default.user_info WHERE date = '2024-06-14'"
    );
    assert_eq!(
        bundle.sample_sql(),
        "SELECT * FROM default.user_info WHERE date = '2024-06-14' LIMIT 5"
    );
    assert_eq!(*bundle.dialect(), Dialect::Hive);
    assert!(bundle.warnings().is_empty());
    Ok(())
}

#[test]
fn test_qualified_names_only_where_supported() -> anyhow::Result<()> {
    let query = yesterday_users();
    for (dialect, from) in [
        (Dialect::Spark, "FROM default.user_info"),
        (Dialect::ClickHouse, "FROM user_info WHERE"),
        (Dialect::Presto, "FROM user_info WHERE"),
    ] {
        let bundle = generator().generate(&query, dialect)?;
        assert!(bundle.sql().contains(from), "{}: {}", dialect, bundle.sql());
    }
    Ok(())
}

#[test]
fn test_grouped_ranking() -> anyhow::Result<()> {
    let aggregation = AggregationSpec::new()
        .with_group_by("province")
        .with_aggregate("total", "sum(amount)");
    let output = OutputSpec::default().with_sort_by("total").with_limit(10);
    let query = query(
        source("order_info", Some("default")),
        vec![QueryCondition::new("status", Operator::Eq, "paid")],
        Some(aggregation),
        Some(TimeWindow::Relative { days: 7 }),
        output,
    );

    let bundle = generator().generate(&query, Dialect::Spark)?;

    assert_eq!(
        bundle.sql(),
        "SELECT sum(amount) as total, province FROM default.order_info \
         WHERE status = 'paid' AND date >= '2024-06-08' AND date <= '2024-06-15' \
         GROUP BY province ORDER BY total DESC LIMIT 10"
    );
    assert_eq!(
        bundle.count_sql(),
        "SELECT COUNT(*) AS total_count FROM default.order_info \
         WHERE status = 'paid' AND date >= '2024-06-08' AND date <= '2024-06-15'"
    );
    assert!(bundle.sample_sql().ends_with("GROUP BY province LIMIT 5"));
    Ok(())
}

#[test]
fn test_or_conditions_bind_before_time_filter() -> anyhow::Result<()> {
    let conditions = vec![
        QueryCondition::new("level", Operator::Eq, "vip"),
        QueryCondition::new("is_new", Operator::Eq, 1_i64).with_join(LogicalOp::Or),
    ];
    let query = query(
        source("user_info", None),
        conditions,
        None,
        Some(TimeWindow::Absolute { start: Some(today()), end: None }),
        OutputSpec::default(),
    );

    let bundle = generator().generate(&query, Dialect::Hive)?;

    assert_eq!(
        bundle.sql(),
        "SELECT * FROM user_info WHERE (level = 'vip' OR is_new = 1) AND date >= '2024-06-15'"
    );
    Ok(())
}

#[test]
fn test_text_literals_are_escaped() -> anyhow::Result<()> {
    let query = query(
        source("user_info", Some("default")),
        vec![QueryCondition::new("name", Operator::Eq, "O'Brien (jr")],
        None,
        None,
        OutputSpec::default(),
    );

    let bundle = generator().generate(&query, Dialect::Presto)?;

    assert_eq!(bundle.sql(), "SELECT * FROM user_info WHERE name = 'O''Brien (jr'");
    assert!(bundle.warnings().is_empty());
    Ok(())
}

#[test]
fn test_invalid_table_is_rejected() {
    let query = query(
        source("user_info; DROP TABLE x", None),
        vec![],
        None,
        None,
        OutputSpec::default(),
    );

    let err = generator().generate(&query, Dialect::Hive).unwrap_err();

    assert!(matches!(
        err.kind(),
        QuarryErrorKind::Sql(e) if matches!(e.kind, SqlErrorKind::InvalidIdentifier { .. })
    ));
}

#[test]
fn test_unbalanced_function_fails_validation() {
    let aggregation = AggregationSpec::new().with_aggregate("n", "count(*");
    let query = query(
        source("user_info", None),
        vec![],
        Some(aggregation),
        None,
        OutputSpec::default(),
    );

    let err = generator().generate(&query, Dialect::Hive).unwrap_err();

    assert!(matches!(
        err.kind(),
        QuarryErrorKind::Sql(e) if matches!(e.kind, SqlErrorKind::Validation(_))
    ));
}

#[test]
fn test_unknown_dialect_downgrades_with_warning() -> anyhow::Result<()> {
    let bundle = generator().generate_named(&yesterday_users(), "oracle")?;

    assert_eq!(*bundle.dialect(), Dialect::Hive);
    assert!(bundle.sql().contains("default.user_info"));
    assert!(bundle.warnings()[0].contains("oracle"));

    let bundle = generator().generate_named(&yesterday_users(), "SPARK")?;
    assert_eq!(*bundle.dialect(), Dialect::Spark);
    assert!(bundle.warnings().is_empty());
    Ok(())
}

#[test]
fn test_sample_size_is_configurable() -> anyhow::Result<()> {
    let bundle = generator()
        .with_sample_size(20)
        .generate(&yesterday_users(), Dialect::Hive)?;
    assert!(bundle.sample_sql().ends_with("LIMIT 20"));
    Ok(())
}

fn balanced_outside_literals(sql: &str) -> bool {
    let mut depth = 0i32;
    let mut quoted = false;
    for ch in sql.chars() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && !quoted
}

fn condition_strategy() -> impl Strategy<Value = QueryCondition> {
    (
        prop::sample::select(vec!["status", "level", "amount", "city"]),
        0usize..8,
        "[a-z'() ]{0,8}",
        -1000i64..1000,
        any::<bool>(),
    )
        .prop_map(|(field, op, text, n, or)| {
            let (operator, value) = match op {
                0 => (Operator::Eq, ConditionValue::from(text)),
                1 => (Operator::Gt, ConditionValue::from(n)),
                2 => (Operator::Lt, ConditionValue::from(n)),
                3 => (Operator::Ge, ConditionValue::from(n as f64 / 4.0)),
                4 => (Operator::Le, ConditionValue::from(n)),
                5 => (Operator::Like, ConditionValue::from(format!("%{}%", text))),
                6 => (
                    Operator::In,
                    ConditionValue::List(vec![text.clone().into(), n.into()]),
                ),
                _ => (
                    Operator::Between,
                    ConditionValue::Range { low: n.into(), high: (n + 10).into() },
                ),
            };
            let join = if or { LogicalOp::Or } else { LogicalOp::And };
            QueryCondition::new(field, operator, value).with_join(join)
        })
}

fn aggregation_strategy() -> impl Strategy<Value = Option<AggregationSpec>> {
    proptest::option::of(
        (
            prop::sample::subsequence(vec!["province", "city", "date"], 0..=3),
            prop::sample::subsequence(
                vec![
                    ("count", "count(*)"),
                    ("total", "sum(amount)"),
                    ("avg_amount", "avg(amount)"),
                ],
                1..=3,
            ),
        )
            .prop_map(|(groups, aggregates)| {
                let spec = groups
                    .into_iter()
                    .fold(AggregationSpec::new(), |spec, g| spec.with_group_by(g));
                aggregates
                    .into_iter()
                    .fold(spec, |spec, (alias, f)| spec.with_aggregate(alias, f))
            }),
    )
}

fn window_strategy() -> impl Strategy<Value = Option<TimeWindow>> {
    let day = (0i64..400).prop_map(|offset| today() - chrono::Duration::days(offset));
    proptest::option::of(prop_oneof![
        (1u32..400).prop_map(|days| TimeWindow::Relative { days }),
        (proptest::option::of(day.clone()), proptest::option::of(day))
            .prop_map(|(start, end)| TimeWindow::Absolute { start, end }),
    ])
}

proptest! {
    #[test]
    fn every_generated_statement_is_structurally_sound(
        dialect in prop::sample::select(vec![
            Dialect::Hive,
            Dialect::Spark,
            Dialect::ClickHouse,
            Dialect::Presto,
        ]),
        database in proptest::option::of(Just("default")),
        conditions in proptest::collection::vec(condition_strategy(), 0..5),
        aggregation in aggregation_strategy(),
        window in window_strategy(),
        limit in proptest::option::of(0u64..1000),
        sort in proptest::option::of(prop::sample::select(vec!["count", "date", "amount"])),
    ) {
        let mut output = OutputSpec::default();
        if let Some(limit) = limit {
            output = output.with_limit(limit);
        }
        if let Some(sort) = sort {
            output = output.with_sort_by(sort);
        }
        let query = query(source("order_info", database), conditions, aggregation, window, output);

        let bundle = generator().generate(&query, dialect).unwrap();

        for sql in [bundle.sql(), bundle.count_sql(), bundle.sample_sql()] {
            prop_assert!(sql.starts_with("SELECT"), "{}", sql);
            prop_assert!(sql.contains("FROM"), "{}", sql);
            prop_assert!(balanced_outside_literals(sql), "{}", sql);
        }
        prop_assert!(bundle.warnings().is_empty());
    }
}
