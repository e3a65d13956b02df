//! Tests for task construction and the status state machine.

use quarry_core::{
    AnalyzedQuery, BackendDescriptor, BackendKind, Dialect, Intent, IntentParameters,
    IntentResult, ResourceLimits, SourceCatalog, SqlBundle, Task, TaskConfig, TaskStatus,
    TaskType,
};
use strum::IntoEnumIterator;

fn sample_task() -> anyhow::Result<Task> {
    let intent = IntentResult::new(
        Intent::Statistics,
        0.2,
        IntentParameters::default(),
        "count users",
    );
    let query = AnalyzedQuery::builder()
        .original_query("count users")
        .intent(intent)
        .data_source(SourceCatalog::standard().resolve(None, "count users"))
        .confidence_score(0.4)
        .build()?;
    let sql = SqlBundle::new(
        "SELECT * FROM default.user_info".to_string(),
        "SELECT COUNT(*) AS total_count FROM default.user_info".to_string(),
        "SELECT * FROM default.user_info LIMIT 5".to_string(),
        Dialect::Spark,
        Vec::new(),
    );
    Ok(Task::new(
        TaskConfig::new(TaskType::Query, 1, 3600)?,
        query,
        BackendDescriptor::new(BackendKind::Spark, serde_json::Map::new()),
        ResourceLimits::BASE,
        sql,
    ))
}

#[test]
fn test_new_task_is_pending() -> anyhow::Result<()> {
    let task = sample_task()?;
    assert_eq!(*task.status(), TaskStatus::Pending);
    assert_eq!(*task.config().priority(), 1);
    assert_eq!(*task.config().retry().delay_secs(), 60);
    Ok(())
}

#[test]
fn test_happy_path_transitions() -> anyhow::Result<()> {
    let mut task = sample_task()?;
    task.transition(TaskStatus::Running)?;
    task.transition(TaskStatus::Completed)?;
    assert!(task.status().is_terminal());
    Ok(())
}

#[test]
fn test_terminal_states_reject_every_transition() -> anyhow::Result<()> {
    for terminal in [TaskStatus::Completed, TaskStatus::Failed, TaskStatus::Cancelled] {
        for next in TaskStatus::iter() {
            assert!(
                !terminal.can_transition_to(next),
                "{} -> {} should be rejected",
                terminal,
                next
            );
        }
    }
    let mut task = sample_task()?;
    assert!(task.transition(TaskStatus::Completed).is_err());
    assert_eq!(*task.status(), TaskStatus::Pending);
    Ok(())
}

#[test]
fn test_pending_task_can_be_cancelled() -> anyhow::Result<()> {
    let mut task = sample_task()?;
    task.transition(TaskStatus::Cancelled)?;
    assert!(task.transition(TaskStatus::Running).is_err());
    Ok(())
}

#[test]
fn test_priority_out_of_range_is_rejected() {
    assert!(TaskConfig::new(TaskType::Query, 0, 60).is_err());
    assert!(TaskConfig::new(TaskType::Query, 6, 60).is_err());
    assert!(TaskConfig::new(TaskType::Query, 5, 60).is_ok());
}

#[test]
fn test_task_ids_are_unique() -> anyhow::Result<()> {
    let a = TaskConfig::new(TaskType::Query, 1, 60)?;
    let b = TaskConfig::new(TaskType::Query, 1, 60)?;
    assert_ne!(a.id(), b.id());
    Ok(())
}

#[test]
fn test_task_type_mapping() {
    assert_eq!(TaskType::from_intent(Intent::Aggregation), TaskType::Aggregation);
    assert_eq!(TaskType::from_intent(Intent::Trend), TaskType::Analysis);
    assert_eq!(TaskType::from_intent(Intent::Ranking), TaskType::Query);
    assert_eq!(TaskType::from_intent(Intent::Unknown), TaskType::Query);
}

#[test]
fn test_resources_scale_and_cap() {
    let scaled = ResourceLimits::scaled(5.0);
    assert_eq!(*scaled.memory_gb(), 10.0);
    assert_eq!(*scaled.cores(), 5.0);
    assert_eq!(*scaled.instances(), 4.0);
    assert_eq!(ResourceLimits::scaled(0.5), ResourceLimits::BASE);
}
