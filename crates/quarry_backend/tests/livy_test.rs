//! Livy backend against a mock server.

mod test_utils;

use mockito::Matcher;
use quarry_backend::LivyBackend;
use quarry_core::BackendKind;
use quarry_error::QuarryErrorKind;
use quarry_interface::{ExecutionBackend, HealthStatus};
use serde_json::json;
use test_utils::{settings, task, task_with_timeout};

async fn connected(server: &mut mockito::ServerGuard) -> anyhow::Result<LivyBackend> {
    server
        .mock("POST", "/sessions")
        .match_body(Matcher::PartialJson(json!({"kind": "sql"})))
        .with_status(201)
        .with_body(r#"{"id": 3, "state": "idle"}"#)
        .create_async()
        .await;
    let backend = LivyBackend::new(settings(&server.url()))?;
    backend.connect().await?;
    Ok(backend)
}

#[tokio::test]
async fn test_execute_decodes_statement_output() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;

    let submit = server
        .mock("POST", "/sessions/3/statements")
        .match_body(Matcher::PartialJson(json!({"kind": "sql", "code": "SELECT 1"})))
        .with_status(201)
        .with_body(r#"{"id": 0, "state": "waiting"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/sessions/3/statements/0")
        .with_body(
            json!({
                "id": 0,
                "state": "available",
                "output": {
                    "status": "ok",
                    "execution_count": 0,
                    "data": {"application/json": {
                        "schema": {"type": "struct", "fields": [
                            {"name": "province", "type": "string"},
                            {"name": "total", "type": "long"}
                        ]},
                        "data": [["zhejiang", 12], ["hubei", 7]]
                    }}
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let task = task(BackendKind::Spark);
    let outcome = backend.execute("SELECT 1", &task).await;

    assert!(*outcome.success(), "{:?}", outcome.error());
    assert_eq!(outcome.columns(), &vec!["province".to_string(), "total".to_string()]);
    assert_eq!(*outcome.row_count(), 2);
    assert_eq!(outcome.rows()[0]["province"], "zhejiang");
    assert_eq!(outcome.rows()[1]["total"], 7);
    assert_eq!(outcome.task_id().as_deref(), Some(task.id().to_string().as_str()));
    submit.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_statement_error_becomes_failed_outcome() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;

    server
        .mock("POST", "/sessions/3/statements")
        .with_status(201)
        .with_body(r#"{"id": 1, "state": "running"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/sessions/3/statements/1")
        .with_body(
            r#"{"id": 1, "state": "available", "output": {"status": "error", "ename": "AnalysisException", "evalue": "Table or view not found: order_info"}}"#,
        )
        .create_async()
        .await;

    let outcome = backend.execute("SELECT * FROM order_info", &task(BackendKind::Spark)).await;

    assert!(!*outcome.success());
    assert!(outcome.rows().is_empty());
    let error = outcome.error().clone().unwrap_or_default();
    assert!(error.contains("Table or view not found"), "{}", error);
    Ok(())
}

#[tokio::test]
async fn test_execute_count_reads_first_cell() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;

    server
        .mock("POST", "/sessions/3/statements")
        .with_status(201)
        .with_body(r#"{"id": 2, "state": "available", "output": {"status": "ok", "data": {"application/json": {"schema": {"fields": [{"name": "total_count"}]}, "data": [[257]]}}}}"#)
        .create_async()
        .await;

    let count = backend
        .execute_count("SELECT COUNT(*) AS total_count FROM order_info", &task(BackendKind::Spark))
        .await;
    assert_eq!(count, 257);
    Ok(())
}

#[tokio::test]
async fn test_execute_before_connect_fails() -> anyhow::Result<()> {
    let server = mockito::Server::new_async().await;
    let backend = LivyBackend::new(settings(&server.url()))?;

    let outcome = backend.execute("SELECT 1", &task(BackendKind::Spark)).await;
    assert!(!*outcome.success());
    assert_eq!(outcome.error().as_deref(), Some("spark backend is not connected"));
    assert_eq!(backend.execute_count("SELECT 1", &task(BackendKind::Spark)).await, 0);
    Ok(())
}

#[tokio::test]
async fn test_dead_session_is_a_connection_error() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/sessions")
        .with_status(201)
        .with_body(r#"{"id": 9, "state": "dead"}"#)
        .create_async()
        .await;
    let backend = LivyBackend::new(settings(&server.url()))?;

    let err = backend.connect().await.unwrap_err();
    assert!(matches!(err.kind(), QuarryErrorKind::Connection(_)));
    assert!(!*backend.status().await.connected());
    Ok(())
}

#[tokio::test]
async fn test_slow_statement_hits_task_timeout() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;

    server
        .mock("POST", "/sessions/3/statements")
        .with_status(201)
        .with_body(r#"{"id": 4, "state": "running"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/sessions/3/statements/4")
        .with_body(r#"{"id": 4, "state": "running"}"#)
        .expect_at_least(1)
        .create_async()
        .await;

    let outcome = backend
        .execute("SELECT 1", &task_with_timeout(BackendKind::Spark, 1))
        .await;

    assert!(!*outcome.success());
    assert_eq!(outcome.error().as_deref(), Some("Timed out after 1 seconds"));
    assert!(*outcome.execution_time() >= 1.0);
    Ok(())
}

#[tokio::test]
async fn test_status_and_disconnect() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;

    server
        .mock("GET", "/sessions/3")
        .with_body(r#"{"id": 3, "state": "idle"}"#)
        .create_async()
        .await;
    let status = backend.status().await;
    assert!(*status.connected());
    assert_eq!(status.health(), &HealthStatus::Healthy);
    assert_eq!(status.details()["session_id"], 3);

    let delete = server
        .mock("DELETE", "/sessions/3")
        .with_body(r#"{"msg": "deleted"}"#)
        .expect(1)
        .create_async()
        .await;
    backend.disconnect().await;
    backend.disconnect().await;
    delete.assert_async().await;

    assert!(!backend.cancel(task(BackendKind::Spark).id()).await);
    Ok(())
}
