//! ClickHouse backend against a mock server.

mod test_utils;

use mockito::Matcher;
use quarry_backend::ClickHouseBackend;
use quarry_core::BackendKind;
use quarry_error::QuarryErrorKind;
use quarry_interface::ExecutionBackend;
use serde_json::json;
use test_utils::{settings_with, task};

async fn connected(server: &mut mockito::ServerGuard) -> anyhow::Result<ClickHouseBackend> {
    server
        .mock("GET", "/ping")
        .with_body("Ok.\n")
        .create_async()
        .await;
    let backend = ClickHouseBackend::new(settings_with(json!({
        "url": server.url(),
        "username": "default",
        "database": "analytics",
    })))?;
    backend.connect().await?;
    Ok(backend)
}

#[tokio::test]
async fn test_execute_sends_query_id_and_format() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;
    let task = task(BackendKind::ClickHouse);

    let query = server
        .mock("POST", Matcher::Regex("^/".to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query_id".into(), task.id().to_string()),
            Matcher::UrlEncoded("database".into(), "analytics".into()),
        ]))
        .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
        .match_body("SELECT city, count() AS n FROM order_info GROUP BY city FORMAT JSON")
        .with_body(
            json!({
                "meta": [{"name": "city", "type": "String"}, {"name": "n", "type": "UInt64"}],
                "data": [{"city": "hangzhou", "n": "12"}, {"city": "wuhan", "n": "7"}],
                "rows": 2,
                "statistics": {"elapsed": 0.001, "rows_read": 19, "bytes_read": 240}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let outcome = backend
        .execute("SELECT city, count() AS n FROM order_info GROUP BY city;", &task)
        .await;

    assert!(*outcome.success(), "{:?}", outcome.error());
    assert_eq!(outcome.columns(), &vec!["city".to_string(), "n".to_string()]);
    assert_eq!(outcome.rows()[1]["city"], "wuhan");
    query.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_count_parses_quoted_integers() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;

    server
        .mock("POST", Matcher::Regex("^/".to_string()))
        .match_body(Matcher::Regex("^SELECT COUNT".to_string()))
        .with_body(r#"{"meta": [{"name": "total_count", "type": "UInt64"}], "data": [{"total_count": "257"}], "rows": 1}"#)
        .create_async()
        .await;

    let count = backend
        .execute_count("SELECT COUNT(*) AS total_count FROM order_info", &task(BackendKind::ClickHouse))
        .await;
    assert_eq!(count, 257);
    Ok(())
}

#[tokio::test]
async fn test_server_exception_becomes_failed_outcome() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    let backend = connected(&mut server).await?;

    server
        .mock("POST", Matcher::Regex("^/".to_string()))
        .with_status(404)
        .with_body("Code: 60. DB::Exception: Table analytics.order_info doesn't exist. (UNKNOWN_TABLE)")
        .create_async()
        .await;

    let task = task(BackendKind::ClickHouse);
    let outcome = backend.execute("SELECT * FROM order_info", &task).await;

    assert!(!*outcome.success());
    let error = outcome.error().clone().unwrap_or_default();
    assert!(error.contains("UNKNOWN_TABLE"), "{}", error);
    assert_eq!(backend.execute_count("SELECT COUNT(*) FROM order_info", &task).await, 0);
    assert!(!backend.cancel(task.id()).await);
    Ok(())
}

#[tokio::test]
async fn test_connect_fails_without_ping() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/ping")
        .with_status(503)
        .create_async()
        .await;
    let backend = ClickHouseBackend::new(test_utils::settings(&server.url()))?;

    let err = backend.connect().await.unwrap_err();
    assert!(matches!(err.kind(), QuarryErrorKind::Connection(_)));

    let status = backend.status().await;
    assert!(!*status.connected());
    Ok(())
}
