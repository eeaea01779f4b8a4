//! Integration tests for the habit sync HTTP server

use chrono::NaiveDate;
use habit_timer_agent::server::{run, ServerConfig};
use habit_timer_agent::{QueryEngine, RecordStore, ToolRegistry};
use std::net::SocketAddr;
use std::time::Duration;
use tempfile::TempDir;

const API_KEY: &str = "test-key";

async fn start(dir: &TempDir) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let config = ServerConfig::new(0, API_KEY, dir.path().to_path_buf());
    let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    (addr, shutdown_tx)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn scenario_a() -> serde_json::Value {
    serde_json::json!({
        "date": "2024-01-10",
        "habits": [
            { "name": "Exercise", "completed": true, "count": 1, "goal": 1 },
            { "name": "Read", "completed": false, "count": 0, "goal": 1 }
        ]
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start(&dir).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].as_str().is_some());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_sync_then_query() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start(&dir).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/sync", addr))
        .header("X-API-Key", API_KEY)
        .json(&scenario_a())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["date"], "2024-01-10");
    assert_eq!(body["habits_count"], 2);

    let tools = ToolRegistry::new(QueryEngine::new(RecordStore::new(dir.path())));
    let text = tools
        .invoke("habits_summary", &serde_json::json!({}), date("2024-01-10"))
        .await
        .unwrap();
    assert!(text.contains("✅ Done: Exercise"));
    assert!(text.contains("❌ Pending: Read"));

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_sync_replaces_previous_day() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start(&dir).await;
    let client = reqwest::Client::new();

    for body in [
        scenario_a(),
        serde_json::json!({
            "date": "2024-01-10",
            "habits": [{ "name": "Meditate", "completed": true, "count": 2, "goal": 2 }]
        }),
    ] {
        let response = client
            .post(format!("http://{}/sync", addr))
            .header("X-API-Key", API_KEY)
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }

    let record = RecordStore::new(dir.path())
        .read(date("2024-01-10"))
        .await
        .unwrap();
    assert_eq!(record.total(), 1);
    assert_eq!(record.habits[0].name, "Meditate");

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_sync_rejects_wrong_key() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start(&dir).await;
    let client = reqwest::Client::new();

    let wrong = client
        .post(format!("http://{}/sync", addr))
        .header("X-API-Key", "not-the-key")
        .json(&scenario_a())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(wrong.status(), reqwest::StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = wrong.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "UNAUTHORIZED");

    let missing = client
        .post(format!("http://{}/sync", addr))
        .json(&scenario_a())
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(missing.status(), reqwest::StatusCode::UNAUTHORIZED);

    // Auth is checked before the body is looked at
    let garbage = client
        .post(format!("http://{}/sync", addr))
        .header("X-API-Key", "not-the-key")
        .body("definitely not json")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(garbage.status(), reqwest::StatusCode::UNAUTHORIZED);

    let store = RecordStore::new(dir.path());
    let record = store.read(date("2024-01-10")).await.unwrap();
    assert!(record.habits.is_empty());
    assert!(record.last_updated.is_none());
    assert!(store.dates().await.unwrap().is_empty());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_sync_rejects_bad_payloads() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start(&dir).await;
    let client = reqwest::Client::new();

    let cases = [
        (serde_json::json!({ "date": "2024-01-10" }), "INVALID_BODY"),
        (
            serde_json::json!({ "date": "10.01.2024", "habits": [] }),
            "INVALID_DATE",
        ),
        (
            serde_json::json!({
                "date": "2024-01-10",
                "habits": [{ "name": "", "completed": true, "count": 1, "goal": 1 }]
            }),
            "INVALID_HABIT",
        ),
    ];

    for (body, code) in cases {
        let response = client
            .post(format!("http://{}/sync", addr))
            .header("X-API-Key", API_KEY)
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], code);
    }

    assert!(RecordStore::new(dir.path())
        .dates()
        .await
        .unwrap()
        .is_empty());

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_sync_accepts_app_timestamp() {
    let dir = TempDir::new().unwrap();
    let (addr, shutdown_tx) = start(&dir).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/sync", addr))
        .header("X-API-Key", API_KEY)
        .json(&serde_json::json!({
            "date": "2024-01-10T00:00:00Z",
            "habits": [{ "name": "Stretch", "completed": true, "count": 0, "goal": 0 }]
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["date"], "2024-01-10");

    let record = RecordStore::new(dir.path())
        .read(date("2024-01-10"))
        .await
        .unwrap();
    assert_eq!(record.habits[0].goal, 0);

    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn test_storage_failure_is_server_error() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    // The data directory sits beneath a regular file and can never be created
    let config = ServerConfig::new(0, API_KEY, blocker.join("habits"));
    let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/sync", addr))
        .header("X-API-Key", API_KEY)
        .json(&scenario_a())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["code"], "STORAGE_ERROR");

    let _ = shutdown_tx.send(());
}
