//! End-to-end: both tasks running against fixed-data collaborators.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use weatherlog::Supervisor;
use weatherlog_core::{AppError, Config};
use weatherlog_store::ReadingStore;
use weatherlog_weather::mock::{StaticProvider, StaticResolver};
use weatherlog_weather::{Coordinates, Observation};

fn test_config(places: Vec<&str>) -> Config {
    let mut config = Config::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.ingest.places = places.into_iter().map(String::from).collect();
    config.ingest.poll_interval_secs = 3600;
    config
}

fn supervisor(config: Config, store: &ReadingStore) -> Supervisor {
    Supervisor::with_parts(
        config,
        store.clone(),
        Arc::new(StaticResolver::new(Coordinates::new(55.75, 37.62))),
        Arc::new(StaticProvider::new(Observation::new("2024-01-01T12:00", -5.3))),
    )
}

async fn wait_for_reading(store: &ReadingStore, place: &str) {
    for _ in 0..100 {
        if store.count(place).await.unwrap() > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("no reading for {} was ingested", place);
}

#[tokio::test]
async fn test_ingested_reading_is_served() {
    let store = ReadingStore::in_memory().unwrap();
    let shutdown = CancellationToken::new();
    let running = supervisor(test_config(vec!["Moscow"]), &store)
        .start(shutdown.clone())
        .unwrap();
    let base = format!("http://{}", running.addr());

    wait_for_reading(&store, "Moscow").await;

    let res = reqwest::get(format!("{}/Moscow", base)).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "name": "Moscow",
            "timestamp": "2024-01-01T12:00:00+03:00",
            "temperature": -5.3
        })
    );

    let res = reqwest::get(format!("{}/Atlantis", base)).await.unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(!res.text().await.unwrap().is_empty());

    shutdown.cancel();
    running.wait().await.unwrap();
}

#[tokio::test]
async fn test_ingestion_exit_is_fatal_and_stops_server() {
    let store = ReadingStore::in_memory().unwrap();
    // No places: the ingestion task returns at once
    let running = supervisor(test_config(vec![]), &store)
        .start(CancellationToken::new())
        .unwrap();
    let addr = running.addr();

    let result = tokio::time::timeout(Duration::from_secs(5), running.wait())
        .await
        .unwrap();
    match result {
        Err(AppError::TaskTerminated { task, .. }) => assert_eq!(task, "ingestion"),
        other => panic!("expected ingestion termination, got {:?}", other),
    }

    assert!(reqwest::get(format!("http://{}/Moscow", addr)).await.is_err());
}

#[tokio::test]
async fn test_start_fails_on_bad_bind_address() {
    let store = ReadingStore::in_memory().unwrap();
    let mut config = test_config(vec!["Moscow"]);
    config.server.bind_address = "not an address".to_string();

    let result = supervisor(config, &store).start(CancellationToken::new());
    assert!(matches!(result, Err(AppError::Config(_))));
    assert_eq!(store.count("Moscow").await.unwrap(), 0);
}
