use log_relay::{AllowList, LogEntry, LogStore, RelayServer, NO_LOGS_PLACEHOLDER};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::prelude::*;

fn temp_root() -> PathBuf {
    std::env::temp_dir().join(format!("log-relay-it-{}", uuid::Uuid::new_v4()))
}

async fn start_server(root: &PathBuf) -> RelayServer {
    let allow = AllowList::new(["stef"]).unwrap();
    let store = LogStore::open(root, allow).await.unwrap();
    RelayServer::start(([127, 0, 0, 1], 0).into(), Arc::new(store))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_append_and_read_over_http() {
    let root = temp_root();
    let server = start_server(&root).await;
    let base = server.base_url();
    let client = reqwest::Client::new();

    let body = client
        .get(format!("{}/logs/?identifier=stef", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, NO_LOGS_PLACEHOLDER);

    for line in ["first", "second"] {
        let response = client
            .post(format!("{}/log", base))
            .json(&LogEntry::new("stef", line))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    let body = client
        .get(format!("{}/logs?identifier=stef", base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "first\nsecond\n");
    assert_eq!(
        std::fs::read_to_string(root.join("stef.log")).unwrap(),
        "first\nsecond\n"
    );

    server.shutdown().await;
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_unknown_identifier_over_http() {
    let root = temp_root();
    let server = start_server(&root).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/log", server.base_url()))
        .json(&LogEntry::new("mallory", "x"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    assert_eq!(
        response.json::<serde_json::Value>().await.unwrap(),
        serde_json::json!({ "detail": "unknown identifier" })
    );
    assert!(!root.join("mallory.log").exists());

    server.shutdown().await;
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn test_relay_layer_delivers_lines() {
    let root = temp_root();
    let server = start_server(&root).await;

    let (layer, forwarder) =
        log_relay::client::relay(&server.base_url(), "stef", Level::INFO).unwrap();
    let forwarding = tokio::spawn(forwarder.run());

    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(target: "volume_ctrl", "Hello Propello");
    });
    // Dropping the subscriber closes the channel and ends the forwarder
    forwarding.await.unwrap();

    let mut text = String::new();
    for _ in 0..50 {
        text = std::fs::read_to_string(root.join("stef.log")).unwrap_or_default();
        if !text.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(text.ends_with(" - volume_ctrl - INFO - Hello Propello\n"));

    server.shutdown().await;
    let _ = std::fs::remove_dir_all(&root);
}
