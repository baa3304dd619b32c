//! A full customer journey over a running server: ingest, attribute, analyze.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::net::TcpListener;

use tally_server::{AppState, ServerConfig, TallyServer};

/// Spawns server in background task, returns bound address
async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = TallyServer::with_state(ServerConfig::default(), Arc::new(AppState::in_memory()));

    tokio::spawn(async move {
        let _ = server.run_with_listener(listener).await;
    });

    // Brief delay to ensure server is accepting connections
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    addr
}

async fn post(client: &reqwest::Client, addr: SocketAddr, path: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("http://{addr}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn journey_from_ingest_to_unified_attribution() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let touchpoints = [
        (
            "/api/impressions",
            json!({
                "impression_id": "imp_1",
                "customer_id": "CUST_001",
                "creative_id": "cr_1",
                "ad_format": "banner",
                "viewability_score": 0.8,
                "timestamp": "2024-01-15T09:00:00Z"
            }),
        ),
        (
            "/api/queries",
            json!({
                "query_id": "q1",
                "customer_id": "CUST_001",
                "query_text": "best trail shoes",
                "query_type": "comparison",
                "funnel_stage": "consideration",
                "timestamp": "2024-01-15T09:10:00Z"
            }),
        ),
        (
            "/api/queries",
            json!({
                "query_id": "q2",
                "customer_id": "CUST_001",
                "query_text": "buy trail shoes",
                "query_type": "transactional",
                "funnel_stage": "decision",
                "timestamp": "2024-01-15T09:20:00Z"
            }),
        ),
        (
            "/api/queries",
            json!({
                "query_id": "q3",
                "customer_id": "CUST_001",
                "query_text": "trail shoes coupon",
                "query_type": "transactional",
                "funnel_stage": "decision",
                "timestamp": "2024-01-15T09:30:00Z"
            }),
        ),
        (
            "/api/conversions",
            json!({
                "conversion_id": "conv_1",
                "customer_id": "CUST_001",
                "value": 129.0,
                "timestamp": "2024-01-15T09:40:00Z"
            }),
        ),
    ];
    for (path, body) in touchpoints {
        let response = post(&client, addr, path, body).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED, "{path}");
    }

    let response = post(
        &client,
        addr,
        "/api/attribution/unified",
        json!({"customer_id": "CUST_001", "conversion_id": "conv_1"}),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["channel_weights"]["search"], 0.75);
    assert_eq!(body["data"]["channel_weights"]["display"], 0.25);
    let total: f64 = body["data"]["contributions"]
        .as_object()
        .unwrap()
        .values()
        .map(|v| v.as_f64().unwrap())
        .sum();
    assert!((total - 1.0).abs() < 0.01);

    let response = client
        .get(format!("http://{addr}/api/insights/cross-channel/CUST_001"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["sequence_pattern"], "search_dominant");
}

#[tokio::test]
async fn health_reports_version() {
    let addr = spawn_server().await;

    let body: Value = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));
}
