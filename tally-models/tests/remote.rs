//! Remote clients against an in-process model service.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, response::IntoResponse};
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use tally_core::{
    AdImpression, AttributionMethod, CustomerId, DisplayAttributionEngine, FunnelStage,
    IntentClassifier, MemoryStore, QueryIntent, ScoringContext, TouchpointIngest,
    TouchpointScorer,
};
use tally_models::{RemoteIntentClassifier, RemoteScorer};

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Weights each impression by its 1-based position in the request.
async fn positional_score(Json(body): Json<Value>) -> Json<Value> {
    let weights: serde_json::Map<String, Value> = body["impressions"]
        .as_array()
        .map(|imps| {
            imps.iter()
                .enumerate()
                .map(|(i, imp)| {
                    (
                        imp["impression_id"].as_str().unwrap_or_default().to_string(),
                        json!((i + 1) as f64),
                    )
                })
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "touchpoint_contributions": weights, "confidence_score": 0.8 }))
}

async fn failing_score() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "model crashed")
}

async fn slow_score() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "touchpoint_contributions": {} }))
}

async fn marked_score() -> Json<Value> {
    Json(json!({ "touchpoint_contributions": {"imp_1": 1.0}, "error": "stale model" }))
}

async fn classify(Json(body): Json<Value>) -> Json<Value> {
    let text = body["query_text"].as_str().unwrap_or_default();
    let (category, stage) = if text.contains("buy") {
        ("transactional", "decision")
    } else {
        ("product_research", "awareness")
    };
    Json(json!({
        "intent_category": category,
        "funnel_stage": stage,
        "purchase_intent_score": 0.9,
        "urgency_score": 0.4,
        "confidence_score": 0.95
    }))
}

fn impression(id: &str, minute: u32, viewability: f64) -> AdImpression {
    AdImpression {
        impression_id: id.into(),
        customer_id: CustomerId::from("CUST_001"),
        creative_id: "cr_1".into(),
        campaign_id: None,
        placement_id: None,
        ad_format: "banner".into(),
        viewability_score: viewability,
        view_duration_seconds: None,
        timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 9, minute, 0).unwrap(),
        frequency_cap_count: 1,
        cost: 0.1,
        clicked: false,
    }
}

fn context() -> ScoringContext {
    ScoringContext {
        customer_id: CustomerId::from("CUST_001"),
        impressions: vec![impression("imp_1", 0, 0.5), impression("imp_2", 5, 0.9)],
        conversion: None,
    }
}

#[tokio::test]
async fn scorer_posts_context_and_decodes_weights() {
    let addr = spawn(Router::new().route("/score", post(positional_score))).await;
    let scorer = RemoteScorer::new(format!("http://{addr}")).unwrap();

    let output = scorer.score_touchpoints(&context()).await.unwrap();

    assert_eq!(output.touchpoint_contributions.get("imp_1"), Some(&1.0));
    assert_eq!(output.touchpoint_contributions.get("imp_2"), Some(&2.0));
    assert_eq!(output.confidence, Some(0.8));
    assert!(output.is_usable());
}

#[tokio::test]
async fn scorer_server_error_is_scorer_failure() {
    let addr = spawn(Router::new().route("/score", post(failing_score))).await;
    let scorer = RemoteScorer::new(format!("http://{addr}")).unwrap();

    let err = scorer.score_touchpoints(&context()).await.unwrap_err();

    assert!(matches!(err, tally_core::Error::Scorer(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn scorer_times_out() {
    let addr = spawn(Router::new().route("/score", post(slow_score))).await;
    let scorer =
        RemoteScorer::with_timeout(format!("http://{addr}"), Duration::from_millis(100)).unwrap();

    let err = scorer.score_touchpoints(&context()).await.unwrap_err();

    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn error_marker_is_passed_through() {
    let addr = spawn(Router::new().route("/score", post(marked_score))).await;
    let scorer = RemoteScorer::new(format!("http://{addr}")).unwrap();

    let output = scorer.score_touchpoints(&context()).await.unwrap();

    assert_eq!(output.error.as_deref(), Some("stale model"));
    assert!(!output.is_usable());
}

#[tokio::test]
async fn display_engine_uses_remote_weights() {
    let addr = spawn(Router::new().route("/score", post(positional_score))).await;
    let store = Arc::new(MemoryStore::new());
    store.insert_impression(&impression("imp_1", 0, 0.5)).await.unwrap();
    store.insert_impression(&impression("imp_2", 5, 0.9)).await.unwrap();
    let engine = DisplayAttributionEngine::new(
        store,
        Arc::new(RemoteScorer::new(format!("http://{addr}")).unwrap()),
    );

    let result = engine
        .compute_weights(&CustomerId::from("CUST_001"), None)
        .await
        .unwrap();

    assert_eq!(result.method, AttributionMethod::Enhanced);
    let imp_2 = result.contributions.get("imp_2").unwrap();
    assert!((imp_2 - 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn display_engine_falls_back_when_remote_fails() {
    let addr = spawn(Router::new().route("/score", post(failing_score))).await;
    let store = Arc::new(MemoryStore::new());
    store.insert_impression(&impression("imp_1", 0, 0.8)).await.unwrap();
    store.insert_impression(&impression("imp_2", 5, 0.4)).await.unwrap();
    let engine = DisplayAttributionEngine::new(
        store,
        Arc::new(RemoteScorer::new(format!("http://{addr}")).unwrap()),
    );

    let result = engine
        .compute_weights(&CustomerId::from("CUST_001"), None)
        .await
        .unwrap();

    assert_eq!(result.method, AttributionMethod::Fallback);
    assert_eq!(result.contributions.get("imp_1"), Some(0.5));
    assert_eq!(result.contributions.get("imp_2"), Some(0.5));
}

#[tokio::test]
async fn classifier_decodes_classification() {
    let addr = spawn(Router::new().route("/classify", post(classify))).await;
    let classifier = RemoteIntentClassifier::new(format!("http://{addr}/")).unwrap();

    let result = classifier.classify("buy trail shoes").await.unwrap();

    assert_eq!(result.intent_category, QueryIntent::Transactional);
    assert_eq!(result.funnel_stage, FunnelStage::Decision);
    assert_eq!(result.confidence_score, 0.95);
}

#[tokio::test]
async fn classifier_unreachable_is_classifier_failure() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let classifier = RemoteIntentClassifier::new(format!("http://{addr}")).unwrap();

    let err = classifier.classify("boots").await.unwrap_err();

    assert!(matches!(err, tally_core::Error::Classifier(_)));
}
