//! End-to-end attribution properties over the in-memory store.
//!
//! These tests drive the manager the way the API does:
//! - Distributions are normalized and deterministic
//! - A failing or panicking channel never takes the other one down

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use tally_core::attribution::search_raw_weights;
use tally_core::{
    AdImpression, AttributionManager, AttributionMethod, Channel, Conversion, ConversionId,
    CreativePerformance, CustomerId, Error, HeuristicScorer, IntentClassification, MemoryStore,
    Result, RuleBasedClassifier, ScorerOutput, ScoringContext, SearchQuery, TouchpointIngest,
    TouchpointScorer, TouchpointStore, VideoInteraction,
};

fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap() + Duration::minutes(minute)
}

fn query(id: &str, customer: &str, minute: i64, kind: &str, stage: &str) -> SearchQuery {
    SearchQuery {
        query_id: id.into(),
        customer_id: CustomerId::from(customer),
        session_id: Some("sess_1".into()),
        query_text: "running shoes".into(),
        query_type: Some(kind.into()),
        funnel_stage: Some(stage.into()),
        intent: None,
        timestamp: at(minute),
        sequence_position: None,
    }
}

fn impression(id: &str, customer: &str, minute: i64, viewability: f64) -> AdImpression {
    AdImpression {
        impression_id: id.into(),
        customer_id: CustomerId::from(customer),
        creative_id: "cr_1".into(),
        campaign_id: Some("camp_1".into()),
        placement_id: None,
        ad_format: "banner".into(),
        viewability_score: viewability,
        view_duration_seconds: Some(4),
        timestamp: at(minute),
        frequency_cap_count: 1,
        cost: 0.25,
        clicked: false,
    }
}

async fn journey_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_query(&query("q1", "CUST_001", 10, "product_research", "awareness"))
        .await
        .unwrap();
    store
        .insert_query(&query("q2", "CUST_001", 20, "comparison", "consideration"))
        .await
        .unwrap();
    store
        .insert_query(&query("q3", "CUST_001", 30, "transactional", "decision"))
        .await
        .unwrap();
    store
        .insert_impression(&impression("imp_1", "CUST_001", 0, 0.8))
        .await
        .unwrap();
    store
        .insert_conversion(&Conversion {
            conversion_id: ConversionId::from("conv_1"),
            customer_id: CustomerId::from("CUST_001"),
            conversion_type: Some("purchase".into()),
            value: 129.0,
            timestamp: at(40),
        })
        .await
        .unwrap();
    store
}

fn manager(store: Arc<dyn TouchpointStore>, scorer: Arc<dyn TouchpointScorer>) -> AttributionManager {
    AttributionManager::new(store, Arc::new(RuleBasedClassifier::new()), scorer)
}

#[tokio::test]
async fn unified_attribution_splits_by_touchpoint_count() {
    let store = journey_store().await;
    let manager = manager(store, Arc::new(HeuristicScorer::new()));

    let unified = manager
        .unified_attribution(&CustomerId::from("CUST_001"), Some(&ConversionId::from("conv_1")))
        .await;

    assert_eq!(unified.channel_weights.search, 0.75);
    assert_eq!(unified.channel_weights.display, 0.25);
    assert!((unified.total_weight - 1.0).abs() < 0.01);
    assert!(unified.contributions.contains("search_q3"));
    assert!(unified.contributions.contains("display_imp_1"));
    assert!((unified.contributions.get("display_imp_1").unwrap() - 0.25).abs() < 1e-9);
    assert_eq!(unified.search.method, AttributionMethod::RuleBased);
    assert_eq!(unified.display.method, AttributionMethod::Enhanced);
    assert_eq!(unified.conversion_id, Some(ConversionId::from("conv_1")));
}

#[tokio::test]
async fn unknown_customer_gets_even_split_and_empty_results() {
    let manager = manager(Arc::new(MemoryStore::new()), Arc::new(HeuristicScorer::new()));

    let unified = manager
        .unified_attribution(&CustomerId::from("nobody"), None)
        .await;

    assert_eq!(unified.channel_weights.search, 0.5);
    assert_eq!(unified.channel_weights.display, 0.5);
    assert!(unified.contributions.is_empty());
    for result in [&unified.search, &unified.display] {
        assert_eq!(result.total_weight, 0.0);
        assert_eq!(result.confidence, 0.0);
        assert!(result.error.is_some());
    }
}

#[tokio::test]
async fn search_weights_are_idempotent() {
    let store = journey_store().await;
    let manager = manager(store, Arc::new(HeuristicScorer::new()));
    let customer = CustomerId::from("CUST_001");

    let first = manager.search_attribution(&customer, None).await.unwrap();
    let second = manager.search_attribution(&customer, None).await.unwrap();

    assert_eq!(first.contributions, second.contributions);
    assert!(first.contributions.is_normalized());
    let weights: Vec<f64> = ["q1", "q2", "q3"]
        .iter()
        .map(|id| first.contributions.get(id).unwrap())
        .collect();
    assert!(weights.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn display_weights_are_idempotent() {
    let store = journey_store().await;
    store
        .insert_impression(&impression("imp_2", "CUST_001", 5, 0.4))
        .await
        .unwrap();
    let manager = manager(store, Arc::new(HeuristicScorer::new()));
    let customer = CustomerId::from("CUST_001");

    let first = manager.display_attribution(&customer, None).await.unwrap();
    let second = manager.display_attribution(&customer, None).await.unwrap();

    assert_eq!(first.contributions, second.contributions);
    assert_eq!(first.method, second.method);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.touchpoint_count(), 2);
    assert!(first.contributions.is_normalized());
}

#[test]
fn awareness_query_earns_three_tenths_of_decision() {
    let awareness = query("q_a", "CUST_001", 0, "transactional", "awareness");
    let decision = query("q_d", "CUST_001", 0, "transactional", "decision");

    let aware_raw = search_raw_weights(&[awareness])[0].1;
    let decide_raw = search_raw_weights(&[decision])[0].1;

    assert!((aware_raw / decide_raw - 0.3).abs() < 1e-12);
}

struct PanickingScorer;

#[async_trait]
impl TouchpointScorer for PanickingScorer {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn score_touchpoints(&self, _context: &ScoringContext) -> Result<ScorerOutput> {
        panic!("scorer blew up");
    }
}

#[tokio::test]
async fn panicking_display_channel_is_isolated() {
    let store = journey_store().await;
    let manager = manager(store, Arc::new(PanickingScorer));

    let unified = manager
        .unified_attribution(&CustomerId::from("CUST_001"), None)
        .await;

    assert!(unified.display.is_empty());
    assert!(unified.display.error.as_deref().unwrap().contains("display"));
    assert_eq!(unified.search.touchpoint_count(), 3);
    assert_eq!(unified.channel_weights.search, 1.0);
    assert!((unified.total_weight - 1.0).abs() < 0.01);
}

/// Store whose display reads always fail.
struct BrokenDisplayStore(MemoryStore);

#[async_trait]
impl TouchpointStore for BrokenDisplayStore {
    async fn search_history(&self, customer_id: &CustomerId) -> Result<Vec<SearchQuery>> {
        self.0.search_history(customer_id).await
    }

    async fn display_history(&self, _customer_id: &CustomerId) -> Result<Vec<AdImpression>> {
        Err(Error::Store("display table unavailable".into()))
    }

    async fn video_interactions(&self, customer_id: &CustomerId) -> Result<Vec<VideoInteraction>> {
        self.0.video_interactions(customer_id).await
    }

    async fn conversion(&self, id: &ConversionId) -> Result<Option<Conversion>> {
        self.0.conversion(id).await
    }

    async fn creative_performance(&self, creative_id: &str) -> Result<Option<CreativePerformance>> {
        self.0.creative_performance(creative_id).await
    }

    async fn creative_impressions(&self, creative_id: &str) -> Result<Vec<AdImpression>> {
        self.0.creative_impressions(creative_id).await
    }

    async fn campaign_impressions(&self, campaign_id: &str) -> Result<Vec<AdImpression>> {
        self.0.campaign_impressions(campaign_id).await
    }

    async fn session_queries(&self, session_id: &str) -> Result<Vec<SearchQuery>> {
        self.0.session_queries(session_id).await
    }

    async fn attribution_weight(&self, channel: Channel, touchpoint_id: &str) -> Result<Option<f64>> {
        self.0.attribution_weight(channel, touchpoint_id).await
    }

    async fn record_attribution_weight(
        &self,
        channel: Channel,
        touchpoint_id: &str,
        weight: f64,
    ) -> Result<()> {
        self.0
            .record_attribution_weight(channel, touchpoint_id, weight)
            .await
    }

    async fn record_intent(
        &self,
        query_id: &str,
        classification: &IntentClassification,
    ) -> Result<()> {
        self.0.record_intent(query_id, classification).await
    }
}

#[tokio::test]
async fn store_failure_degrades_only_its_channel() {
    let inner = MemoryStore::new();
    inner
        .insert_query(&query("q1", "CUST_002", 0, "validation", "consideration"))
        .await
        .unwrap();
    let manager = manager(
        Arc::new(BrokenDisplayStore(inner)),
        Arc::new(HeuristicScorer::new()),
    );

    let unified = manager
        .unified_attribution(&CustomerId::from("CUST_002"), None)
        .await;

    assert_eq!(
        unified.display.error.as_deref(),
        Some("display attribution failed: store error: display table unavailable")
    );
    assert_eq!(unified.display.model_version, "unavailable");
    assert_eq!(unified.search.contributions.get("q1"), Some(1.0));
    assert_eq!(unified.channel_weights.search, 1.0);
}
