//! Single entry point over the engines, the combiner and the summarizer.
//!
//! [`AttributionManager`] wires one store, one classifier and one scorer into
//! the per-channel engines. Callers (the HTTP API, the CLI) hold one manager
//! and never construct engines themselves.

use std::sync::Arc;

use crate::Result;
use crate::attribution::{
    AttributionResult, ChannelCombiner, DisplayAttributionEngine, SearchAttributionEngine,
    UnifiedAttribution,
};
use crate::classifier::IntentClassifier;
use crate::insights::{
    ComprehensiveInsights, CreativeAnalysis, CrossChannelAnalysis, DisplayInsights,
    FrequencyAnalysis, InsightsSummarizer, OptimizationStrategy, SearchInsights, SearchSession,
    VideoEngagement,
};
use crate::scorer::TouchpointScorer;
use crate::store::TouchpointStore;
use crate::types::{ConversionId, CustomerId, IntentClassification, SearchQuery};

#[derive(Clone)]
pub struct AttributionManager {
    combiner: ChannelCombiner,
    insights: InsightsSummarizer,
}

impl AttributionManager {
    /// Manager that writes computed weights back to the store.
    pub fn new(
        store: Arc<dyn TouchpointStore>,
        classifier: Arc<dyn IntentClassifier>,
        scorer: Arc<dyn TouchpointScorer>,
    ) -> Self {
        Self::with_write_back(store, classifier, scorer, true)
    }

    pub fn with_write_back(
        store: Arc<dyn TouchpointStore>,
        classifier: Arc<dyn IntentClassifier>,
        scorer: Arc<dyn TouchpointScorer>,
        write_back: bool,
    ) -> Self {
        let search = SearchAttributionEngine::new(Arc::clone(&store), classifier)
            .with_write_back(write_back);
        let display =
            DisplayAttributionEngine::new(Arc::clone(&store), scorer).with_write_back(write_back);
        Self {
            combiner: ChannelCombiner::new(Arc::new(search), Arc::new(display)),
            insights: InsightsSummarizer::new(store),
        }
    }

    // === Attribution ===

    pub async fn search_attribution(
        &self,
        customer_id: &CustomerId,
        conversion_id: Option<&ConversionId>,
    ) -> Result<AttributionResult> {
        self.combiner
            .search()
            .compute_weights(customer_id, conversion_id)
            .await
    }

    pub async fn display_attribution(
        &self,
        customer_id: &CustomerId,
        conversion_id: Option<&ConversionId>,
    ) -> Result<AttributionResult> {
        self.combiner
            .display()
            .compute_weights(customer_id, conversion_id)
            .await
    }

    /// Both channels concurrently, blended. Never fails; a failed channel is
    /// reported inside the result.
    pub async fn unified_attribution(
        &self,
        customer_id: &CustomerId,
        conversion_id: Option<&ConversionId>,
    ) -> UnifiedAttribution {
        self.combiner
            .unified_attribution(customer_id, conversion_id)
            .await
    }

    /// Classify a stored query and record the classification on it.
    pub async fn process_query(&self, query: &SearchQuery) -> Result<IntentClassification> {
        self.combiner.search().process_query(query).await
    }

    // === Insights ===

    pub async fn search_insights(&self, customer_id: &CustomerId) -> Result<SearchInsights> {
        self.insights.search_insights(customer_id).await
    }

    pub async fn display_insights(&self, customer_id: &CustomerId) -> Result<DisplayInsights> {
        self.insights.display_insights(customer_id).await
    }

    pub async fn video_engagement(&self, customer_id: &CustomerId) -> Result<VideoEngagement> {
        self.insights.video_engagement(customer_id).await
    }

    pub async fn cross_channel_analysis(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CrossChannelAnalysis> {
        self.insights.cross_channel(customer_id).await
    }

    pub async fn comprehensive_insights(
        &self,
        customer_id: &CustomerId,
    ) -> Result<ComprehensiveInsights> {
        self.insights.comprehensive(customer_id).await
    }

    pub async fn optimize_strategy(
        &self,
        customer_id: &CustomerId,
        goals: Vec<String>,
    ) -> Result<OptimizationStrategy> {
        self.insights.optimization_strategy(customer_id, goals).await
    }

    pub async fn creative_analysis(&self, creative_id: &str) -> Result<CreativeAnalysis> {
        self.insights.creative_analysis(creative_id).await
    }

    pub async fn frequency_analysis(&self, campaign_id: &str) -> Result<FrequencyAnalysis> {
        self.insights.frequency_analysis(campaign_id).await
    }

    pub async fn search_session(&self, session_id: &str) -> Result<SearchSession> {
        self.insights.search_session(session_id).await
    }
}
