//! Search channel attribution.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::normalize::normalize;
use super::types::{AttributionMethod, AttributionResult};
use crate::classifier::IntentClassifier;
use crate::store::TouchpointStore;
use crate::types::{
    Channel, ConversionId, CustomerId, FunnelStage, IntentClassification, QueryIntent,
    SearchQuery,
};
use crate::{Error, Result};

/// Weight of a funnel stage. Unknown labels parse to awareness.
pub fn stage_weight(stage: FunnelStage) -> f64 {
    match stage {
        FunnelStage::Awareness => 0.3,
        FunnelStage::Consideration => 0.5,
        FunnelStage::Decision => 1.0,
    }
}

/// Weight of a query's intent category.
pub fn type_weight(intent: QueryIntent) -> f64 {
    match intent {
        QueryIntent::BrandResearch => 0.4,
        QueryIntent::ProductResearch => 0.5,
        QueryIntent::Comparison => 0.7,
        QueryIntent::Validation => 0.8,
        QueryIntent::Transactional => 1.0,
        QueryIntent::Navigational => 0.3,
        QueryIntent::Unknown => 0.2,
    }
}

/// `(i+1)/N` for zero-based position `i`. The last touchpoint gets 1.0.
pub fn position_weight(index: usize, total: usize) -> f64 {
    (index + 1) as f64 / total as f64
}

/// Unnormalized `position * stage * type` weight for each query, in order.
pub fn search_raw_weights(queries: &[SearchQuery]) -> Vec<(String, f64)> {
    let n = queries.len();
    queries
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let raw =
                position_weight(i, n) * stage_weight(q.stage()) * type_weight(q.intent_category());
            (q.query_id.clone(), raw)
        })
        .collect()
}

/// Rule-based attribution over a customer's search queries.
pub struct SearchAttributionEngine {
    store: Arc<dyn TouchpointStore>,
    classifier: Arc<dyn IntentClassifier>,
    write_back: bool,
}

impl SearchAttributionEngine {
    pub const MODEL_VERSION: &'static str = "search_engine_v1";

    /// Confidence reported whenever the customer has queries.
    pub const CONFIDENCE: f64 = 0.9;

    pub fn new(store: Arc<dyn TouchpointStore>, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self {
            store,
            classifier,
            write_back: true,
        }
    }

    /// Enable or disable persisting computed weights back to the store.
    pub fn with_write_back(mut self, enabled: bool) -> Self {
        self.write_back = enabled;
        self
    }

    /// Distribute credit for a conversion over the customer's search queries.
    ///
    /// A customer with no queries gets an empty result carrying the reason,
    /// not an error. Store failures propagate.
    #[instrument(skip(self), fields(customer = %customer_id))]
    pub async fn compute_weights(
        &self,
        customer_id: &CustomerId,
        conversion_id: Option<&ConversionId>,
    ) -> Result<AttributionResult> {
        let queries = self.store.search_history(customer_id).await?;

        if queries.is_empty() {
            let reason = Error::NoHistory {
                channel: Channel::Search,
                customer_id: customer_id.to_string(),
            };
            info!("{reason}");
            return Ok(AttributionResult::empty(
                Channel::Search,
                customer_id.clone(),
                conversion_id.cloned(),
                Self::MODEL_VERSION,
                reason.to_string(),
            ));
        }

        let normalized = normalize(search_raw_weights(&queries));
        let result = AttributionResult::from_normalized(
            Channel::Search,
            customer_id.clone(),
            conversion_id.cloned(),
            normalized,
            Self::CONFIDENCE,
            AttributionMethod::RuleBased,
            Self::MODEL_VERSION,
        );

        if self.write_back {
            super::write_back(self.store.as_ref(), Channel::Search, &result.contributions).await;
        }

        info!(
            touchpoints = result.touchpoint_count(),
            "search attribution computed"
        );
        Ok(result)
    }

    /// Classify a query and attach the classification to the stored record.
    ///
    /// Returns the classification even when the store update fails.
    #[instrument(skip(self, query), fields(query_id = %query.query_id))]
    pub async fn process_query(&self, query: &SearchQuery) -> Result<IntentClassification> {
        let classification = self.classifier.classify(&query.query_text).await?;
        if let Err(e) = self
            .store
            .record_intent(&query.query_id, &classification)
            .await
        {
            warn!(error = %e, "failed to record intent classification");
        }
        Ok(classification)
    }
}
