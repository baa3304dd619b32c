//! Touchpoint store traits.
//!
//! The store is split the same way reads and writes are split for callers:
//! - [`TouchpointStore`] - time-ordered lookups plus the attribution write-back
//! - [`TouchpointIngest`] - recording new touchpoint facts
//!
//! Every list returned by [`TouchpointStore`] is ordered by timestamp,
//! oldest first. The engines rely on that order for position weighting.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::Result;
use crate::types::{
    AdImpression, Channel, Conversion, ConversionId, CreativePerformance, CustomerId,
    IntentClassification, SearchQuery, VideoInteraction,
};

/// Read side of the touchpoint store, plus attribution write-back.
#[async_trait]
pub trait TouchpointStore: Send + Sync {
    /// All search queries for a customer, oldest first.
    async fn search_history(&self, customer_id: &CustomerId) -> Result<Vec<SearchQuery>>;

    /// All display impressions for a customer, oldest first.
    async fn display_history(&self, customer_id: &CustomerId) -> Result<Vec<AdImpression>>;

    /// All video interactions for a customer, oldest first.
    async fn video_interactions(&self, customer_id: &CustomerId)
    -> Result<Vec<VideoInteraction>>;

    /// A conversion by id.
    async fn conversion(&self, id: &ConversionId) -> Result<Option<Conversion>>;

    /// Aggregate performance for a creative.
    async fn creative_performance(&self, creative_id: &str)
    -> Result<Option<CreativePerformance>>;

    /// All impressions served for a creative, oldest first.
    async fn creative_impressions(&self, creative_id: &str) -> Result<Vec<AdImpression>>;

    /// All impressions served for a campaign, oldest first.
    async fn campaign_impressions(&self, campaign_id: &str) -> Result<Vec<AdImpression>>;

    /// All queries recorded in one search session, oldest first.
    async fn session_queries(&self, session_id: &str) -> Result<Vec<SearchQuery>>;

    /// Last attribution weight written for a touchpoint.
    async fn attribution_weight(&self, channel: Channel, touchpoint_id: &str)
    -> Result<Option<f64>>;

    /// Persist the attribution weight for a touchpoint, replacing any previous value.
    async fn record_attribution_weight(
        &self,
        channel: Channel,
        touchpoint_id: &str,
        weight: f64,
    ) -> Result<()>;

    /// Attach an intent classification to a stored query.
    async fn record_intent(
        &self,
        query_id: &str,
        classification: &IntentClassification,
    ) -> Result<()>;
}

/// Write side of the touchpoint store.
#[async_trait]
pub trait TouchpointIngest: Send + Sync {
    async fn insert_query(&self, query: &SearchQuery) -> Result<()>;

    async fn insert_impression(&self, impression: &AdImpression) -> Result<()>;

    async fn insert_video_interaction(&self, interaction: &VideoInteraction) -> Result<()>;

    async fn insert_conversion(&self, conversion: &Conversion) -> Result<()>;

    /// Insert or replace a creative's performance record.
    async fn upsert_creative(&self, creative: &CreativePerformance) -> Result<()>;
}
