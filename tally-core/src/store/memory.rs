//! In-memory touchpoint store for tests and ephemeral runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{TouchpointIngest, TouchpointStore};
use crate::types::{
    AdImpression, Channel, Conversion, ConversionId, CreativePerformance, CustomerId,
    IntentClassification, SearchQuery, VideoInteraction,
};
use crate::{Error, Result};

#[derive(Default)]
struct Tables {
    queries: Vec<SearchQuery>,
    impressions: Vec<AdImpression>,
    videos: Vec<VideoInteraction>,
    conversions: HashMap<ConversionId, Conversion>,
    creatives: HashMap<String, CreativePerformance>,
    weights: HashMap<(Channel, String), f64>,
}

/// Touchpoint store backed by in-process vectors.
///
/// Lists are returned in timestamp order; records with equal timestamps keep
/// insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_time<T>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> i64) -> Vec<T> {
    let mut out: Vec<T> = items.collect();
    out.sort_by_key(|item| key(item));
    out
}

fn duplicate(kind: &'static str, id: &str) -> Error {
    Error::AlreadyExists {
        kind,
        id: id.to_string(),
    }
}

#[async_trait]
impl TouchpointStore for MemoryStore {
    async fn search_history(&self, customer_id: &CustomerId) -> Result<Vec<SearchQuery>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_time(
            tables
                .queries
                .iter()
                .filter(|q| &q.customer_id == customer_id)
                .cloned(),
            |q| q.timestamp.timestamp_micros(),
        ))
    }

    async fn display_history(&self, customer_id: &CustomerId) -> Result<Vec<AdImpression>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_time(
            tables
                .impressions
                .iter()
                .filter(|i| &i.customer_id == customer_id)
                .cloned(),
            |i| i.timestamp.timestamp_micros(),
        ))
    }

    async fn video_interactions(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<VideoInteraction>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_time(
            tables
                .videos
                .iter()
                .filter(|v| &v.customer_id == customer_id)
                .cloned(),
            |v| v.timestamp.timestamp_micros(),
        ))
    }

    async fn conversion(&self, id: &ConversionId) -> Result<Option<Conversion>> {
        Ok(self.tables.read().await.conversions.get(id).cloned())
    }

    async fn creative_performance(
        &self,
        creative_id: &str,
    ) -> Result<Option<CreativePerformance>> {
        Ok(self.tables.read().await.creatives.get(creative_id).cloned())
    }

    async fn creative_impressions(&self, creative_id: &str) -> Result<Vec<AdImpression>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_time(
            tables
                .impressions
                .iter()
                .filter(|i| i.creative_id == creative_id)
                .cloned(),
            |i| i.timestamp.timestamp_micros(),
        ))
    }

    async fn campaign_impressions(&self, campaign_id: &str) -> Result<Vec<AdImpression>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_time(
            tables
                .impressions
                .iter()
                .filter(|i| i.campaign_id.as_deref() == Some(campaign_id))
                .cloned(),
            |i| i.timestamp.timestamp_micros(),
        ))
    }

    async fn session_queries(&self, session_id: &str) -> Result<Vec<SearchQuery>> {
        let tables = self.tables.read().await;
        Ok(sorted_by_time(
            tables
                .queries
                .iter()
                .filter(|q| q.session_id.as_deref() == Some(session_id))
                .cloned(),
            |q| q.timestamp.timestamp_micros(),
        ))
    }

    async fn attribution_weight(
        &self,
        channel: Channel,
        touchpoint_id: &str,
    ) -> Result<Option<f64>> {
        Ok(self
            .tables
            .read()
            .await
            .weights
            .get(&(channel, touchpoint_id.to_string()))
            .copied())
    }

    async fn record_attribution_weight(
        &self,
        channel: Channel,
        touchpoint_id: &str,
        weight: f64,
    ) -> Result<()> {
        self.tables
            .write()
            .await
            .weights
            .insert((channel, touchpoint_id.to_string()), weight);
        Ok(())
    }

    async fn record_intent(
        &self,
        query_id: &str,
        classification: &IntentClassification,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let query = tables
            .queries
            .iter_mut()
            .find(|q| q.query_id == query_id)
            .ok_or_else(|| Error::NotFound {
                kind: "query",
                id: query_id.to_string(),
            })?;
        query.intent = Some(classification.clone());
        Ok(())
    }
}

#[async_trait]
impl TouchpointIngest for MemoryStore {
    async fn insert_query(&self, query: &SearchQuery) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.queries.iter().any(|q| q.query_id == query.query_id) {
            return Err(duplicate("query", &query.query_id));
        }
        tables.queries.push(query.clone());
        Ok(())
    }

    async fn insert_impression(&self, impression: &AdImpression) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .impressions
            .iter()
            .any(|i| i.impression_id == impression.impression_id)
        {
            return Err(duplicate("impression", &impression.impression_id));
        }
        tables.impressions.push(impression.clone());
        Ok(())
    }

    async fn insert_video_interaction(&self, interaction: &VideoInteraction) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables
            .videos
            .iter()
            .any(|v| v.interaction_id == interaction.interaction_id)
        {
            return Err(duplicate("video interaction", &interaction.interaction_id));
        }
        tables.videos.push(interaction.clone());
        Ok(())
    }

    async fn insert_conversion(&self, conversion: &Conversion) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.conversions.contains_key(&conversion.conversion_id) {
            return Err(duplicate("conversion", conversion.conversion_id.as_str()));
        }
        tables
            .conversions
            .insert(conversion.conversion_id.clone(), conversion.clone());
        Ok(())
    }

    async fn upsert_creative(&self, creative: &CreativePerformance) -> Result<()> {
        self.tables
            .write()
            .await
            .creatives
            .insert(creative.creative_id.clone(), creative.clone());
        Ok(())
    }
}
