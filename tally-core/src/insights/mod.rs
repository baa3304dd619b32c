//! Descriptive, advisory summaries of a customer's touchpoints.
//!
//! Nothing in attribution depends on these outputs. They are derived from the
//! same store reads the engines use and recomputed on every call.

pub mod creative;
pub mod frequency;
pub mod pattern;
pub mod strategy;
mod types;

pub use creative::{BenchmarkPosition, EngagementTier, PerformanceTier};
pub use frequency::{DEFAULT_OPTIMAL_FREQUENCY, FrequencyLevel};
pub use pattern::{
    SequencePattern, classify_sequence, count_transitions, dominant_channel, merge_sequence,
};
pub use types::{
    ComprehensiveInsights, CreativeAnalysis, CrossChannelAnalysis, CrossChannelStatus,
    DisplayInsights, FrequencyAnalysis, FrequencyStatus, OptimizationScope, OptimizationStrategy,
    PrioritizedOptimization, Priority, SearchInsights, SearchSession, VideoEngagement,
};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::store::TouchpointStore;
use crate::types::{AdImpression, CustomerId, SearchQuery, VideoInteraction};
use crate::{Error, Result};

/// Mean viewability over impressions; 0.0 when there are none.
pub fn avg_viewability(impressions: &[AdImpression]) -> f64 {
    if impressions.is_empty() {
        return 0.0;
    }
    impressions.iter().map(|i| i.viewability_score).sum::<f64>() / impressions.len() as f64
}

/// Distinct values ordered by frequency, most frequent first; ties keep
/// first-seen order.
fn by_frequency<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for value in values {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().map(|(v, _)| v.to_string()).collect()
}

fn distinct<T: PartialEq>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut out = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

pub fn search_insights(customer_id: &CustomerId, queries: &[SearchQuery]) -> SearchInsights {
    SearchInsights {
        customer_id: customer_id.clone(),
        total_searches: queries.len(),
        search_types: distinct(queries.iter().map(SearchQuery::intent_category)),
        funnel_stages: distinct(queries.iter().map(SearchQuery::stage)),
    }
}

pub fn display_insights(
    customer_id: &CustomerId,
    impressions: &[AdImpression],
    videos: &[VideoInteraction],
) -> DisplayInsights {
    DisplayInsights {
        customer_id: customer_id.clone(),
        total_impressions: impressions.len(),
        total_video_interactions: videos.len(),
        avg_viewability: avg_viewability(impressions),
        preferred_ad_formats: by_frequency(impressions.iter().map(|i| i.ad_format.as_str())),
        preferred_placements: by_frequency(
            impressions
                .iter()
                .filter_map(|i| i.placement_id.as_deref()),
        ),
        video_engagement_tier: creative::engagement_tier(creative::high_engagement_rate(videos)),
        optimal_frequency: frequency::optimal_frequency(&frequency::frequency_levels(
            impressions,
        )),
    }
}

/// Per-level click-through analysis of one campaign's impressions.
pub fn frequency_analysis(campaign_id: &str, impressions: &[AdImpression]) -> FrequencyAnalysis {
    if impressions.is_empty() {
        return FrequencyAnalysis {
            campaign_id: campaign_id.to_string(),
            status: FrequencyStatus::NoData,
            frequency_performance: Vec::new(),
            optimal_frequency: DEFAULT_OPTIMAL_FREQUENCY,
            fatigue_point: None,
            recommendations: Vec::new(),
        };
    }
    let levels = frequency::frequency_levels(impressions);
    let optimal_frequency = frequency::optimal_frequency(&levels);
    let fatigue_point = frequency::fatigue_point(&levels);
    FrequencyAnalysis {
        campaign_id: campaign_id.to_string(),
        status: FrequencyStatus::Analyzed,
        frequency_performance: levels,
        optimal_frequency,
        fatigue_point,
        recommendations: frequency::frequency_recommendations(optimal_frequency, fatigue_point),
    }
}

/// Summarize one session's queries. `None` when the session has none.
pub fn search_session(session_id: &str, queries: &[SearchQuery]) -> Option<SearchSession> {
    let mut ordered: Vec<&SearchQuery> = queries.iter().collect();
    ordered.sort_by_key(|q| q.timestamp);
    let (first, last) = (*ordered.first()?, *ordered.last()?);

    Some(SearchSession {
        session_id: session_id.to_string(),
        customer_id: first.customer_id.clone(),
        started_at: first.timestamp,
        ended_at: last.timestamp,
        duration_seconds: (last.timestamp - first.timestamp).num_seconds(),
        total_queries: queries.len(),
        query_ids: ordered.iter().map(|q| q.query_id.clone()).collect(),
        search_types: distinct(ordered.iter().map(|q| q.intent_category())),
        funnel_stages: distinct(ordered.iter().map(|q| q.stage())),
        furthest_stage: ordered.iter().map(|q| q.stage()).max()?,
    })
}

pub fn video_engagement(customer_id: &CustomerId, videos: &[VideoInteraction]) -> VideoEngagement {
    let avg_completion_rate = creative::avg_completion_rate(videos);
    let high_engagement_rate = creative::high_engagement_rate(videos);
    let recommendations = if videos.is_empty() {
        Vec::new()
    } else {
        creative::video_recommendations(avg_completion_rate)
    };
    VideoEngagement {
        customer_id: customer_id.clone(),
        total_videos: videos.len(),
        avg_completion_rate,
        high_engagement_rate,
        avg_engagement_points: creative::avg_engagement_points(videos),
        engagement_tier: creative::engagement_tier(high_engagement_rate),
        recommendations,
    }
}

pub fn cross_channel_analysis(
    customer_id: &CustomerId,
    queries: &[SearchQuery],
    impressions: &[AdImpression],
) -> CrossChannelAnalysis {
    if queries.is_empty() || impressions.is_empty() {
        return CrossChannelAnalysis {
            customer_id: customer_id.clone(),
            status: CrossChannelStatus::InsufficientData,
            search_count: queries.len(),
            display_count: impressions.len(),
            full_sequence: Vec::new(),
            sequence_pattern: SequencePattern::NoPattern,
            channel_transitions: Default::default(),
            dominant_channel: None,
        };
    }
    let sequence = merge_sequence(queries, impressions);
    CrossChannelAnalysis {
        customer_id: customer_id.clone(),
        status: CrossChannelStatus::Analyzed,
        search_count: queries.len(),
        display_count: impressions.len(),
        sequence_pattern: classify_sequence(&sequence),
        channel_transitions: count_transitions(&sequence),
        dominant_channel: dominant_channel(&sequence),
        full_sequence: sequence,
    }
}

/// Store-backed insight queries.
#[derive(Clone)]
pub struct InsightsSummarizer {
    store: Arc<dyn TouchpointStore>,
}

impl InsightsSummarizer {
    pub fn new(store: Arc<dyn TouchpointStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn search_insights(&self, customer_id: &CustomerId) -> Result<SearchInsights> {
        let queries = self.store.search_history(customer_id).await?;
        Ok(search_insights(customer_id, &queries))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn display_insights(&self, customer_id: &CustomerId) -> Result<DisplayInsights> {
        let (impressions, videos) = tokio::try_join!(
            self.store.display_history(customer_id),
            self.store.video_interactions(customer_id),
        )?;
        Ok(display_insights(customer_id, &impressions, &videos))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn video_engagement(&self, customer_id: &CustomerId) -> Result<VideoEngagement> {
        let videos = self.store.video_interactions(customer_id).await?;
        Ok(video_engagement(customer_id, &videos))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn cross_channel(&self, customer_id: &CustomerId) -> Result<CrossChannelAnalysis> {
        let (queries, impressions) = tokio::try_join!(
            self.store.search_history(customer_id),
            self.store.display_history(customer_id),
        )?;
        Ok(cross_channel_analysis(customer_id, &queries, &impressions))
    }

    /// Search, display and cross-channel insights with unified recommendations.
    #[instrument(skip(self), level = "debug")]
    pub async fn comprehensive(&self, customer_id: &CustomerId) -> Result<ComprehensiveInsights> {
        let (queries, impressions, videos) = tokio::try_join!(
            self.store.search_history(customer_id),
            self.store.display_history(customer_id),
            self.store.video_interactions(customer_id),
        )?;

        let search = search_insights(customer_id, &queries);
        let display = display_insights(customer_id, &impressions, &videos);
        let cross_channel = cross_channel_analysis(customer_id, &queries, &impressions);
        let unified_recommendations =
            strategy::unified_recommendations(&search, &display, &cross_channel);
        debug!(
            recommendations = unified_recommendations.len(),
            pattern = %cross_channel.sequence_pattern,
            "comprehensive insights built"
        );

        Ok(ComprehensiveInsights {
            customer_id: customer_id.clone(),
            search,
            display,
            cross_channel,
            unified_recommendations,
        })
    }

    /// Optimization strategy built on comprehensive insights.
    pub async fn optimization_strategy(
        &self,
        customer_id: &CustomerId,
        goals: Vec<String>,
    ) -> Result<OptimizationStrategy> {
        let insights = self.comprehensive(customer_id).await?;
        Ok(strategy::build_strategy(&insights, goals))
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn frequency_analysis(&self, campaign_id: &str) -> Result<FrequencyAnalysis> {
        let impressions = self.store.campaign_impressions(campaign_id).await?;
        let analysis = frequency_analysis(campaign_id, &impressions);
        debug!(
            levels = analysis.frequency_performance.len(),
            optimal = analysis.optimal_frequency,
            "frequency analysis built"
        );
        Ok(analysis)
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn search_session(&self, session_id: &str) -> Result<SearchSession> {
        let queries = self.store.session_queries(session_id).await?;
        search_session(session_id, &queries).ok_or_else(|| Error::NotFound {
            kind: "session",
            id: session_id.to_string(),
        })
    }

    /// Tier, benchmark and recommendations for one creative.
    #[instrument(skip(self), level = "debug")]
    pub async fn creative_analysis(&self, creative_id: &str) -> Result<CreativeAnalysis> {
        let creative = self
            .store
            .creative_performance(creative_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                kind: "creative",
                id: creative_id.to_string(),
            })?;
        let impressions = self.store.creative_impressions(creative_id).await?;

        Ok(CreativeAnalysis {
            performance_tier: creative::performance_tier(
                creative.click_through_rate,
                creative.conversion_rate,
            ),
            ctr_vs_benchmark: creative::ctr_vs_benchmark(creative.click_through_rate),
            recommendations: creative::creative_recommendations(&creative),
            impression_count: impressions.len(),
            click_through_rate: creative.click_through_rate,
            conversion_rate: creative.conversion_rate,
            avg_viewability: creative.avg_viewability,
            brand_lift_score: creative.brand_lift_score,
            creative_id: creative.creative_id,
            creative_name: creative.creative_name,
        })
    }
}
