//! Advisory insight records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};

use super::creative::{BenchmarkPosition, EngagementTier, PerformanceTier};
use super::frequency::FrequencyLevel;
use super::pattern::SequencePattern;
use crate::attribution::ChannelWeights;
use crate::types::{Channel, CustomerId, FunnelStage, QueryIntent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchInsights {
    pub customer_id: CustomerId,
    pub total_searches: usize,
    /// Distinct intent categories, in first-seen order.
    pub search_types: Vec<QueryIntent>,
    /// Distinct funnel stages, in first-seen order.
    pub funnel_stages: Vec<FunnelStage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInsights {
    pub customer_id: CustomerId,
    pub total_impressions: usize,
    pub total_video_interactions: usize,
    pub avg_viewability: f64,
    /// Ad formats, most frequent first.
    pub preferred_ad_formats: Vec<String>,
    /// Placements, most frequent first.
    pub preferred_placements: Vec<String>,
    pub video_engagement_tier: EngagementTier,
    /// Frequency cap suggested by this customer's click history.
    pub optimal_frequency: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEngagement {
    pub customer_id: CustomerId,
    pub total_videos: usize,
    pub avg_completion_rate: f64,
    pub high_engagement_rate: f64,
    pub avg_engagement_points: f64,
    pub engagement_tier: EngagementTier,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeAnalysis {
    pub creative_id: String,
    pub creative_name: String,
    pub performance_tier: PerformanceTier,
    pub ctr_vs_benchmark: BenchmarkPosition,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub avg_viewability: f64,
    pub brand_lift_score: f64,
    /// Impressions recorded for this creative in the store.
    pub impression_count: usize,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossChannelStatus {
    Analyzed,
    /// At least one channel has no touchpoints.
    InsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossChannelAnalysis {
    pub customer_id: CustomerId,
    pub status: CrossChannelStatus,
    pub search_count: usize,
    pub display_count: usize,
    /// Chronological channel sequence; empty when data is insufficient.
    pub full_sequence: Vec<Channel>,
    pub sequence_pattern: SequencePattern,
    pub channel_transitions: BTreeMap<String, usize>,
    pub dominant_channel: Option<Channel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveInsights {
    pub customer_id: CustomerId,
    pub search: SearchInsights,
    pub display: DisplayInsights,
    pub cross_channel: CrossChannelAnalysis,
    pub unified_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationScope {
    CrossChannel,
    Search,
    Display,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedOptimization {
    pub optimization: String,
    pub priority: Priority,
    pub scope: OptimizationScope,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationStrategy {
    pub customer_id: CustomerId,
    /// Caller-supplied goals, echoed back.
    pub goals: Vec<String>,
    pub search_optimizations: Vec<String>,
    pub display_optimizations: Vec<String>,
    pub cross_channel_optimizations: Vec<String>,
    pub budget_allocation: ChannelWeights,
    pub implementation_priority: Vec<PrioritizedOptimization>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyStatus {
    Analyzed,
    /// The campaign has no recorded impressions.
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAnalysis {
    pub campaign_id: String,
    pub status: FrequencyStatus,
    /// Per-level aggregates, lowest level first.
    pub frequency_performance: Vec<FrequencyLevel>,
    pub optimal_frequency: u32,
    pub fatigue_point: Option<u32>,
    pub recommendations: Vec<String>,
}

/// One search session summarized end to end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSession {
    pub session_id: String,
    pub customer_id: CustomerId,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub total_queries: usize,
    /// Query ids in chronological order.
    pub query_ids: Vec<String>,
    pub search_types: Vec<QueryIntent>,
    pub funnel_stages: Vec<FunnelStage>,
    /// Deepest stage the session reached.
    pub furthest_stage: FunnelStage,
}
