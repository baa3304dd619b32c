//! Creative and video engagement scoring.

use serde::{Deserialize, Serialize};

use crate::types::{CreativePerformance, VideoInteraction};

/// Click-through rate above which a creative beats the benchmark.
pub const CTR_BENCHMARK: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    TopPerformer,
    GoodPerformer,
    AveragePerformer,
    Underperformer,
}

/// Tier a creative by click-through and conversion rate.
pub fn performance_tier(ctr: f64, cvr: f64) -> PerformanceTier {
    if ctr >= 0.05 && cvr >= 0.03 {
        PerformanceTier::TopPerformer
    } else if ctr >= 0.03 || cvr >= 0.02 {
        PerformanceTier::GoodPerformer
    } else if ctr >= 0.02 || cvr >= 0.01 {
        PerformanceTier::AveragePerformer
    } else {
        PerformanceTier::Underperformer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkPosition {
    Above,
    Below,
}

pub fn ctr_vs_benchmark(ctr: f64) -> BenchmarkPosition {
    if ctr > CTR_BENCHMARK {
        BenchmarkPosition::Above
    } else {
        BenchmarkPosition::Below
    }
}

/// Threshold-driven optimization advice for a creative.
pub fn creative_recommendations(creative: &CreativePerformance) -> Vec<String> {
    let mut recommendations = Vec::new();
    if creative.click_through_rate < 0.025 {
        recommendations
            .push("Improve creative engagement: test different hooks or calls to action".into());
    }
    if creative.conversion_rate < 0.015 {
        recommendations.push("Align landing pages with the creative's messaging".into());
    }
    if creative.avg_viewability < 0.70 {
        recommendations.push("Review placement strategy and favor above-the-fold positions".into());
    }
    recommendations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementTier {
    High,
    Medium,
    Low,
}

/// Completion rate at or above which a single view counts as high engagement.
pub const HIGH_ENGAGEMENT_COMPLETION: f64 = 0.75;

/// Share of interactions that reached [`HIGH_ENGAGEMENT_COMPLETION`].
pub fn high_engagement_rate(videos: &[VideoInteraction]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    let high = videos
        .iter()
        .filter(|v| v.completion_rate >= HIGH_ENGAGEMENT_COMPLETION)
        .count();
    high as f64 / videos.len() as f64
}

/// Tier from the high-engagement rate: > 0.6 high, > 0.3 medium.
pub fn engagement_tier(high_engagement_rate: f64) -> EngagementTier {
    if high_engagement_rate > 0.6 {
        EngagementTier::High
    } else if high_engagement_rate > 0.3 {
        EngagementTier::Medium
    } else {
        EngagementTier::Low
    }
}

pub fn avg_completion_rate(videos: &[VideoInteraction]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    videos.iter().map(|v| v.completion_rate).sum::<f64>() / videos.len() as f64
}

pub fn avg_engagement_points(videos: &[VideoInteraction]) -> f64 {
    if videos.is_empty() {
        return 0.0;
    }
    videos
        .iter()
        .map(|v| f64::from(v.engagement_points))
        .sum::<f64>()
        / videos.len() as f64
}

/// Advice keyed off average completion.
pub fn video_recommendations(avg_completion: f64) -> Vec<String> {
    let advice: [&str; 2] = if avg_completion >= 0.75 {
        ["Continue the current video strategy", "Increase video frequency"]
    } else if avg_completion >= 0.50 {
        ["Optimize video length", "Strengthen the opening hook"]
    } else {
        ["Shorten videos", "Test new creative themes"]
    };
    advice.iter().map(|s| s.to_string()).collect()
}
