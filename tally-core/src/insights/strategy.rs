//! Recommendations and budget allocation derived from insights.

use super::pattern::SequencePattern;
use super::types::{
    ComprehensiveInsights, CrossChannelAnalysis, DisplayInsights, OptimizationScope,
    OptimizationStrategy, PrioritizedOptimization, Priority, SearchInsights,
};
use crate::attribution::ChannelWeights;
use crate::types::{FunnelStage, QueryIntent};

/// Below this many searches, search coverage is considered thin.
pub const FEW_SEARCHES: usize = 5;
/// Below this many impressions, display reach is considered thin.
pub const FEW_IMPRESSIONS: usize = 10;
/// Below this average viewability, placements need work.
pub const LOW_VIEWABILITY: f64 = 0.7;

pub fn unified_recommendations(
    search: &SearchInsights,
    display: &DisplayInsights,
    cross_channel: &CrossChannelAnalysis,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if search.total_searches < FEW_SEARCHES {
        recommendations.push(
            "Increase search marketing investment to capture more customer touchpoints".into(),
        );
    }
    if display.total_impressions < FEW_IMPRESSIONS {
        recommendations
            .push("Expand display advertising reach to increase brand awareness".into());
    }
    if display.total_impressions > 0 && display.avg_viewability < LOW_VIEWABILITY {
        recommendations.push("Optimize display placements for better viewability".into());
    }
    match cross_channel.sequence_pattern {
        SequencePattern::DisplayToSearch => recommendations.push(
            "Display ads are driving search behavior; increase display investment".into(),
        ),
        SequencePattern::SearchToDisplay => recommendations.push(
            "Search is driving display engagement; optimize display retargeting".into(),
        ),
        _ => {}
    }
    recommendations
}

pub fn search_optimizations(search: &SearchInsights) -> Vec<String> {
    let mut optimizations = Vec::new();
    if search.total_searches == 0 {
        return optimizations;
    }
    if !search.search_types.contains(&QueryIntent::Transactional) {
        optimizations.push("Target more transactional keywords".into());
    }
    if !search.funnel_stages.contains(&FunnelStage::Decision) {
        optimizations.push("Add decision-stage keyword targeting".into());
    }
    optimizations
}

pub fn display_optimizations(display: &DisplayInsights) -> Vec<String> {
    let mut optimizations = Vec::new();
    if display.total_impressions > 0 && display.avg_viewability < LOW_VIEWABILITY {
        optimizations.push("Improve ad placement for better viewability".into());
    }
    if display.total_impressions > 0 {
        optimizations.push(format!(
            "Optimize frequency capping to {}",
            display.optimal_frequency
        ));
    }
    optimizations
}

pub fn cross_channel_optimizations(cross_channel: &CrossChannelAnalysis) -> Vec<String> {
    match cross_channel.sequence_pattern {
        SequencePattern::DisplayToSearch => {
            vec!["Increase display investment to drive more search activity".into()]
        }
        SequencePattern::SearchToDisplay => {
            vec!["Enhance display retargeting for search users".into()]
        }
        _ => Vec::new(),
    }
}

/// Split budget by channel activity: search saturates at 10 searches,
/// display at 50 impressions. Even split when both channels are idle.
pub fn budget_allocation(total_searches: usize, total_impressions: usize) -> ChannelWeights {
    let search_score = f64::min(total_searches as f64 / 10.0, 1.0);
    let display_score = f64::min(total_impressions as f64 / 50.0, 1.0);
    let total = search_score + display_score;
    if total == 0.0 {
        return ChannelWeights {
            search: 0.5,
            display: 0.5,
        };
    }
    ChannelWeights {
        search: search_score / total,
        display: display_score / total,
    }
}

/// Cross-channel items first at high priority, then channel items at medium.
pub fn prioritize(
    cross_channel: &[String],
    search: &[String],
    display: &[String],
) -> Vec<PrioritizedOptimization> {
    let tagged = |items: &[String], priority, scope| {
        items
            .iter()
            .map(move |optimization| PrioritizedOptimization {
                optimization: optimization.clone(),
                priority,
                scope,
            })
            .collect::<Vec<_>>()
    };
    let mut out = tagged(cross_channel, Priority::High, OptimizationScope::CrossChannel);
    out.extend(tagged(search, Priority::Medium, OptimizationScope::Search));
    out.extend(tagged(display, Priority::Medium, OptimizationScope::Display));
    out
}

/// Assemble an optimization strategy from comprehensive insights.
pub fn build_strategy(insights: &ComprehensiveInsights, goals: Vec<String>) -> OptimizationStrategy {
    let search_optimizations = search_optimizations(&insights.search);
    let display_optimizations = display_optimizations(&insights.display);
    let cross_channel_optimizations = cross_channel_optimizations(&insights.cross_channel);
    let implementation_priority = prioritize(
        &cross_channel_optimizations,
        &search_optimizations,
        &display_optimizations,
    );
    OptimizationStrategy {
        customer_id: insights.customer_id.clone(),
        goals,
        budget_allocation: budget_allocation(
            insights.search.total_searches,
            insights.display.total_impressions,
        ),
        search_optimizations,
        display_optimizations,
        cross_channel_optimizations,
        implementation_priority,
    }
}
