//! Frequency-capping analysis.
//!
//! Impressions are grouped by the frequency level they were served at (the
//! `frequency_cap_count` on each impression). The level with the best
//! click-through rate is the recommended cap.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::AdImpression;

/// Recommended cap when there is no click signal to learn from.
pub const DEFAULT_OPTIMAL_FREQUENCY: u32 = 2;

/// A level past the optimum is fatigued once its click-through rate falls
/// below this fraction of the optimum's.
pub const FATIGUE_RATIO: f64 = 0.5;

/// Aggregates for the impressions served at one frequency level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyLevel {
    pub frequency_level: u32,
    pub impression_count: usize,
    pub unique_customers: usize,
    pub avg_viewability: f64,
    pub clicks: usize,
    pub click_through_rate: f64,
    pub avg_cost: f64,
}

/// Group impressions by frequency level, lowest level first.
pub fn frequency_levels(impressions: &[AdImpression]) -> Vec<FrequencyLevel> {
    let mut groups: BTreeMap<u32, Vec<&AdImpression>> = BTreeMap::new();
    for impression in impressions {
        groups
            .entry(impression.frequency_cap_count)
            .or_default()
            .push(impression);
    }

    groups
        .into_iter()
        .map(|(frequency_level, group)| {
            let count = group.len() as f64;
            let clicks = group.iter().filter(|i| i.clicked).count();
            let customers: HashSet<&str> =
                group.iter().map(|i| i.customer_id.as_str()).collect();
            FrequencyLevel {
                frequency_level,
                impression_count: group.len(),
                unique_customers: customers.len(),
                avg_viewability: group.iter().map(|i| i.viewability_score).sum::<f64>() / count,
                clicks,
                click_through_rate: clicks as f64 / count,
                avg_cost: group.iter().map(|i| i.cost).sum::<f64>() / count,
            }
        })
        .collect()
}

/// Level with the highest click-through rate; the lower level wins a tie.
/// [`DEFAULT_OPTIMAL_FREQUENCY`] when no level has any clicks.
pub fn optimal_frequency(levels: &[FrequencyLevel]) -> u32 {
    best_level(levels)
        .map(|level| level.frequency_level)
        .unwrap_or(DEFAULT_OPTIMAL_FREQUENCY)
}

/// First level above the optimum whose click-through rate has dropped below
/// [`FATIGUE_RATIO`] of the optimum's.
pub fn fatigue_point(levels: &[FrequencyLevel]) -> Option<u32> {
    let best = best_level(levels)?;
    let threshold = best.click_through_rate * FATIGUE_RATIO;
    levels
        .iter()
        .filter(|level| level.frequency_level > best.frequency_level)
        .find(|level| level.click_through_rate < threshold)
        .map(|level| level.frequency_level)
}

fn best_level(levels: &[FrequencyLevel]) -> Option<&FrequencyLevel> {
    levels
        .iter()
        .filter(|level| level.clicks > 0)
        .fold(None, |best: Option<&FrequencyLevel>, level| match best {
            Some(b) if b.click_through_rate >= level.click_through_rate => Some(b),
            _ => Some(level),
        })
}

pub fn frequency_recommendations(optimal: u32, fatigue: Option<u32>) -> Vec<String> {
    let mut recommendations = vec![format!("Cap frequency at {optimal} impressions per customer")];
    if let Some(level) = fatigue {
        recommendations.push(format!(
            "Click-through drops sharply by frequency {level}; stop serving before it"
        ));
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CustomerId;
    use chrono::Utc;

    fn served(customer: &str, level: u32, clicked: bool, cost: f64) -> AdImpression {
        AdImpression {
            impression_id: format!("{customer}_{level}"),
            customer_id: CustomerId::from(customer),
            creative_id: "cr1".into(),
            campaign_id: Some("camp_1".into()),
            placement_id: None,
            ad_format: "banner".into(),
            viewability_score: 0.5,
            view_duration_seconds: None,
            timestamp: Utc::now(),
            frequency_cap_count: level,
            cost,
            clicked,
        }
    }

    fn campaign() -> Vec<AdImpression> {
        vec![
            served("a", 1, false, 0.1),
            served("b", 1, true, 0.3),
            served("a", 2, true, 0.2),
            served("b", 2, true, 0.2),
            served("a", 3, false, 0.2),
            served("b", 3, true, 0.2),
            served("c", 3, false, 0.2),
            served("d", 3, false, 0.2),
        ]
    }

    #[test]
    fn levels_aggregate_per_frequency() {
        let levels = frequency_levels(&campaign());

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].frequency_level, 1);
        assert_eq!(levels[0].impression_count, 2);
        assert_eq!(levels[0].unique_customers, 2);
        assert_eq!(levels[0].clicks, 1);
        assert!((levels[0].click_through_rate - 0.5).abs() < 1e-12);
        assert!((levels[0].avg_cost - 0.2).abs() < 1e-12);
        assert!((levels[2].click_through_rate - 0.25).abs() < 1e-12);
        assert_eq!(levels[2].unique_customers, 4);
    }

    #[test]
    fn best_click_through_level_is_optimal() {
        let levels = frequency_levels(&campaign());
        assert_eq!(optimal_frequency(&levels), 2);
    }

    #[test]
    fn fatigue_is_first_level_below_half_the_optimum() {
        let levels = frequency_levels(&campaign());
        // optimum CTR 1.0 at level 2; level 3 sits at 0.25
        assert_eq!(fatigue_point(&levels), Some(3));
    }

    #[test]
    fn tie_prefers_lower_level() {
        let levels = frequency_levels(&[served("a", 4, true, 0.1), served("a", 1, true, 0.1)]);
        assert_eq!(optimal_frequency(&levels), 1);
        assert_eq!(fatigue_point(&levels), None);
    }

    #[test]
    fn no_clicks_falls_back_to_default() {
        let levels = frequency_levels(&[served("a", 5, false, 0.1)]);
        assert_eq!(optimal_frequency(&levels), DEFAULT_OPTIMAL_FREQUENCY);
        assert_eq!(optimal_frequency(&[]), DEFAULT_OPTIMAL_FREQUENCY);
        assert_eq!(fatigue_point(&levels), None);
    }

    #[test]
    fn recommendations_mention_fatigue_only_when_found() {
        assert_eq!(frequency_recommendations(2, None).len(), 1);
        let with_fatigue = frequency_recommendations(2, Some(4));
        assert_eq!(with_fatigue.len(), 2);
        assert!(with_fatigue[1].contains('4'));
    }
}
