//! Weight normalization shared by both channel engines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tolerance within which a non-empty contribution map must sum to 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Touchpoint id to non-negative credit.
///
/// Sums to 1.0 (within [`WEIGHT_TOLERANCE`]) whenever non-empty. Ordered by
/// key so repeated calculations serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedContribution(BTreeMap<String, f64>);

impl WeightedContribution {
    /// An empty distribution.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, touchpoint_id: &str) -> Option<f64> {
        self.0.get(touchpoint_id).copied()
    }

    pub fn contains(&self, touchpoint_id: &str) -> bool {
        self.0.contains_key(touchpoint_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// True when empty or summing to 1.0 within tolerance.
    pub fn is_normalized(&self) -> bool {
        self.is_empty() || (self.total() - 1.0).abs() <= WEIGHT_TOLERANCE
    }

    /// Build from entries that are already normalized as a whole, e.g. the
    /// union of two disjoint scaled channel maps.
    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }
}

/// How a raw weight map was turned into a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Each weight divided by the sum of raw weights.
    Proportional,
    /// Raw weights summed to zero; every touchpoint received `1/N`.
    EqualSplit,
}

/// A normalized distribution and the rule that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub contributions: WeightedContribution,
    pub normalization: Normalization,
}

/// Normalize raw `(touchpoint_id, weight)` pairs into a distribution.
///
/// Negative and non-finite raw weights count as zero. Repeated ids
/// accumulate. If the raw weights sum to exactly zero, every touchpoint gets
/// an equal share. Weights are scaled by their maximum before summing so
/// large finite inputs cannot overflow the total.
pub fn normalize<I>(raw: I) -> Normalized
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut weights: BTreeMap<String, f64> = BTreeMap::new();
    for (id, weight) in raw {
        let weight = if weight.is_finite() && weight > 0.0 {
            weight
        } else {
            0.0
        };
        *weights.entry(id).or_insert(0.0) += weight;
    }

    if weights.is_empty() {
        return Normalized {
            contributions: WeightedContribution::new(),
            normalization: Normalization::Proportional,
        };
    }

    let max = weights.values().copied().fold(0.0, f64::max);
    if max == 0.0 {
        let share = 1.0 / weights.len() as f64;
        debug!(
            touchpoints = weights.len(),
            "raw weights sum to zero, splitting credit equally"
        );
        for weight in weights.values_mut() {
            *weight = share;
        }
        return Normalized {
            contributions: WeightedContribution(weights),
            normalization: Normalization::EqualSplit,
        };
    }

    for weight in weights.values_mut() {
        *weight /= max;
    }
    // Every scaled weight is in [0, 1] and one of them is 1.0.
    let total: f64 = weights.values().sum();
    for weight in weights.values_mut() {
        *weight /= total;
    }
    Normalized {
        contributions: WeightedContribution(weights),
        normalization: Normalization::Proportional,
    }
}
