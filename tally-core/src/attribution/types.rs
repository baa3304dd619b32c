//! Attribution result types.

use serde::{Deserialize, Serialize};

use super::normalize::{Normalization, Normalized, WeightedContribution};
use crate::types::{Channel, ConversionId, CustomerId};

/// How a channel's distribution was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMethod {
    /// Search position × funnel stage × intent tables.
    RuleBased,
    /// Weights supplied by the external touchpoint scorer.
    Enhanced,
    /// Scorer failed; viewability × recency formula used instead.
    Fallback,
    /// No weights were computed (no history or channel failure).
    None,
}

/// Distribution of credit over one channel's touchpoints for a conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub conversion_id: Option<ConversionId>,
    pub channel: Channel,
    pub contributions: WeightedContribution,
    /// 1.0 when contributions are non-empty, 0.0 otherwise.
    pub total_weight: f64,
    /// Heuristic data-quality signal in [0, 1].
    pub confidence: f64,
    pub method: AttributionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<Normalization>,
    pub model_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AttributionResult {
    /// A reported empty result: no weights, zero confidence, with a reason.
    pub fn empty(
        channel: Channel,
        customer_id: CustomerId,
        conversion_id: Option<ConversionId>,
        model_version: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            customer_id,
            conversion_id,
            channel,
            contributions: WeightedContribution::new(),
            total_weight: 0.0,
            confidence: 0.0,
            method: AttributionMethod::None,
            normalization: None,
            model_version: model_version.into(),
            error: Some(error.into()),
        }
    }

    /// Result for a channel whose whole computation failed.
    pub fn failed(
        channel: Channel,
        customer_id: CustomerId,
        conversion_id: Option<ConversionId>,
        error: &crate::Error,
    ) -> Self {
        Self::empty(
            channel,
            customer_id,
            conversion_id,
            "unavailable",
            error.to_string(),
        )
    }

    /// Wrap a normalized distribution.
    pub fn from_normalized(
        channel: Channel,
        customer_id: CustomerId,
        conversion_id: Option<ConversionId>,
        normalized: Normalized,
        confidence: f64,
        method: AttributionMethod,
        model_version: impl Into<String>,
    ) -> Self {
        let total_weight = if normalized.contributions.is_empty() {
            0.0
        } else {
            1.0
        };
        Self {
            customer_id,
            conversion_id,
            channel,
            contributions: normalized.contributions,
            total_weight,
            confidence,
            method,
            normalization: Some(normalized.normalization),
            model_version: model_version.into(),
            error: None,
        }
    }

    /// Number of touchpoints that received credit.
    pub fn touchpoint_count(&self) -> usize {
        self.contributions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

/// Share of total credit given to each channel. Always sums to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelWeights {
    pub search: f64,
    pub display: f64,
}

impl ChannelWeights {
    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Search => self.search,
            Channel::Display => self.display,
        }
    }
}

/// Cross-channel blend of a search and a display result. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedAttribution {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub conversion_id: Option<ConversionId>,
    pub search: AttributionResult,
    pub display: AttributionResult,
    pub channel_weights: ChannelWeights,
    /// Flattened map keyed `search_<id>` / `display_<id>`.
    pub contributions: WeightedContribution,
    pub total_weight: f64,
}
