//! Pluggable display touchpoint scoring.
//!
//! The display engine asks a [`TouchpointScorer`] for candidate weights before
//! falling back to its own formula. Implementations may be local
//! ([`HeuristicScorer`]) or remote (`tally_models::RemoteScorer`).

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::{AdImpression, Conversion, CustomerId};

/// Everything a scorer sees for one calculation.
#[derive(Debug, Clone, Serialize)]
pub struct ScoringContext {
    pub customer_id: CustomerId,
    /// Impressions, oldest first.
    pub impressions: Vec<AdImpression>,
    pub conversion: Option<Conversion>,
}

/// Candidate weights returned by a scorer.
///
/// Weights need not be normalized. A populated `error` marks the output as
/// unusable even when `touchpoint_contributions` is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScorerOutput {
    #[serde(default)]
    pub touchpoint_contributions: BTreeMap<String, f64>,
    #[serde(default, rename = "confidence_score", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScorerOutput {
    pub fn is_usable(&self) -> bool {
        self.error.is_none() && !self.touchpoint_contributions.is_empty()
    }
}

/// Scores display touchpoints for a conversion.
#[async_trait]
pub trait TouchpointScorer: Send + Sync {
    /// Scorer identifier, reported as part of the model version.
    fn name(&self) -> &str;

    async fn score_touchpoints(&self, context: &ScoringContext) -> Result<ScorerOutput>;
}

/// Deterministic local scorer: viewability scaled by recency.
///
/// Stands in for a remote model when none is configured.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TouchpointScorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn score_touchpoints(&self, context: &ScoringContext) -> Result<ScorerOutput> {
        let n = context.impressions.len() as f64;
        let touchpoint_contributions = context
            .impressions
            .iter()
            .enumerate()
            .map(|(i, imp)| {
                let recency = (i + 1) as f64 / n;
                (imp.impression_id.clone(), imp.viewability_score * recency)
            })
            .collect();
        Ok(ScorerOutput {
            touchpoint_contributions,
            confidence: Some(0.8),
            error: None,
        })
    }
}
