//! Display channel attribution.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::normalize::normalize;
use super::search::position_weight;
use super::types::{AttributionMethod, AttributionResult};
use crate::scorer::{ScorerOutput, ScoringContext, TouchpointScorer};
use crate::store::TouchpointStore;
use crate::types::{AdImpression, Channel, ConversionId, CustomerId};
use crate::{Error, Result};

/// `viewability * (i+1)/N` for each impression, in order.
pub fn fallback_weights(impressions: &[AdImpression]) -> Vec<(String, f64)> {
    let n = impressions.len();
    impressions
        .iter()
        .enumerate()
        .map(|(i, imp)| {
            (
                imp.impression_id.clone(),
                imp.viewability_score * position_weight(i, n),
            )
        })
        .collect()
}

/// Heuristic data-quality confidence for a display result.
///
/// 0.5 base, +0.25 when the scorer answered without an error marker, +0.15
/// for at least two impressions, +0.1 when more than 80% of impressions have
/// non-zero viewability. Capped at 1.0.
pub fn display_confidence(scorer_succeeded: bool, impressions: &[AdImpression]) -> f64 {
    if impressions.is_empty() {
        return 0.0;
    }
    let mut confidence = 0.5;
    if scorer_succeeded {
        confidence += 0.25;
    }
    if impressions.len() >= 2 {
        confidence += 0.15;
    }
    let viewable = impressions
        .iter()
        .filter(|imp| imp.viewability_score > 0.0)
        .count();
    if viewable as f64 / impressions.len() as f64 > 0.8 {
        confidence += 0.1;
    }
    f64::min(confidence, 1.0)
}

/// Keep only scorer weights for known impressions; known impressions the
/// scorer left out get zero. Returns `None` when nothing known was scored.
fn scored_weights(
    output: &ScorerOutput,
    impressions: &[AdImpression],
) -> Option<Vec<(String, f64)>> {
    let known: HashSet<&str> = impressions
        .iter()
        .map(|imp| imp.impression_id.as_str())
        .collect();
    let matched = output
        .touchpoint_contributions
        .keys()
        .filter(|id| known.contains(id.as_str()))
        .count();
    if matched == 0 {
        return None;
    }
    Some(
        impressions
            .iter()
            .map(|imp| {
                let weight = output
                    .touchpoint_contributions
                    .get(&imp.impression_id)
                    .copied()
                    .unwrap_or(0.0);
                (imp.impression_id.clone(), weight)
            })
            .collect(),
    )
}

/// Scorer-first attribution over a customer's display impressions.
pub struct DisplayAttributionEngine {
    store: Arc<dyn TouchpointStore>,
    scorer: Arc<dyn TouchpointScorer>,
    write_back: bool,
}

impl DisplayAttributionEngine {
    pub const MODEL_VERSION: &'static str = "display_engine_v1";

    pub fn new(store: Arc<dyn TouchpointStore>, scorer: Arc<dyn TouchpointScorer>) -> Self {
        Self {
            store,
            scorer,
            write_back: true,
        }
    }

    /// Enable or disable persisting computed weights back to the store.
    pub fn with_write_back(mut self, enabled: bool) -> Self {
        self.write_back = enabled;
        self
    }

    /// Distribute credit for a conversion over the customer's impressions.
    ///
    /// Scorer failures never surface here; they switch the result to the
    /// fallback formula and drop the scorer confidence bonus.
    #[instrument(skip(self), fields(customer = %customer_id, scorer = self.scorer.name()))]
    pub async fn compute_weights(
        &self,
        customer_id: &CustomerId,
        conversion_id: Option<&ConversionId>,
    ) -> Result<AttributionResult> {
        let impressions = self.store.display_history(customer_id).await?;

        if impressions.is_empty() {
            let reason = Error::NoHistory {
                channel: Channel::Display,
                customer_id: customer_id.to_string(),
            };
            info!("{reason}");
            return Ok(AttributionResult::empty(
                Channel::Display,
                customer_id.clone(),
                conversion_id.cloned(),
                Self::MODEL_VERSION,
                reason.to_string(),
            ));
        }

        let conversion = match conversion_id {
            Some(id) => self.store.conversion(id).await?,
            None => None,
        };
        if conversion.is_none() && conversion_id.is_some() {
            warn!(conversion_id = ?conversion_id, "conversion not found, scoring without it");
        }

        let context = ScoringContext {
            customer_id: customer_id.clone(),
            impressions,
            conversion,
        };

        let (scorer_succeeded, scored) = match self.scorer.score_touchpoints(&context).await {
            Ok(output) if output.is_usable() => {
                (true, scored_weights(&output, &context.impressions))
            }
            Ok(ScorerOutput {
                error: Some(marker),
                ..
            }) => {
                let err = Error::Scorer(marker);
                warn!(error = %err, "scorer returned an error marker, using fallback");
                (false, None)
            }
            Ok(_) => {
                debug!("scorer returned no weights, using fallback");
                (true, None)
            }
            Err(e) => {
                warn!(error = %e, "scorer failed, using fallback");
                (false, None)
            }
        };

        let (raw, method) = match scored {
            Some(raw) => (raw, AttributionMethod::Enhanced),
            None => (
                fallback_weights(&context.impressions),
                AttributionMethod::Fallback,
            ),
        };

        let confidence = display_confidence(scorer_succeeded, &context.impressions);
        let result = AttributionResult::from_normalized(
            Channel::Display,
            context.customer_id,
            conversion_id.cloned(),
            normalize(raw),
            confidence,
            method,
            Self::MODEL_VERSION,
        );

        if self.write_back {
            super::write_back(self.store.as_ref(), Channel::Display, &result.contributions)
                .await;
        }

        info!(
            touchpoints = result.touchpoint_count(),
            method = ?result.method,
            confidence = result.confidence,
            "display attribution computed"
        );
        Ok(result)
    }
}
