//! Cross-channel combination.

use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{info, instrument, warn};

use super::display::DisplayAttributionEngine;
use super::normalize::WeightedContribution;
use super::search::SearchAttributionEngine;
use super::types::{AttributionResult, ChannelWeights, UnifiedAttribution};
use crate::types::{Channel, ConversionId, CustomerId};
use crate::{Error, Result};

/// Channel shares proportional to touchpoint counts; 0.5/0.5 when both are empty.
pub fn channel_weights(search_touchpoints: usize, display_touchpoints: usize) -> ChannelWeights {
    let total = search_touchpoints + display_touchpoints;
    if total == 0 {
        return ChannelWeights {
            search: 0.5,
            display: 0.5,
        };
    }
    ChannelWeights {
        search: search_touchpoints as f64 / total as f64,
        display: display_touchpoints as f64 / total as f64,
    }
}

/// Blend two channel results into one distribution.
///
/// Each channel's weights are scaled by its share and re-keyed as
/// `search_<id>` / `display_<id>`, so the two key spaces never collide.
pub fn combine(search: AttributionResult, display: AttributionResult) -> UnifiedAttribution {
    let weights = channel_weights(search.touchpoint_count(), display.touchpoint_count());

    let entries = [&search, &display].into_iter().flat_map(|result| {
        let share = weights.get(result.channel);
        result
            .contributions
            .iter()
            .map(move |(id, weight)| (result.channel.key(id), weight * share))
    });
    let contributions = WeightedContribution::from_entries(entries);
    let total_weight = contributions.total();

    UnifiedAttribution {
        customer_id: search.customer_id.clone(),
        conversion_id: search.conversion_id.clone(),
        search,
        display,
        channel_weights: weights,
        contributions,
        total_weight,
    }
}

/// Runs both channel engines concurrently and combines their results.
///
/// A channel that errors or panics is degraded to an empty result carrying
/// the error; the other channel is unaffected.
#[derive(Clone)]
pub struct ChannelCombiner {
    search: Arc<SearchAttributionEngine>,
    display: Arc<DisplayAttributionEngine>,
}

impl ChannelCombiner {
    pub fn new(search: Arc<SearchAttributionEngine>, display: Arc<DisplayAttributionEngine>) -> Self {
        Self { search, display }
    }

    pub fn search(&self) -> &SearchAttributionEngine {
        &self.search
    }

    pub fn display(&self) -> &DisplayAttributionEngine {
        &self.display
    }

    #[instrument(skip(self), fields(customer = %customer_id))]
    pub async fn unified_attribution(
        &self,
        customer_id: &CustomerId,
        conversion_id: Option<&ConversionId>,
    ) -> UnifiedAttribution {
        let search_task = {
            let engine = Arc::clone(&self.search);
            let customer = customer_id.clone();
            let conversion = conversion_id.cloned();
            tokio::spawn(async move {
                engine
                    .compute_weights(&customer, conversion.as_ref())
                    .await
            })
        };
        let display_task = {
            let engine = Arc::clone(&self.display);
            let customer = customer_id.clone();
            let conversion = conversion_id.cloned();
            tokio::spawn(async move {
                engine
                    .compute_weights(&customer, conversion.as_ref())
                    .await
            })
        };

        let (search, display) = tokio::join!(search_task, display_task);
        let search = settle(Channel::Search, search, customer_id, conversion_id);
        let display = settle(Channel::Display, display, customer_id, conversion_id);

        let mut unified = combine(search, display);
        unified.customer_id = customer_id.clone();
        unified.conversion_id = conversion_id.cloned();

        info!(
            search_weight = unified.channel_weights.search,
            display_weight = unified.channel_weights.display,
            touchpoints = unified.contributions.len(),
            "unified attribution computed"
        );
        unified
    }
}

/// Turn a joined channel task into a result, degrading failures.
fn settle(
    channel: Channel,
    joined: std::result::Result<Result<AttributionResult>, JoinError>,
    customer_id: &CustomerId,
    conversion_id: Option<&ConversionId>,
) -> AttributionResult {
    let err = match joined {
        Ok(Ok(result)) => return result,
        Ok(Err(e)) => Error::channel(channel, e),
        Err(join_err) => Error::channel(channel, join_err),
    };
    warn!(%channel, error = %err, "channel degraded to empty result");
    AttributionResult::failed(channel, customer_id.clone(), conversion_id.cloned(), &err)
}
