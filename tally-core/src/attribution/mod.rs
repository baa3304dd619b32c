//! Per-channel attribution engines and cross-channel combination.
//!
//! Each engine turns one channel's time-ordered touchpoints into a
//! normalized [`WeightedContribution`]. The [`ChannelCombiner`] runs both
//! engines concurrently and blends their results by touchpoint count.

mod combiner;
mod display;
mod normalize;
mod search;
mod types;

pub use combiner::{ChannelCombiner, channel_weights, combine};
pub use display::{DisplayAttributionEngine, display_confidence, fallback_weights};
pub use normalize::{
    Normalization, Normalized, WEIGHT_TOLERANCE, WeightedContribution, normalize,
};
pub use search::{
    SearchAttributionEngine, position_weight, search_raw_weights, stage_weight, type_weight,
};
pub use types::{AttributionMethod, AttributionResult, ChannelWeights, UnifiedAttribution};

use tracing::{debug, warn};

use crate::store::TouchpointStore;
use crate::types::Channel;

/// Persist each touchpoint's weight. Failures are logged and skipped.
async fn write_back(
    store: &dyn TouchpointStore,
    channel: Channel,
    contributions: &WeightedContribution,
) {
    let mut written = 0usize;
    for (touchpoint_id, weight) in contributions.iter() {
        match store
            .record_attribution_weight(channel, touchpoint_id, weight)
            .await
        {
            Ok(()) => written += 1,
            Err(e) => warn!(
                %channel,
                touchpoint_id,
                error = %e,
                "failed to record attribution weight"
            ),
        }
    }
    debug!(%channel, written, "attribution weights recorded");
}
