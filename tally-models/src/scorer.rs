//! Remote touchpoint scorer.
//!
//! Sends the full [`ScoringContext`] to `POST {base_url}/score` and expects a
//! [`ScorerOutput`] back:
//!
//! ```text
//! { "touchpoint_contributions": {"imp_1": 0.7, "imp_2": 0.3},
//!   "confidence_score": 0.82,
//!   "error": null }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};

use tally_core::{ScorerOutput, ScoringContext, TouchpointScorer};

use crate::Result;
use crate::client::{DEFAULT_TIMEOUT, JsonClient};

/// [`TouchpointScorer`] backed by an HTTP model service.
#[derive(Debug, Clone)]
pub struct RemoteScorer {
    client: JsonClient,
}

impl RemoteScorer {
    /// Create a scorer with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: JsonClient::new(base_url, timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl TouchpointScorer for RemoteScorer {
    fn name(&self) -> &str {
        "remote"
    }

    #[instrument(skip(self, context), fields(customer_id = %context.customer_id, impressions = context.impressions.len()))]
    async fn score_touchpoints(&self, context: &ScoringContext) -> tally_core::Result<ScorerOutput> {
        let output: ScorerOutput = self
            .client
            .post("score", context)
            .await
            .map_err(|e| tally_core::Error::Scorer(e.to_string()))?;
        debug!(
            scored = output.touchpoint_contributions.len(),
            "remote scorer answered"
        );
        Ok(output)
    }
}
