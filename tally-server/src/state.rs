//! Shared application state for the tally server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_core::{
    AttributionManager, HeuristicScorer, MemoryStore, RuleBasedClassifier, TouchpointIngest,
};

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Attribution engines, combiner and insights
    pub manager: AttributionManager,
    /// Write side of the touchpoint store
    pub ingest: Arc<dyn TouchpointIngest>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(manager: AttributionManager, ingest: Arc<dyn TouchpointIngest>) -> Self {
        Self {
            manager,
            ingest,
            started_at: Utc::now(),
        }
    }

    /// State over an in-memory store with the local classifier and scorer (for testing)
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        let manager = AttributionManager::new(
            store.clone(),
            Arc::new(RuleBasedClassifier::new()),
            Arc::new(HeuristicScorer::new()),
        );
        Self::new(manager, store)
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
