//! tally-core: attribution engines for search and display touchpoints.
//!
//! This crate turns a customer's recorded touchpoints into a normalized
//! distribution of credit for a conversion:
//!
//! - **Search** - [`SearchAttributionEngine`] weights queries by position,
//!   funnel stage and intent category
//! - **Display** - [`DisplayAttributionEngine`] asks a pluggable
//!   [`TouchpointScorer`] first and falls back to viewability × recency
//! - **Combination** - [`ChannelCombiner`] runs both channels concurrently and
//!   blends them by touchpoint count
//! - **Insights** - [`InsightsSummarizer`] produces advisory aggregates
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_core::{
//!     AttributionManager, CustomerId, HeuristicScorer, MemoryStore, RuleBasedClassifier,
//! };
//!
//! async fn example() {
//!     let manager = AttributionManager::new(
//!         Arc::new(MemoryStore::new()),
//!         Arc::new(RuleBasedClassifier::new()),
//!         Arc::new(HeuristicScorer::new()),
//!     );
//!     let unified = manager
//!         .unified_attribution(&CustomerId::from("CUST_001"), None)
//!         .await;
//!     println!("search share: {}", unified.channel_weights.search);
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! TouchpointStore ──┬── SearchAttributionEngine ──┐
//!                   │                             ├── ChannelCombiner ── UnifiedAttribution
//!                   ├── DisplayAttributionEngine ─┘
//!                   │        └── TouchpointScorer
//!                   └── InsightsSummarizer (advisory)
//! ```

pub mod attribution;
pub mod classifier;
pub mod error;
pub mod insights;
mod manager;
pub mod scorer;
pub mod store;
pub mod types;

pub use attribution::{
    AttributionMethod, AttributionResult, ChannelCombiner, ChannelWeights,
    DisplayAttributionEngine, SearchAttributionEngine, UnifiedAttribution, WeightedContribution,
};
pub use classifier::{IntentClassifier, RuleBasedClassifier};
pub use error::{Error, Result};
pub use insights::InsightsSummarizer;
pub use manager::AttributionManager;
pub use scorer::{HeuristicScorer, ScorerOutput, ScoringContext, TouchpointScorer};
pub use store::{MemoryStore, TouchpointIngest, TouchpointStore};
pub use types::{
    AdImpression, Channel, Conversion, ConversionId, CreativePerformance, CustomerId,
    FunnelStage, IntentClassification, QueryIntent, SearchQuery, VideoInteraction,
};
