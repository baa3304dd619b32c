//! Error types for attribution operations.

use thiserror::Error;

use crate::types::Channel;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while computing attribution.
///
/// None of these are fatal to a unified calculation: a missing history is
/// reported on the result, a scorer failure triggers the fallback weighting,
/// and a channel failure degrades that channel to an empty result.
#[derive(Debug, Error)]
pub enum Error {
    /// No touchpoints recorded for the customer on this channel.
    #[error("no {channel} history found for customer {customer_id}")]
    NoHistory {
        channel: Channel,
        customer_id: String,
    },

    /// The external touchpoint scorer failed or returned unusable output.
    #[error("scorer failure: {0}")]
    Scorer(String),

    /// An entire channel computation failed.
    #[error("{channel} attribution failed: {message}")]
    Channel { channel: Channel, message: String },

    /// The intent classifier failed.
    #[error("classifier failure: {0}")]
    Classifier(String),

    /// The touchpoint store failed.
    #[error("store error: {0}")]
    Store(String),

    /// A requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A record with this id was already recorded.
    #[error("{kind} already exists: {id}")]
    AlreadyExists { kind: &'static str, id: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any error as a channel failure.
    pub fn channel(channel: Channel, err: impl std::fmt::Display) -> Self {
        Self::Channel {
            channel,
            message: err.to_string(),
        }
    }
}
