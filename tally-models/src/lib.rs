//! Remote model clients for tally.
//!
//! This crate provides HTTP-backed implementations of the core's pluggable
//! model seams:
//! - [`RemoteScorer`] - display touchpoint scoring
//! - [`RemoteIntentClassifier`] - search query intent classification
//!
//! Both carry their own request timeout. A failed call surfaces as a core
//! scorer/classifier error, which the engines treat as non-fatal.

mod client;
mod error;

pub mod classifier;
pub mod scorer;

pub use classifier::RemoteIntentClassifier;
pub use client::DEFAULT_TIMEOUT;
pub use error::{Error, Result};
pub use scorer::RemoteScorer;
