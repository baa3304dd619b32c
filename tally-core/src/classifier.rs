//! Query intent classification.
//!
//! The [`IntentClassifier`] trait is the seam for labeling a query's intent
//! category and funnel stage. [`RuleBasedClassifier`] is a keyword stand-in;
//! a remote implementation lives in `tally-models`.

use async_trait::async_trait;

use crate::Result;
use crate::types::{FunnelStage, IntentClassification, QueryIntent};

/// Labels a single search query.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classifier identifier (e.g. "rule_based", "remote").
    fn name(&self) -> &str;

    /// Classify one query's text.
    async fn classify(&self, query_text: &str) -> Result<IntentClassification>;
}

const TRANSACTIONAL_TERMS: &[&str] = &["buy", "purchase", "order", "price"];
const COMPARISON_TERMS: &[&str] = &["compare", "vs", "versus", "best"];
const VALIDATION_TERMS: &[&str] = &["review", "rating", "opinion"];

/// Keyword classifier. Deterministic, no I/O.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous classification used by the async trait method.
    pub fn classify_text(&self, query_text: &str) -> IntentClassification {
        let text = query_text.to_lowercase();
        let mentions = |terms: &[&str]| terms.iter().any(|term| text.contains(term));

        let (intent_category, funnel_stage, purchase_intent_score) =
            if mentions(TRANSACTIONAL_TERMS) {
                (QueryIntent::Transactional, FunnelStage::Decision, 0.9)
            } else if mentions(COMPARISON_TERMS) {
                (QueryIntent::Comparison, FunnelStage::Consideration, 0.7)
            } else if mentions(VALIDATION_TERMS) {
                (QueryIntent::Validation, FunnelStage::Consideration, 0.6)
            } else {
                (QueryIntent::ProductResearch, FunnelStage::Awareness, 0.4)
            };

        IntentClassification {
            intent_category,
            funnel_stage,
            purchase_intent_score,
            urgency_score: 0.5,
            confidence_score: 0.8,
        }
    }
}

#[async_trait]
impl IntentClassifier for RuleBasedClassifier {
    fn name(&self) -> &str {
        "rule_based"
    }

    async fn classify(&self, query_text: &str) -> Result<IntentClassification> {
        Ok(self.classify_text(query_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purchase_terms_are_transactional_decision() {
        let c = RuleBasedClassifier::new().classify_text("Buy trail runners size 10");
        assert_eq!(c.intent_category, QueryIntent::Transactional);
        assert_eq!(c.funnel_stage, FunnelStage::Decision);
        assert_eq!(c.purchase_intent_score, 0.9);
    }

    #[test]
    fn comparison_terms_are_consideration() {
        let c = RuleBasedClassifier::new().classify_text("nike vs adidas running");
        assert_eq!(c.intent_category, QueryIntent::Comparison);
        assert_eq!(c.funnel_stage, FunnelStage::Consideration);
    }

    #[test]
    fn review_terms_are_validation() {
        let c = RuleBasedClassifier::new().classify_text("pegasus 40 reviews");
        assert_eq!(c.intent_category, QueryIntent::Validation);
        assert_eq!(c.funnel_stage, FunnelStage::Consideration);
    }

    #[test]
    fn transactional_wins_over_comparison() {
        let c = RuleBasedClassifier::new().classify_text("best price on running shoes");
        assert_eq!(c.intent_category, QueryIntent::Transactional);
    }

    #[test]
    fn everything_else_is_product_research() {
        let c = RuleBasedClassifier::new().classify_text("running shoes");
        assert_eq!(c.intent_category, QueryIntent::ProductResearch);
        assert_eq!(c.funnel_stage, FunnelStage::Awareness);
        assert_eq!(c.confidence_score, 0.8);
    }

    #[tokio::test]
    async fn trait_classify_matches_sync_path() {
        let classifier = RuleBasedClassifier::new();
        let via_trait = classifier.classify("compare trail shoes").await.unwrap();
        assert_eq!(via_trait, classifier.classify_text("compare trail shoes"));
        assert_eq!(classifier.name(), "rule_based");
    }
}
