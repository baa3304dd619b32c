//! Touchpoint records and identifiers.
//!
//! Touchpoints are immutable facts once recorded. The only value ever
//! derived from them is an attribution weight, which lives outside the
//! record itself.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Customer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CustomerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CustomerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Conversion event identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionId(pub String);

impl ConversionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConversionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One of the two independently attributed channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Search,
    Display,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Display => "display",
        }
    }

    /// Parse a channel name, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Some(Self::Search),
            "display" => Some(Self::Display),
            _ => None,
        }
    }

    /// Key used for this channel's entries in a unified contribution map.
    pub fn key(&self, touchpoint_id: &str) -> String {
        format!("{}_{}", self.as_str(), touchpoint_id)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse purchase-journey stage of a search query. Ordered by funnel depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Awareness,
    Consideration,
    Decision,
}

impl FunnelStage {
    /// Lenient, case-insensitive parse. Unrecognized labels are awareness.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "consideration" => Self::Consideration,
            "decision" => Self::Decision,
            _ => Self::Awareness,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awareness => "awareness",
            Self::Consideration => "consideration",
            Self::Decision => "decision",
        }
    }
}

/// Intent category of a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    BrandResearch,
    ProductResearch,
    Comparison,
    Validation,
    Transactional,
    Navigational,
    Unknown,
}

impl QueryIntent {
    /// Lenient, case-insensitive parse. Unrecognized labels are `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "brand_research" => Self::BrandResearch,
            "product_research" => Self::ProductResearch,
            "comparison" => Self::Comparison,
            "validation" => Self::Validation,
            "transactional" => Self::Transactional,
            "navigational" => Self::Navigational,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrandResearch => "brand_research",
            Self::ProductResearch => "product_research",
            Self::Comparison => "comparison",
            Self::Validation => "validation",
            Self::Transactional => "transactional",
            Self::Navigational => "navigational",
            Self::Unknown => "unknown",
        }
    }
}

/// Output of an intent classifier for a single query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent_category: QueryIntent,
    pub funnel_stage: FunnelStage,
    pub purchase_intent_score: f64,
    pub urgency_score: f64,
    pub confidence_score: f64,
}

/// A recorded search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query_id: String,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub session_id: Option<String>,
    pub query_text: String,
    /// Raw intent category label as recorded.
    #[serde(default)]
    pub query_type: Option<String>,
    /// Raw funnel stage label as recorded.
    #[serde(default)]
    pub funnel_stage: Option<String>,
    #[serde(default)]
    pub intent: Option<IntentClassification>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sequence_position: Option<u32>,
}

impl SearchQuery {
    /// Recorded stage label, else the stored classification, else awareness.
    pub fn stage(&self) -> FunnelStage {
        match (&self.funnel_stage, &self.intent) {
            (Some(label), _) => FunnelStage::from_label(label),
            (None, Some(intent)) => intent.funnel_stage,
            (None, None) => FunnelStage::Awareness,
        }
    }

    /// Recorded type label, else the stored classification, else unknown.
    pub fn intent_category(&self) -> QueryIntent {
        match (&self.query_type, &self.intent) {
            (Some(label), _) => QueryIntent::from_label(label),
            (None, Some(intent)) => intent.intent_category,
            (None, None) => QueryIntent::Unknown,
        }
    }
}

fn default_ad_format() -> String {
    "banner".to_string()
}

fn default_frequency() -> u32 {
    1
}

/// A recorded display ad impression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdImpression {
    pub impression_id: String,
    pub customer_id: CustomerId,
    pub creative_id: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub placement_id: Option<String>,
    /// banner, video, native, rich_media
    #[serde(default = "default_ad_format")]
    pub ad_format: String,
    /// Fraction in [0, 1] of how visibly the ad rendered.
    #[serde(default)]
    pub viewability_score: f64,
    #[serde(default)]
    pub view_duration_seconds: Option<u32>,
    pub timestamp: DateTime<Utc>,
    /// How many times this customer had been served the campaign when this
    /// impression rendered.
    #[serde(default = "default_frequency")]
    pub frequency_cap_count: u32,
    #[serde(default)]
    pub cost: f64,
    /// The customer clicked through from this impression.
    #[serde(default)]
    pub clicked: bool,
}

/// A recorded video interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInteraction {
    pub interaction_id: String,
    pub customer_id: CustomerId,
    pub video_id: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    pub video_duration_seconds: u32,
    /// Fraction in [0, 1] of the video watched.
    #[serde(default)]
    pub completion_rate: f64,
    /// Quartiles reached, e.g. `[25, 50, 75]`.
    #[serde(default)]
    pub quartile_completions: Vec<u8>,
    /// Number of in-video engagement points (clicks, unmutes, ...).
    #[serde(default)]
    pub engagement_points: u32,
    #[serde(default)]
    pub drop_off_seconds: Option<u32>,
    /// ad_view, organic_view, social_view
    pub interaction_type: String,
    pub timestamp: DateTime<Utc>,
}

/// A conversion event being attributed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub conversion_id: ConversionId,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub conversion_type: Option<String>,
    #[serde(default)]
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate performance of a display creative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativePerformance {
    pub creative_id: String,
    pub creative_name: String,
    /// image, video, carousel, dynamic
    pub creative_type: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub total_impressions: u64,
    #[serde(default)]
    pub unique_viewers: u64,
    #[serde(default)]
    pub avg_viewability: f64,
    #[serde(default)]
    pub click_through_rate: f64,
    #[serde(default)]
    pub conversion_rate: f64,
    #[serde(default)]
    pub brand_lift_score: f64,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn funnel_stage_parse_is_case_insensitive() {
        assert_eq!(FunnelStage::from_label("DECISION"), FunnelStage::Decision);
        assert_eq!(
            FunnelStage::from_label(" Consideration "),
            FunnelStage::Consideration
        );
    }

    #[test]
    fn unknown_funnel_stage_is_awareness() {
        assert_eq!(FunnelStage::from_label("retention"), FunnelStage::Awareness);
        assert_eq!(FunnelStage::from_label(""), FunnelStage::Awareness);
    }

    #[test]
    fn query_intent_parse_falls_back_to_unknown() {
        assert_eq!(
            QueryIntent::from_label("Transactional"),
            QueryIntent::Transactional
        );
        assert_eq!(QueryIntent::from_label("gibberish"), QueryIntent::Unknown);
    }

    #[test]
    fn channel_key_prefixes_touchpoint_id() {
        assert_eq!(Channel::Search.key("q1"), "search_q1");
        assert_eq!(Channel::Display.key("imp_9"), "display_imp_9");
    }

    #[test]
    fn channel_parse() {
        assert_eq!(Channel::parse("Search"), Some(Channel::Search));
        assert_eq!(Channel::parse("display"), Some(Channel::Display));
        assert_eq!(Channel::parse("social"), None);
    }

    #[test]
    fn impression_defaults_apply_on_deserialize() {
        let json = r#"{
            "impression_id": "imp_1",
            "customer_id": "CUST_001",
            "creative_id": "cr_1",
            "timestamp": "2024-01-15T10:00:00Z"
        }"#;
        let imp: AdImpression = serde_json::from_str(json).unwrap();
        assert_eq!(imp.ad_format, "banner");
        assert_eq!(imp.viewability_score, 0.0);
        assert_eq!(imp.frequency_cap_count, 1);
        assert_eq!(imp.customer_id, CustomerId::from("CUST_001"));
    }

    #[test]
    fn search_query_missing_labels_use_defaults() {
        let json = r#"{
            "query_id": "q1",
            "customer_id": "CUST_001",
            "query_text": "running shoes",
            "timestamp": "2024-01-15T10:00:00Z"
        }"#;
        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.stage(), FunnelStage::Awareness);
        assert_eq!(query.intent_category(), QueryIntent::Unknown);
    }

    #[test]
    fn stored_classification_fills_missing_labels() {
        let json = r#"{
            "query_id": "q1",
            "customer_id": "CUST_001",
            "query_text": "buy running shoes",
            "query_type": "Comparison",
            "intent": {
                "intent_category": "transactional",
                "funnel_stage": "decision",
                "purchase_intent_score": 0.9,
                "urgency_score": 0.5,
                "confidence_score": 0.8
            },
            "timestamp": "2024-01-15T10:00:00Z"
        }"#;
        let query: SearchQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.stage(), FunnelStage::Decision);
        assert_eq!(query.intent_category(), QueryIntent::Comparison);
    }
}
