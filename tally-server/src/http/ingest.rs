//! Touchpoint ingestion handlers
//!
//! Records are validated here, then handed to the store as-is. Each handler
//! answers 201 with the stored record.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use tally_core::{AdImpression, Conversion, CreativePerformance, SearchQuery, VideoInteraction};

use super::Envelope;
use crate::{AppState, ServerError};

type Created<T> = Result<(StatusCode, Json<Envelope<T>>), ServerError>;

fn created<T>(record: T) -> Created<T> {
    Ok((StatusCode::CREATED, Envelope::success(record)))
}

fn require(field: &str, value: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_fraction(field: &str, value: f64) -> Result<(), ServerError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ServerError::BadRequest(format!(
            "{field} must be between 0 and 1, got {value}"
        )));
    }
    Ok(())
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ServerError> {
    if value.is_nan() || value < 0.0 {
        return Err(ServerError::BadRequest(format!(
            "{field} must not be negative, got {value}"
        )));
    }
    Ok(())
}

fn validate_query(query: &SearchQuery) -> Result<(), ServerError> {
    require("query_id", &query.query_id)?;
    require("customer_id", query.customer_id.as_str())?;
    require("query_text", &query.query_text)
}

fn validate_impression(impression: &AdImpression) -> Result<(), ServerError> {
    require("impression_id", &impression.impression_id)?;
    require("customer_id", impression.customer_id.as_str())?;
    require("creative_id", &impression.creative_id)?;
    require_fraction("viewability_score", impression.viewability_score)?;
    require_non_negative("cost", impression.cost)
}

fn validate_video(video: &VideoInteraction) -> Result<(), ServerError> {
    require("interaction_id", &video.interaction_id)?;
    require("customer_id", video.customer_id.as_str())?;
    require("video_id", &video.video_id)?;
    require_fraction("completion_rate", video.completion_rate)?;
    if let Some(q) = video
        .quartile_completions
        .iter()
        .find(|q| ![25, 50, 75, 100].contains(*q))
    {
        return Err(ServerError::BadRequest(format!(
            "quartile_completions entries must be 25, 50, 75 or 100, got {q}"
        )));
    }
    Ok(())
}

fn validate_conversion(conversion: &Conversion) -> Result<(), ServerError> {
    require("conversion_id", conversion.conversion_id.as_str())?;
    require("customer_id", conversion.customer_id.as_str())?;
    require_non_negative("value", conversion.value)
}

fn validate_creative(creative: &CreativePerformance) -> Result<(), ServerError> {
    require("creative_id", &creative.creative_id)?;
    require_fraction("avg_viewability", creative.avg_viewability)?;
    require_fraction("click_through_rate", creative.click_through_rate)?;
    require_fraction("conversion_rate", creative.conversion_rate)
}

/// POST /api/queries
pub async fn create_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchQuery>, JsonRejection>,
) -> Created<SearchQuery> {
    let Json(query) = payload?;
    validate_query(&query)?;
    state.ingest.insert_query(&query).await?;
    created(query)
}

/// POST /api/impressions
pub async fn create_impression(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AdImpression>, JsonRejection>,
) -> Created<AdImpression> {
    let Json(impression) = payload?;
    validate_impression(&impression)?;
    state.ingest.insert_impression(&impression).await?;
    created(impression)
}

/// POST /api/video-interactions
pub async fn create_video_interaction(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VideoInteraction>, JsonRejection>,
) -> Created<VideoInteraction> {
    let Json(video) = payload?;
    validate_video(&video)?;
    state.ingest.insert_video_interaction(&video).await?;
    created(video)
}

/// POST /api/conversions
pub async fn create_conversion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Conversion>, JsonRejection>,
) -> Created<Conversion> {
    let Json(conversion) = payload?;
    validate_conversion(&conversion)?;
    state.ingest.insert_conversion(&conversion).await?;
    created(conversion)
}

/// POST /api/creatives - insert or replace a creative's performance record
pub async fn upsert_creative(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreativePerformance>, JsonRejection>,
) -> Created<CreativePerformance> {
    let Json(creative) = payload?;
    validate_creative(&creative)?;
    state.ingest.upsert_creative(&creative).await?;
    created(creative)
}
