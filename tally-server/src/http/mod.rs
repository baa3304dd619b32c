//! HTTP server module

mod api;
mod attribution;
mod ingest;
mod insights;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use api::HealthResponse;
pub use attribution::{AttributionRequest, ClassifyRequest};
pub use insights::StrategyParams;

/// Success envelope wrapping every handler's payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            data,
        })
    }
}

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        // Ingestion
        .route("/api/queries", post(ingest::create_query))
        .route("/api/queries/classify", post(attribution::classify_query))
        .route("/api/impressions", post(ingest::create_impression))
        .route(
            "/api/video-interactions",
            post(ingest::create_video_interaction),
        )
        .route("/api/conversions", post(ingest::create_conversion))
        .route("/api/creatives", post(ingest::upsert_creative))
        // Attribution
        .route("/api/attribution/search", post(attribution::search))
        .route("/api/attribution/display", post(attribution::display))
        .route("/api/attribution/unified", post(attribution::unified))
        // Insights
        .route(
            "/api/insights/search/:customer_id",
            get(insights::search_insights),
        )
        .route(
            "/api/insights/display/:customer_id",
            get(insights::display_insights),
        )
        .route(
            "/api/insights/video/:customer_id",
            get(insights::video_engagement),
        )
        .route(
            "/api/insights/cross-channel/:customer_id",
            get(insights::cross_channel),
        )
        .route(
            "/api/insights/comprehensive/:customer_id",
            get(insights::comprehensive),
        )
        .route(
            "/api/creatives/:creative_id/analysis",
            get(insights::creative_analysis),
        )
        .route(
            "/api/campaigns/:campaign_id/frequency",
            get(insights::campaign_frequency),
        )
        .route("/api/sessions/:session_id", get(insights::search_session))
        .route("/api/strategy/:customer_id", get(insights::strategy))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
