//! Insight, creative analysis and strategy handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use tally_core::CustomerId;
use tally_core::insights::{
    ComprehensiveInsights, CreativeAnalysis, CrossChannelAnalysis, DisplayInsights,
    FrequencyAnalysis, OptimizationStrategy, SearchInsights, SearchSession, VideoEngagement,
};

use super::Envelope;
use crate::{AppState, ServerError};

type ApiResult<T> = Result<Json<Envelope<T>>, ServerError>;

/// Query string of GET /api/strategy/:customer_id
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Comma-separated goals
    #[serde(default)]
    pub goals: Option<String>,
}

impl StrategyParams {
    pub fn goal_list(&self) -> Vec<String> {
        self.goals
            .as_deref()
            .map(|goals| {
                goals
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// GET /api/insights/search/:customer_id
pub async fn search_insights(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> ApiResult<SearchInsights> {
    let insights = state
        .manager
        .search_insights(&CustomerId::from(customer_id))
        .await?;
    Ok(Envelope::success(insights))
}

/// GET /api/insights/display/:customer_id
pub async fn display_insights(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> ApiResult<DisplayInsights> {
    let insights = state
        .manager
        .display_insights(&CustomerId::from(customer_id))
        .await?;
    Ok(Envelope::success(insights))
}

/// GET /api/insights/video/:customer_id
pub async fn video_engagement(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> ApiResult<VideoEngagement> {
    let engagement = state
        .manager
        .video_engagement(&CustomerId::from(customer_id))
        .await?;
    Ok(Envelope::success(engagement))
}

/// GET /api/insights/cross-channel/:customer_id
pub async fn cross_channel(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> ApiResult<CrossChannelAnalysis> {
    let analysis = state
        .manager
        .cross_channel_analysis(&CustomerId::from(customer_id))
        .await?;
    Ok(Envelope::success(analysis))
}

/// GET /api/insights/comprehensive/:customer_id
pub async fn comprehensive(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
) -> ApiResult<ComprehensiveInsights> {
    let insights = state
        .manager
        .comprehensive_insights(&CustomerId::from(customer_id))
        .await?;
    Ok(Envelope::success(insights))
}

/// GET /api/creatives/:creative_id/analysis
pub async fn creative_analysis(
    State(state): State<Arc<AppState>>,
    Path(creative_id): Path<String>,
) -> ApiResult<CreativeAnalysis> {
    let analysis = state.manager.creative_analysis(&creative_id).await?;
    Ok(Envelope::success(analysis))
}

/// GET /api/campaigns/:campaign_id/frequency
pub async fn campaign_frequency(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<String>,
) -> ApiResult<FrequencyAnalysis> {
    let analysis = state.manager.frequency_analysis(&campaign_id).await?;
    Ok(Envelope::success(analysis))
}

/// GET /api/sessions/:session_id
pub async fn search_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> ApiResult<SearchSession> {
    let session = state.manager.search_session(&session_id).await?;
    Ok(Envelope::success(session))
}

/// GET /api/strategy/:customer_id?goals=a,b
pub async fn strategy(
    State(state): State<Arc<AppState>>,
    Path(customer_id): Path<String>,
    params: Result<Query<StrategyParams>, QueryRejection>,
) -> ApiResult<OptimizationStrategy> {
    let Query(params) = params?;
    let strategy = state
        .manager
        .optimize_strategy(&CustomerId::from(customer_id), params.goal_list())
        .await?;
    Ok(Envelope::success(strategy))
}
