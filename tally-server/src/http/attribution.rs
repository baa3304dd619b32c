//! Attribution and query classification handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tally_core::{
    AttributionResult, ConversionId, CustomerId, IntentClassification, SearchQuery,
    UnifiedAttribution,
};

use super::Envelope;
use crate::{AppState, ServerError};

/// Body of the attribution endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct AttributionRequest {
    pub customer_id: String,
    #[serde(default)]
    pub conversion_id: Option<String>,
}

impl AttributionRequest {
    fn ids(self) -> Result<(CustomerId, Option<ConversionId>), ServerError> {
        if self.customer_id.trim().is_empty() {
            return Err(ServerError::BadRequest("customer_id must not be empty".into()));
        }
        let conversion_id = self
            .conversion_id
            .filter(|id| !id.trim().is_empty())
            .map(ConversionId::from);
        Ok((CustomerId::from(self.customer_id), conversion_id))
    }
}

/// Body of POST /api/queries/classify
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub query_id: String,
    pub customer_id: String,
    pub query_text: String,
    #[serde(default)]
    pub sequence_position: Option<u32>,
}

/// POST /api/attribution/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AttributionRequest>, JsonRejection>,
) -> Result<Json<Envelope<AttributionResult>>, ServerError> {
    let Json(request) = payload?;
    let (customer_id, conversion_id) = request.ids()?;
    let result = state
        .manager
        .search_attribution(&customer_id, conversion_id.as_ref())
        .await?;
    Ok(Envelope::success(result))
}

/// POST /api/attribution/display
pub async fn display(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AttributionRequest>, JsonRejection>,
) -> Result<Json<Envelope<AttributionResult>>, ServerError> {
    let Json(request) = payload?;
    let (customer_id, conversion_id) = request.ids()?;
    let result = state
        .manager
        .display_attribution(&customer_id, conversion_id.as_ref())
        .await?;
    Ok(Envelope::success(result))
}

/// POST /api/attribution/unified
pub async fn unified(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AttributionRequest>, JsonRejection>,
) -> Result<Json<Envelope<UnifiedAttribution>>, ServerError> {
    let Json(request) = payload?;
    let (customer_id, conversion_id) = request.ids()?;
    let result = state
        .manager
        .unified_attribution(&customer_id, conversion_id.as_ref())
        .await;
    Ok(Envelope::success(result))
}

/// POST /api/queries/classify - classify a query and record the result on it
pub async fn classify_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<Envelope<IntentClassification>>, ServerError> {
    let Json(request) = payload?;
    if request.query_text.trim().is_empty() {
        return Err(ServerError::BadRequest("query_text must not be empty".into()));
    }
    let query = SearchQuery {
        query_id: request.query_id,
        customer_id: CustomerId::from(request.customer_id),
        session_id: None,
        query_text: request.query_text,
        query_type: None,
        funnel_stage: None,
        intent: None,
        timestamp: Utc::now(),
        sequence_position: request.sequence_position,
    };
    let classification = state.manager.process_query(&query).await?;
    Ok(Envelope::success(classification))
}
