//! Health endpoint

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use super::Envelope;
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Envelope<HealthResponse>> {
    Envelope::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = Router::new()
            .route("/api/health", get(health))
            .with_state(Arc::new(AppState::in_memory()));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/api/health").await;
        response.assert_status_ok();

        let body: Envelope<HealthResponse> = response.json();
        assert_eq!(body.status, "success");
        assert_eq!(body.data.status, "healthy");
        assert_eq!(body.data.version, env!("CARGO_PKG_VERSION"));
        assert!(body.data.uptime_seconds >= 0);
    }
}
