use axum::{Json, extract::State};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::app_state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    sources: usize,
    cached_feeds: usize,
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Health check successful", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cached_feeds = state.cache.entry_count().await;
    debug!(cached_feeds, "health check");
    Json(HealthResponse {
        status: "OK".to_string(),
        sources: state.config.sources().len(),
        cached_feeds,
    })
}
