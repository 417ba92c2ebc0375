use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::dtos::{ErrorBody, RssQuery};
use super::{ProxyError, pipeline};
use crate::app_state::AppState;
use crate::normalizer::CanonicalFeed;

#[utoipa::path(
    get,
    path = "/api/rss",
    tag = "rss",
    params(RssQuery),
    responses(
        (status = 200, description = "Normalized feed", body = CanonicalFeed),
        (status = 400, description = "Missing url parameter", body = ErrorBody),
        (status = 500, description = "Fetch or processing failure", body = ErrorBody)
    )
)]
pub async fn proxy_feed(State(state): State<AppState>, Query(query): Query<RssQuery>) -> Response {
    let url = match query.url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return error_response(&ProxyError::MissingUrl),
    };

    if let Some(hit) = state.cache.lookup(&url).await {
        debug!(url = %url, "cache hit");
        return (StatusCode::OK, Json(hit.feed)).into_response();
    }

    // Gate per URL: the first request fetches while concurrent ones wait
    // here, then coalesce onto the entry the winner stored.
    let response = {
        let _gate = state.flights.acquire(&url).await;
        if let Some(hit) = state.cache.lookup(&url).await {
            debug!(url = %url, "cache hit after flight gate");
            (StatusCode::OK, Json(hit.feed)).into_response()
        } else {
            let result =
                pipeline::run(&url, state.config.tls_exempt_hosts(), state.config.sources()).await;
            match result {
                Ok(feed) => {
                    state.cache.store(&url, feed.clone()).await;
                    (StatusCode::OK, Json(feed)).into_response()
                }
                Err(err) => error_response(&err),
            }
        }
    };
    state.flights.sweep(&url);
    response
}

/// Explicit pre-flight response; the CORS layer adds the actual headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn error_response(err: &ProxyError) -> Response {
    (err.status(), Json(err.body())).into_response()
}
