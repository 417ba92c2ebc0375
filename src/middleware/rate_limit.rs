use axum::{
    Json,
    extract::{ConnectInfo, Request},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::{net::SocketAddr, sync::Arc, time::Duration as StdDuration};

use crate::proxy::ErrorBody;

#[derive(Clone)]
pub struct RateLimit {
    store: Arc<DashMap<String, RateLimitData>>,
    max_requests: u32,
    window_seconds: i64,
}

#[derive(Debug, Clone)]
struct RateLimitData {
    count: u32,
    window_start: DateTime<Utc>,
}

impl RateLimit {
    pub fn new(max_requests: u32, window: StdDuration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            max_requests,
            window_seconds: i64::try_from(window.as_secs()).unwrap_or(i64::MAX),
        }
    }
}

/// IP-based fixed-window rate limiting middleware.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    axum::extract::State(rate_limit): axum::extract::State<RateLimit>,
    req: Request,
    next: Next,
) -> Response {
    let ip = addr.ip().to_string();
    let now = Utc::now();

    let mut entry = rate_limit.store.entry(ip).or_insert_with(|| RateLimitData {
        count: 0,
        window_start: now,
    });

    let data = entry.value_mut();

    // Check if we need to reset the window
    if now.signed_duration_since(data.window_start) >= Duration::seconds(rate_limit.window_seconds)
    {
        data.count = 0;
        data.window_start = now;
    }

    data.count += 1;
    let over_limit = data.count > rate_limit.max_requests;
    let elapsed = now.signed_duration_since(data.window_start).num_seconds();
    // Downstream can await an upstream fetch for seconds; the shard guard
    // must be released before then.
    drop(entry);

    if over_limit {
        let retry_after = (rate_limit.window_seconds - elapsed).max(1);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after.to_string())],
            Json(ErrorBody {
                error: "Rate limit exceeded".to_string(),
                message: None,
                url: None,
            }),
        )
            .into_response();
    }

    next.run(req).await
}
