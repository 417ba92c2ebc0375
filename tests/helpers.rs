use axum::{Router, response::Response};
use serde_json::Value;

use feedproxy::{app_state::AppState, config::Config, create_router};

/// Router wired exactly as in production, minus rate limiting: `oneshot`
/// requests carry no peer address for the limiter to key on.
pub fn test_app() -> Router {
    test_app_with(Config::default().with_rate_limit(0, 60))
}

pub fn test_app_with(config: Config) -> Router {
    create_router(AppState::new(config))
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
