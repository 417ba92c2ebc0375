//! feedproxy: an HTTP proxy that fetches remote RSS/Atom feeds on behalf
//! of browser clients, normalizes the dialect zoo into one canonical item
//! schema, and serves the result as JSON.

pub mod api_docs;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod health;
pub mod middleware;
pub mod normalizer;
pub mod parser;
pub mod proxy;
pub mod refresh;

use axum::{
    Router,
    http::{Method, header},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use app_state::AppState;
use middleware::RateLimit;

/// Builds the application router: the proxy endpoint with its pre-flight
/// route, health, API docs, permissive CORS on every response, request-id
/// and trace layers, and (when enabled) per-IP rate limiting.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let mut router = Router::new()
        .route(
            "/api/rss",
            get(proxy::proxy_feed).options(proxy::preflight),
        )
        .route("/healthz", get(health::health_check))
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", api_docs::ApiDoc::openapi()),
        );

    if state.config.rate_limit_max() > 0 {
        let limiter = RateLimit::new(
            state.config.rate_limit_max(),
            state.config.rate_limit_window(),
        );
        router = router.layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // CORS sits outside the rate limiter so even 429s carry the headers.
    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}
