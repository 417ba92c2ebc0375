use utoipa::OpenApi;

use crate::health::{self, HealthResponse};
use crate::normalizer::{CanonicalFeed, CanonicalItem};
use crate::proxy::{self, ErrorBody};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "feedproxy API",
        description = "Fetches remote RSS/Atom feeds and serves them as one canonical JSON schema",
        version = "0.1.0"
    ),
    paths(proxy::handlers::proxy_feed, health::health_check),
    tags(
        (name = "rss", description = "Feed proxy endpoint"),
        (name = "health", description = "Service health")
    ),
    components(schemas(CanonicalFeed, CanonicalItem, ErrorBody, HealthResponse))
)]
pub struct ApiDoc;
