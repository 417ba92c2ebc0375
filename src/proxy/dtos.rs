use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query string for `GET /api/rss`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RssQuery {
    /// Feed URL to fetch, percent-encoded.
    pub url: Option<String>,
}

/// Error body shared by every failure response. `message` and `url` are
/// omitted, not null, when they do not apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
