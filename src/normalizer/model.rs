use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The stable output contract: whatever dialect the upstream feed spoke,
/// clients always receive this shape. `items` is always present, possibly
/// empty, never null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CanonicalFeed {
    pub title: String,
    pub description: String,
    pub link: String,
    pub source: String,
    pub items: Vec<CanonicalItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CanonicalItem {
    /// Unique within the feed; stable across fetches whenever the upstream
    /// item carries a guid, id or link.
    pub id: String,
    pub title: String,
    /// HTML allowed.
    pub content: String,
    pub link: String,
    /// Best-effort date string, not guaranteed parseable.
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub author: String,
    pub categories: Vec<String>,
    /// `null` when no thumbnail could be resolved.
    pub thumbnail: Option<String>,
    pub source: String,
}
