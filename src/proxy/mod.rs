//! The `/api/rss` surface: request validation, the fetch → parse →
//! normalize pipeline, and the mapping of failures onto the wire contract.

pub mod dtos;
pub mod handlers;
pub mod pipeline;

pub use dtos::{ErrorBody, RssQuery};
pub use handlers::{preflight, proxy_feed};

use axum::http::StatusCode;
use thiserror::Error;

use crate::fetcher::FetchError;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("url query parameter missing or blank")]
    MissingUrl,
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("feed processing failed: {message}")]
    Parse { message: String },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl => StatusCode::BAD_REQUEST,
            Self::Fetch { .. } | Self::Parse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The exact error bodies clients depend on.
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::MissingUrl => ErrorBody {
                error: "URL parameter is required".to_string(),
                message: None,
                url: None,
            },
            Self::Fetch { url, source } => ErrorBody {
                error: "Failed to fetch RSS feed".to_string(),
                message: Some(source.to_string()),
                url: Some(url.clone()),
            },
            Self::Parse { message } => ErrorBody {
                error: "Failed to parse RSS feed".to_string(),
                message: Some(message.clone()),
                url: None,
            },
        }
    }
}
