use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request timed out")]
    Timeout,

    #[error("http error {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("unusable payload: {0}")]
    InvalidPayload(String),

    #[error("network failure: {0}")]
    Network(String),
}

impl FetchError {
    /// Whether a later attempt could plausibly succeed. The proxy endpoint
    /// never retries; the background refresher uses this to decide between
    /// backing off and giving a source up until its next scheduled pass.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidUrl(_) => false,
            Self::InvalidPayload(_) => false,
            Self::HttpStatus(status) => status.is_server_error(),
            Self::Timeout => true,
            Self::Network(_) => true,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::Network("too many redirects".to_string())
        } else if let Some(status) = err.status() {
            Self::HttpStatus(status)
        } else {
            // DNS failures, refused connections, TLS handshake errors
            Self::Network(err.to_string())
        }
    }
}
