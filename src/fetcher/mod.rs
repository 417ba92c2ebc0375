pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use client::{fetch, fetch_with, host_is_tls_exempt};
pub use errors::FetchError;
pub use types::{Charset, FeedResponse};
