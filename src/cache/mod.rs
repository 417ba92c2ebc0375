//! Per-URL caching of normalized feeds, plus the flight gate that keeps
//! upstream fetches single.

pub mod flight;
pub mod memory;

pub use flight::FlightGroup;
pub use memory::MemoryFeedCache;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

use crate::normalizer::CanonicalFeed;

/// A normalized feed together with the instant it was stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedFeed {
    pub feed: CanonicalFeed,
    pub stored_at: DateTime<Utc>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FeedCache {
    /// Returns the entry for `url` if present and still fresh.
    async fn lookup(&self, url: &str) -> Option<CachedFeed>;
    async fn store(&self, url: &str, feed: CanonicalFeed);
    async fn invalidate(&self, url: &str);
    /// Live entry count, reported by the health endpoint.
    async fn entry_count(&self) -> usize;
}
