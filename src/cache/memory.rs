use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;

use super::{CachedFeed, FeedCache};
use crate::normalizer::CanonicalFeed;

/// In-memory TTL cache. A TTL of zero disables it entirely: nothing is
/// stored and every lookup misses.
pub struct MemoryFeedCache {
    entries: DashMap<String, CachedFeed>,
    ttl_secs: u64,
}

impl MemoryFeedCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            ttl_secs,
        }
    }

    fn is_fresh(&self, entry: &CachedFeed) -> bool {
        let ttl = Duration::seconds(i64::try_from(self.ttl_secs).unwrap_or(i64::MAX));
        Utc::now().signed_duration_since(entry.stored_at) <= ttl
    }
}

#[async_trait]
impl FeedCache for MemoryFeedCache {
    async fn lookup(&self, url: &str) -> Option<CachedFeed> {
        if self.ttl_secs == 0 {
            return None;
        }
        let fresh = self
            .entries
            .get(url)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value().clone());
        if fresh.is_none() {
            // Stale entries are evicted on sight so entry_count stays honest.
            self.entries.remove_if(url, |_, entry| !self.is_fresh(entry));
        }
        fresh
    }

    async fn store(&self, url: &str, feed: CanonicalFeed) {
        if self.ttl_secs == 0 {
            return;
        }
        self.entries.insert(
            url.to_string(),
            CachedFeed {
                feed,
                stored_at: Utc::now(),
            },
        );
    }

    async fn invalidate(&self, url: &str) {
        self.entries.remove(url);
    }

    async fn entry_count(&self) -> usize {
        self.entries.len()
    }
}
