use std::sync::Arc;

use crate::cache::{FeedCache, FlightGroup, MemoryFeedCache};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn FeedCache + Send + Sync>,
    pub flights: Arc<FlightGroup>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            cache: Arc::new(MemoryFeedCache::new(config.cache_ttl_secs())),
            flights: Arc::new(FlightGroup::new()),
            config: Arc::new(config),
        }
    }
}
