//! Background cache warmer for the configured sources.

pub mod backoff;

pub use backoff::calculate_backoff_delay;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::config::FeedSource;
use crate::proxy::pipeline;

const BASE_BACKOFF_SECS: u32 = 30;

/// Periodically re-fetches every configured source so interactive requests
/// are served from cache. A failing source backs off on its own; the rest
/// of the sweep is unaffected.
pub struct Refresher {
    state: AppState,
    shutdown: CancellationToken,
}

struct SourceBackoff {
    failures: u32,
    next_attempt: DateTime<Utc>,
}

impl Refresher {
    pub fn new(state: AppState, shutdown: CancellationToken) -> Self {
        Self { state, shutdown }
    }

    pub async fn run(self) {
        let period = self.state.config.refresh_interval();
        if period.is_zero() {
            info!("feed refresher disabled");
            return;
        }
        info!(
            sources = self.state.config.sources().len(),
            period_secs = period.as_secs(),
            "feed refresher started"
        );

        // First tick completes immediately, warming the cache at startup.
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut backoffs: HashMap<String, SourceBackoff> = HashMap::new();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("feed refresher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep(&mut backoffs).await;
                }
            }
        }
    }

    async fn sweep(&self, backoffs: &mut HashMap<String, SourceBackoff>) {
        for source in self.state.config.sources() {
            if self.shutdown.is_cancelled() {
                break;
            }
            if let Some(state) = backoffs.get(&source.id)
                && Utc::now() < state.next_attempt
            {
                debug!(source = %source.id, "in backoff, skipped");
                continue;
            }
            self.refresh_source(source, backoffs).await;
        }
    }

    async fn refresh_source(
        &self,
        source: &FeedSource,
        backoffs: &mut HashMap<String, SourceBackoff>,
    ) {
        let result = {
            let _gate = self.state.flights.acquire(&source.url).await;
            if self.state.cache.lookup(&source.url).await.is_some() {
                // Interactive traffic already warmed this one.
                debug!(source = %source.id, "cache still fresh, skipped");
                None
            } else {
                let result = pipeline::run(
                    &source.url,
                    self.state.config.tls_exempt_hosts(),
                    self.state.config.sources(),
                )
                .await;
                if let Ok(feed) = &result {
                    self.state.cache.store(&source.url, feed.clone()).await;
                }
                Some(result)
            }
        };
        self.state.flights.sweep(&source.url);

        match result {
            None => {}
            Some(Ok(feed)) => {
                backoffs.remove(&source.id);
                info!(source = %source.id, items = feed.items.len(), "source refreshed");
            }
            Some(Err(err)) => {
                let failures = backoffs.get(&source.id).map_or(0, |state| state.failures);
                let delay = calculate_backoff_delay(failures, BASE_BACKOFF_SECS);
                backoffs.insert(
                    source.id.clone(),
                    SourceBackoff {
                        failures: failures + 1,
                        next_attempt: Utc::now()
                            + chrono::Duration::seconds(
                                i64::try_from(delay.as_secs()).unwrap_or(i64::MAX),
                            ),
                    },
                );
                warn!(
                    source = %source.id,
                    error = %err,
                    retry_in_secs = delay.as_secs(),
                    "refresh failed"
                );
            }
        }
    }
}
