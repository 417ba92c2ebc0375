use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-URL flight gate. Concurrent requests for the same URL serialize on
/// a shared mutex: the first caller fetches while the rest wait, re-check
/// the cache, and coalesce onto the stored result.
#[derive(Default)]
pub struct FlightGroup {
    gates: DashMap<String, Arc<Mutex<()>>>,
}

impl FlightGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the gate for `url`, waiting out any in-flight fetch first.
    pub async fn acquire(&self, url: &str) -> OwnedMutexGuard<()> {
        let gate = self
            .gates
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        gate.lock_owned().await
    }

    /// Drops the gate for `url` if nobody holds or waits on it. Best
    /// effort: a gate that is raced stays in the map until the next sweep.
    pub fn sweep(&self, url: &str) {
        self.gates
            .remove_if(url, |_, gate| Arc::strong_count(gate) == 1);
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
