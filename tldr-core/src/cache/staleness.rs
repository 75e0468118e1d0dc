//! Staleness check for the page store

use std::time::{Duration, SystemTime};

use super::ContentStore;
use crate::error::Result;

/// Reports whether the store is older than the freshness window
#[derive(Debug, Clone)]
pub struct StalenessMonitor {
    store: ContentStore,
    window: Duration,
}

impl StalenessMonitor {
    pub fn new(store: ContentStore, window: Duration) -> Self {
        Self { store, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether the store is stale at `now`.
    ///
    /// Fails with `StoreUnavailable` when the store was never created, so
    /// "never cached" stays distinct from "stale".
    pub async fn is_stale(&self, now: SystemTime) -> Result<bool> {
        let last_modified = self.store.last_modified().await?;
        Ok(self.is_stale_at(last_modified, now))
    }

    /// Stale iff `now - last_modified` is strictly greater than the window.
    /// A timestamp in the future is fresh.
    pub fn is_stale_at(&self, last_modified: SystemTime, now: SystemTime) -> bool {
        match now.duration_since(last_modified) {
            Ok(age) => age > self.window,
            Err(_) => false,
        }
    }
}
