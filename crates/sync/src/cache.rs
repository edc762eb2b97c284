//! Cached reads using Moka.
//!
//! Lists and dashboards read through a [`ReadCache`]. After a replay writes
//! new records upstream, every cached read may be stale, so the coordinator
//! drops all of them at once through [`CacheInvalidator`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live for cache entries (5 minutes).
const DEFAULT_TTL_SECS: u64 = 300;

/// Receives the broad "everything may be stale" signal.
pub trait CacheInvalidator: Send + Sync {
    /// Invalidates every cached read.
    fn invalidate_all(&self);
}

/// Cache of remote reads keyed by query.
#[derive(Clone)]
pub struct ReadCache {
    cache: Cache<String, Arc<Value>>,
}

impl ReadCache {
    /// Creates a read cache with default settings.
    ///
    /// Default: 1000 entries max, 5 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a read cache with custom capacity and time-to-live.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    /// Returns the cached value for `key`, fetching and caching it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; nothing is cached in that case.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<Arc<Value>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(cached) = self.cache.get(key).await {
            return Ok(cached);
        }

        let value = Arc::new(fetch().await?);
        self.cache.insert(key.to_string(), Arc::clone(&value)).await;
        Ok(value)
    }

    /// Returns the cached value for `key`.
    pub async fn get(&self, key: &str) -> Option<Arc<Value>> {
        self.cache.get(key).await
    }

    /// Invalidates the entry for `key`.
    pub async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    /// Returns the number of entries currently in the cache.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheInvalidator for ReadCache {
    fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
