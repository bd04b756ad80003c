//! In-Memory Response Cache
//!
//! Thread-safe TTL cache in front of the data gateway. DashMap keeps
//! concurrent reads cheap; a per-key async lock coalesces in-flight
//! fetches so one upstream call serves every concurrent requester.
//!
//! Invariants:
//! - at most one in-flight fetch per key at any time
//! - a fresh hit (within TTL) short-circuits the fetcher entirely
//! - on fetcher failure a stale entry, however old, is served instead
//!   of the error; expired entries are therefore never auto-evicted
//! - set/get/invalidate/clear bypass the fetch path
//!
//! Constructed explicitly and owned by AppState; TTL is per key,
//! supplied by the caller at call time.

use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::errors::AppResult;

/// Cache entry with creation time for TTL validation
#[derive(Clone, Debug)]
struct CacheEntry {
    value: Value,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.created_at.elapsed() <= self.ttl
    }
}

/// Process-wide response cache with request coalescing
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<DashMap<String, CacheEntry>>,
    /// Per-key locks serializing fetches for the same key
    inflight: Arc<DashMap<String, Arc<Mutex<()>>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    stale_serves: Arc<AtomicU64>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            inflight: Arc::new(DashMap::new()),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            stale_serves: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fetch-through read.
    ///
    /// Concurrent callers for the same key await the same pending fetch;
    /// only the first invokes the fetcher, the rest observe the fresh
    /// entry it wrote. On fetcher failure any previous value is returned
    /// instead of the error.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetcher: F) -> AppResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Value>>,
    {
        // Fast path: fresh hit without touching the per-key lock
        if let Some(value) = self.get_fresh(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("✅ CACHE HIT: {}", key);
            return Ok(value);
        }

        let lock = {
            let entry = self
                .inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            entry.value().clone()
        };
        let _guard = lock.lock().await;

        // A coalesced caller lands here after the leader finished
        if let Some(value) = self.get_fresh(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("✅ CACHE HIT (coalesced): {}", key);
            return Ok(value);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("📭 CACHE MISS: {}", key);

        match fetcher().await {
            Ok(value) => {
                self.store.insert(
                    key.to_string(),
                    CacheEntry {
                        value: value.clone(),
                        created_at: Instant::now(),
                        ttl,
                    },
                );
                Ok(value)
            }
            Err(err) => {
                // Stale-on-failure: any previous value beats the error
                if let Some(entry) = self.store.get(key) {
                    self.stale_serves.fetch_add(1, Ordering::Relaxed);
                    warn!("⚠️ Fetch failed for {}, serving stale entry: {}", key, err);
                    Ok(entry.value.clone())
                } else {
                    Err(err)
                }
            }
        }
    }

    fn get_fresh(&self, key: &str) -> Option<Value> {
        self.store
            .get(key)
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.value.clone())
    }

    /// Manual read, fresh entries only
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.get_fresh(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Manual write, bypassing the fetch path
    pub fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.store.insert(
            key.to_string(),
            CacheEntry {
                value,
                created_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.store.remove(key);
        debug!("🗑️ CACHE INVALIDATE: {}", key);
    }

    pub fn clear(&self) {
        self.store.clear();
        self.inflight.clear();
        debug!("🗑️ CACHE CLEARED");
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            stale_serves: self.stale_serves.load(Ordering::Relaxed),
            hit_rate,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub stale_serves: u64,
    pub hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::AppError;
    use serde_json::json;

    #[tokio::test]
    async fn test_fresh_hit_short_circuits() {
        let cache = ResponseCache::new();
        let counter = Arc::new(AtomicU64::new(0));

        for _ in 0..3 {
            let counter = counter.clone();
            let value = cache
                .get_or_fetch("tvl:solana", Duration::from_secs(60), move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"tvl": 42}))
                })
                .await
                .unwrap();
            assert_eq!(value, json!({"tvl": 42}));
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_coalesce() {
        let cache = ResponseCache::new();
        let counter = Arc::new(AtomicU64::new(0));

        let make_call = |cache: ResponseCache, counter: Arc<AtomicU64>| async move {
            cache
                .get_or_fetch("acct:abc", Duration::from_secs(60), move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(json!("payload"))
                })
                .await
                .unwrap()
        };

        let (a, b) = tokio::join!(
            make_call(cache.clone(), counter.clone()),
            make_call(cache.clone(), counter.clone())
        );

        assert_eq!(a, json!("payload"));
        assert_eq!(b, json!("payload"));
        assert_eq!(counter.load(Ordering::SeqCst), 1, "fetcher must run once");
    }

    #[tokio::test]
    async fn test_stale_served_on_failure() {
        let cache = ResponseCache::new();

        cache
            .get_or_fetch("price:SOL", Duration::from_millis(10), || async {
                Ok(json!(142.5))
            })
            .await
            .unwrap();

        // Let the entry expire, then fail the refetch
        tokio::time::sleep(Duration::from_millis(30)).await;

        let value = cache
            .get_or_fetch("price:SOL", Duration::from_millis(10), || async {
                Err(AppError::rpc_timeout("upstream down"))
            })
            .await
            .unwrap();

        assert_eq!(value, json!(142.5));
        assert_eq!(cache.stats().stale_serves, 1);
    }

    #[tokio::test]
    async fn test_error_propagates_without_previous_value() {
        let cache = ResponseCache::new();
        let result = cache
            .get_or_fetch("missing", Duration::from_secs(1), || async {
                Err(AppError::rpc_timeout("no luck"))
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_manual_set_get_invalidate() {
        let cache = ResponseCache::new();
        cache.set("k", json!(1), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!(1)));

        cache.invalidate("k");
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test]
    async fn test_stats_counters() {
        let cache = ResponseCache::new();
        cache.set("k", json!(1), Duration::from_secs(60));
        cache.get("k");
        cache.get("nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }
}
