//! Per-object memoization with TTL expiry and explicit invalidation.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::domain::types::EntityRef;

use super::config::CacheConfig;
use super::keys::{CacheKey, entity_prefix};
use super::store::{CacheStore, CacheStoreError};
use super::{
    METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_INVALIDATE_TOTAL, METRIC_CACHE_MISS_TOTAL,
    METRIC_CACHE_STORE_ERROR_TOTAL,
};

enum Lookup<T> {
    Hit(T),
    /// Absent from a healthy store; the computed value should be written back.
    Miss,
    /// Store unreachable or cache disabled; compute without writing back.
    Bypass,
}

/// Memoizes values derived from content objects.
///
/// Store failures never reach callers: reads fall back to computing directly and
/// invalidation quietly does nothing, leaving staleness bounded by the TTL.
#[derive(Clone)]
pub struct ObjectCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl ObjectCache {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached `computation` for `entity`, computing and storing it on a miss.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        entity: EntityRef,
        computation: &str,
        ttl: Duration,
        compute: F,
    ) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.get_or_compute_key(&CacheKey::object(entity, computation), ttl, compute)
            .await
    }

    /// Like [`get_or_compute`](Self::get_or_compute) for fallible computations.
    /// Errors are returned as-is and never cached.
    pub async fn try_get_or_compute<T, E, F, Fut>(
        &self,
        entity: EntityRef,
        computation: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.try_get_or_compute_key(&CacheKey::object(entity, computation), ttl, compute)
            .await
    }

    /// Memoizes a lookup that is not tied to one entity. Such entries are never
    /// invalidated explicitly and expire by TTL only.
    pub async fn get_or_compute_named<T, F, Fut>(
        &self,
        namespace: &str,
        name: &str,
        ttl: Duration,
        compute: F,
    ) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.get_or_compute_key(&CacheKey::named(namespace, name), ttl, compute)
            .await
    }

    /// Fallible form of [`get_or_compute_named`](Self::get_or_compute_named).
    pub async fn try_get_or_compute_named<T, E, F, Fut>(
        &self,
        namespace: &str,
        name: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.try_get_or_compute_key(&CacheKey::named(namespace, name), ttl, compute)
            .await
    }

    /// Drops every cached computation of `entity`.
    ///
    /// A no-op when the store cannot delete by prefix or is unreachable.
    pub async fn invalidate(&self, entity: EntityRef) {
        if !self.config.enabled {
            return;
        }

        let prefix = entity_prefix(&self.config.key_prefix, entity);
        match timeout(self.config.store_timeout(), self.store.delete_prefix(&prefix)).await {
            Ok(Ok(removed)) => {
                counter!(METRIC_CACHE_INVALIDATE_TOTAL).increment(removed as u64);
                debug!(%entity, removed, "invalidated cached computations");
            }
            Ok(Err(CacheStoreError::Unsupported)) => {
                debug!(
                    %entity,
                    "store cannot delete by prefix; entries expire by ttl"
                );
            }
            Ok(Err(error)) => {
                counter!(METRIC_CACHE_STORE_ERROR_TOTAL).increment(1);
                warn!(%entity, error = %error, "cache invalidation failed");
            }
            Err(_) => {
                counter!(METRIC_CACHE_STORE_ERROR_TOTAL).increment(1);
                warn!(
                    %entity,
                    timeout_ms = self.config.store_timeout_ms,
                    "cache invalidation timed out"
                );
            }
        }
    }

    async fn get_or_compute_key<T, F, Fut>(&self, key: &CacheKey, ttl: Duration, compute: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let result = self
            .try_get_or_compute_key(key, ttl, move || async move {
                Ok::<T, Infallible>(compute().await)
            })
            .await;
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    async fn try_get_or_compute_key<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let rendered = key.render(&self.config.key_prefix);
        match self.lookup(&rendered).await {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss => {
                let value = compute().await?;
                self.write_back(&rendered, &value, self.config.entry_ttl(ttl))
                    .await;
                Ok(value)
            }
            Lookup::Bypass => compute().await,
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        if !self.config.enabled {
            return Lookup::Bypass;
        }

        match timeout(self.config.store_timeout(), self.store.get(key)).await {
            Ok(Ok(Some(bytes))) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HIT_TOTAL).increment(1);
                    debug!(key, outcome = "hit", "object cache lookup");
                    Lookup::Hit(value)
                }
                Err(error) => {
                    counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
                    warn!(key, error = %error, "discarding undecodable cache entry");
                    Lookup::Miss
                }
            },
            Ok(Ok(None)) => {
                counter!(METRIC_CACHE_MISS_TOTAL).increment(1);
                debug!(key, outcome = "miss", "object cache lookup");
                Lookup::Miss
            }
            Ok(Err(error)) => {
                counter!(METRIC_CACHE_STORE_ERROR_TOTAL).increment(1);
                warn!(key, error = %error, "cache read failed; computing directly");
                Lookup::Bypass
            }
            Err(_) => {
                counter!(METRIC_CACHE_STORE_ERROR_TOTAL).increment(1);
                warn!(
                    key,
                    timeout_ms = self.config.store_timeout_ms,
                    "cache read timed out; computing directly"
                );
                Lookup::Bypass
            }
        }
    }

    async fn write_back<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(key, error = %error, "cache value not serializable; skipping store");
                return;
            }
        };

        match timeout(self.config.store_timeout(), self.store.set(key, bytes, ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                counter!(METRIC_CACHE_STORE_ERROR_TOTAL).increment(1);
                warn!(key, error = %error, "cache write failed");
            }
            Err(_) => {
                counter!(METRIC_CACHE_STORE_ERROR_TOTAL).increment(1);
                warn!(
                    key,
                    timeout_ms = self.config.store_timeout_ms,
                    "cache write timed out"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::MemoryCacheStore;
    use crate::domain::types::{ContentKind, EntityId};

    const TTL: Duration = Duration::from_secs(300);

    fn artist(id: i64) -> EntityRef {
        EntityRef::new(ContentKind::Artist, EntityId(id))
    }

    fn memory_cache(config: CacheConfig) -> ObjectCache {
        ObjectCache::new(Arc::new(MemoryCacheStore::new(&config)), config)
    }

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
            Err(CacheStoreError::unavailable("connection refused"))
        }

        async fn set(
            &self,
            _key: &str,
            _value: Vec<u8>,
            _ttl: Duration,
        ) -> Result<(), CacheStoreError> {
            Err(CacheStoreError::unavailable("connection refused"))
        }

        async fn delete_prefix(&self, _prefix: &str) -> Result<usize, CacheStoreError> {
            Err(CacheStoreError::unavailable("connection refused"))
        }
    }

    struct StalledStore;

    #[async_trait]
    impl CacheStore for StalledStore {
        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
            std::future::pending().await
        }

        async fn set(
            &self,
            _key: &str,
            _value: Vec<u8>,
            _ttl: Duration,
        ) -> Result<(), CacheStoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn second_call_within_ttl_is_served_from_cache() {
        let cache = memory_cache(CacheConfig::default());
        let calls = &AtomicUsize::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .get_or_compute(artist(1), "upcoming_event_count", TTL, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    7
                })
                .await;
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_drops_every_computation_of_the_entity() {
        let cache = memory_cache(CacheConfig::default());
        let calls = &AtomicUsize::new(0);
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            "value".to_string()
        };

        let _: String = cache.get_or_compute(artist(1), "a", TTL, compute).await;
        let _: String = cache.get_or_compute(artist(1), "b", TTL, compute).await;
        let _: String = cache.get_or_compute(artist(2), "a", TTL, compute).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.invalidate(artist(1)).await;

        let _: String = cache.get_or_compute(artist(1), "a", TTL, compute).await;
        let _: String = cache.get_or_compute(artist(1), "b", TTL, compute).await;
        let _: String = cache.get_or_compute(artist(2), "a", TTL, compute).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn invalidate_without_pattern_delete_is_a_no_op() {
        let cache = memory_cache(CacheConfig {
            pattern_delete: false,
            ..Default::default()
        });
        let calls = &AtomicUsize::new(0);
        let compute = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            1u8
        };

        let _: u8 = cache.get_or_compute(artist(1), "a", TTL, compute).await;
        cache.invalidate(artist(1)).await;
        let _: u8 = cache.get_or_compute(artist(1), "a", TTL, compute).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_recomputed() {
        let cache = memory_cache(CacheConfig::default());
        let calls = &AtomicUsize::new(0);
        let compute = move || async move { calls.fetch_add(1, Ordering::SeqCst) };

        let first: usize = cache
            .get_or_compute(artist(1), "a", Duration::from_secs(10), compute)
            .await;
        tokio::time::advance(Duration::from_secs(11)).await;
        let second: usize = cache
            .get_or_compute(artist(1), "a", Duration::from_secs(10), compute)
            .await;

        assert_eq!((first, second), (0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn long_ttls_are_capped_when_nothing_can_be_invalidated() {
        let cache = memory_cache(CacheConfig {
            pattern_delete: false,
            default_ttl_secs: 60,
            ..Default::default()
        });
        let calls = &AtomicUsize::new(0);
        let compute = move || async move { calls.fetch_add(1, Ordering::SeqCst) };
        let requested = Duration::from_secs(600);

        let _: usize = cache.get_or_compute(artist(1), "a", requested, compute).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let _: usize = cache.get_or_compute(artist(1), "a", requested, compute).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        let _: usize = cache.get_or_compute(artist(1), "a", requested, compute).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn broken_store_falls_back_to_direct_computation() {
        let cache = ObjectCache::new(Arc::new(BrokenStore), CacheConfig::default());
        let calls = &AtomicUsize::new(0);

        for _ in 0..2 {
            let value: i32 = cache
                .get_or_compute(artist(1), "a", TTL, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    5
                })
                .await;
            assert_eq!(value, 5);
        }
        cache.invalidate(artist(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_times_out_and_computes() {
        let cache = ObjectCache::new(Arc::new(StalledStore), CacheConfig::default());

        let value: String = cache
            .get_or_compute(artist(3), "a", TTL, move || async move { "fresh".to_string() })
            .await;
        assert_eq!(value, "fresh");

        cache.invalidate(artist(3)).await;
    }

    #[tokio::test]
    async fn failed_computations_are_not_cached() {
        let cache = memory_cache(CacheConfig::default());
        let calls = &AtomicUsize::new(0);

        let first: Result<u32, &str> = cache
            .try_get_or_compute(artist(1), "a", TTL, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("datastore down")
            })
            .await;
        assert!(first.is_err());

        let second: Result<u32, &str> = cache
            .try_get_or_compute(artist(1), "a", TTL, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(3)
            })
            .await;
        assert_eq!(second, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_cache_always_computes() {
        let cache = memory_cache(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let calls = &AtomicUsize::new(0);

        for _ in 0..3 {
            let _: u8 = cache
                .get_or_compute_named("ns", "name", TTL, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    0
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn undecodable_entries_are_recomputed_and_overwritten() {
        let config = CacheConfig::default();
        let store = Arc::new(MemoryCacheStore::new(&config));
        store
            .set("artist:1:a", b"not json".to_vec(), TTL)
            .await
            .unwrap();
        let cache = ObjectCache::new(store.clone(), config);

        let value: u32 = cache.get_or_compute(artist(1), "a", TTL, move || async move { 9 }).await;
        assert_eq!(value, 9);
        assert_eq!(store.get("artist:1:a").await.unwrap(), Some(b"9".to_vec()));
    }
}
