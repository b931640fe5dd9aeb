//! In-process cache store with LRU eviction and lazy TTL expiry.

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;

use super::config::CacheConfig;
use super::store::{CacheStore, CacheStoreError};
use super::METRIC_CACHE_EVICT_TOTAL;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::memory";

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// LRU-bounded store living in the current process.
///
/// Expired entries are dropped when they are next read. Prefix deletion can be
/// switched off to behave like a backend that cannot enumerate keys.
pub struct MemoryCacheStore {
    entries: RwLock<LruCache<String, StoredEntry>>,
    pattern_delete: bool,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.max_entries_non_zero())),
            pattern_delete: config.pattern_delete,
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError> {
        let entry = StoredEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let evicted = rw_write(&self.entries, SOURCE, "set").push(key.to_string(), entry);
        if let Some((evicted_key, _)) = evicted
            && evicted_key != key
        {
            counter!(METRIC_CACHE_EVICT_TOTAL).increment(1);
        }
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheStoreError> {
        if !self.pattern_delete {
            return Err(CacheStoreError::Unsupported);
        }

        let mut entries = rw_write(&self.entries, SOURCE, "delete_prefix");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        Ok(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryCacheStore::new(&CacheConfig::default());
        store.set("artist:1:a", b"1".to_vec(), TTL).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("artist:1:a").await.unwrap(), Some(b"1".to_vec()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("artist:1:a").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_prefix_removes_only_matching_keys() {
        let store = MemoryCacheStore::new(&CacheConfig::default());
        for key in ["artist:1:a", "artist:1:b", "artist:12:a", "event:1:a"] {
            store.set(key, b"x".to_vec(), TTL).await.unwrap();
        }

        let removed = store.delete_prefix("artist:1:").await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.get("artist:1:a").await.unwrap().is_none());
        assert!(store.get("artist:12:a").await.unwrap().is_some());
        assert!(store.get("event:1:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_prefix_reports_unsupported_when_disabled() {
        let config = CacheConfig {
            pattern_delete: false,
            ..Default::default()
        };
        let store = MemoryCacheStore::new(&config);
        store.set("artist:1:a", b"x".to_vec(), TTL).await.unwrap();

        let err = store.delete_prefix("artist:1:").await.unwrap_err();
        assert!(matches!(err, CacheStoreError::Unsupported));
        assert!(store.get("artist:1:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn lru_evicts_least_recent_entry() {
        let config = CacheConfig {
            max_entries: 2,
            ..Default::default()
        };
        let store = MemoryCacheStore::new(&config);
        store.set("a", b"1".to_vec(), TTL).await.unwrap();
        store.set("b", b"2".to_vec(), TTL).await.unwrap();
        assert!(store.get("a").await.unwrap().is_some());
        store.set("c", b"3".to_vec(), TTL).await.unwrap();

        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("c").await.unwrap().is_some());
    }
}
