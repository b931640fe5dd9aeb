//! Key-value store abstraction behind the object cache.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache store unavailable: {message}")]
    Unavailable { message: String },
    #[error("cache store does not support prefix deletion")]
    Unsupported,
}

impl CacheStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Shared key-value store holding encoded cache values.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored bytes, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError>;

    /// Stores bytes under `key` for at most `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Removes every key starting with `prefix` and returns how many were removed.
    ///
    /// Stores without this capability keep the default, which reports `Unsupported`.
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheStoreError> {
        let _ = prefix;
        Err(CacheStoreError::Unsupported)
    }
}
