//! Object cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_MAX_ENTRIES: usize = 2_000;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 250;
const DEFAULT_TTL_SECS: u64 = 300;

/// Cache configuration from `rostergate.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// When off, every lookup computes directly and invalidation is skipped.
    pub enabled: bool,
    /// Maximum entries held by the in-process store.
    pub max_entries: usize,
    /// Client-side bound on every store round trip.
    pub store_timeout_ms: u64,
    /// TTL applied by callers that have no computation-specific TTL.
    pub default_ttl_secs: u64,
    /// Whether the store can delete keys by prefix.
    pub pattern_delete: bool,
    /// Namespace prepended to every key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: DEFAULT_MAX_ENTRIES,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            default_ttl_secs: DEFAULT_TTL_SECS,
            pattern_delete: true,
            key_prefix: String::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            max_entries: settings.max_entries.get(),
            store_timeout_ms: settings.store_timeout.as_millis() as u64,
            default_ttl_secs: settings.default_ttl.as_secs(),
            pattern_delete: settings.pattern_delete,
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

impl CacheConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// TTL actually written for an entry requested with `requested`.
    ///
    /// Without prefix deletes nothing is ever invalidated, so no entry may outlive
    /// the default TTL.
    pub fn entry_ttl(&self, requested: Duration) -> Duration {
        if self.pattern_delete {
            requested
        } else {
            requested.min(self.default_ttl())
        }
    }

    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
