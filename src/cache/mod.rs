//! Object cache layer.
//!
//! Memoizes values computed from content objects under keys derived from the
//! object's identity, with a TTL on every entry and explicit invalidation when the
//! object is written.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries = 2000
//! store_timeout_ms = 250
//! default_ttl_secs = 300
//! pattern_delete = true
//! ```

mod config;
mod keys;
mod memory;
mod object;
mod store;

pub use config::CacheConfig;
pub use keys::{CacheKey, entity_prefix};
pub use memory::MemoryCacheStore;
pub use object::ObjectCache;
pub use store::{CacheStore, CacheStoreError};

pub const METRIC_CACHE_HIT_TOTAL: &str = "rostergate_cache_hit_total";
pub const METRIC_CACHE_MISS_TOTAL: &str = "rostergate_cache_miss_total";
pub const METRIC_CACHE_STORE_ERROR_TOTAL: &str = "rostergate_cache_store_error_total";
pub const METRIC_CACHE_INVALIDATE_TOTAL: &str = "rostergate_cache_invalidate_total";
pub const METRIC_CACHE_EVICT_TOTAL: &str = "rostergate_cache_evict_total";
