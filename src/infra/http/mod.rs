//! HTTP adapters.

mod cache_control;

pub use cache_control::{ApiCachePolicy, api_cache_headers};
