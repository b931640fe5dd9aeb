//! Object caching and band-scoped edit permissions for an artist roster.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub(crate) mod util;
