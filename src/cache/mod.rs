//! Response cache subsystem.
//!
//! # Data Flow
//! ```text
//! request URI → cache_key() → "cache:<path>[?<query>]"
//!     → ResponseCache::lookup (miss on any store error)
//!     → ... upstream call on miss ...
//!     → ResponseCache::store (best-effort, errors logged and dropped)
//! ```
//!
//! # Design Decisions
//! - Store behind a trait: Redis in production, in-process map for local runs
//! - Fixed TTL applied at write time; eviction belongs to the store
//! - Caching never fails a client-facing request

use std::sync::Arc;
use std::time::Duration;

use axum::http::Uri;

pub mod memory;
pub mod redis_store;
pub mod store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::{CacheStore, CacheStoreError};

use crate::observability::metrics;

/// Cache key for a request: the path, plus the raw query string when present.
pub fn cache_key(uri: &Uri) -> String {
    match uri.query() {
        Some(query) if !query.is_empty() => format!("cache:{}?{}", uri.path(), query),
        _ => format!("cache:{}", uri.path()),
    }
}

/// Cache-aside layer over a [`CacheStore`].
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Look up a cached body. Store failures read as a miss.
    pub async fn lookup(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(Some(value)) => {
                metrics::record_cache_lookup(true);
                Some(value)
            }
            Ok(None) => {
                metrics::record_cache_lookup(false);
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to get cache, treating as miss");
                metrics::record_cache_lookup(false);
                None
            }
        }
    }

    /// Write a body under `key` with the configured TTL.
    pub async fn store(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value, self.ttl).await {
            tracing::warn!(key = %key, error = %e, "Failed to cache response");
        }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").field("ttl", &self.ttl).finish()
    }
}
