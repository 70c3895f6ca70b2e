//! Fixed-window rate limiting backed by the shared cache store.
//!
//! The counter lives in the store, not in the gateway, so every gateway
//! replica pointed at the same store shares one budget per client.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;

pub struct RateLimiter {
    store: Arc<dyn CacheStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn key(client: &str) -> String {
        format!("rate-limit:{client}")
    }

    /// Count one request for `client` and decide whether it may proceed.
    ///
    /// The first request of a window creates the counter with TTL `window`.
    /// Requests are allowed while the count stays within `limit`. A store
    /// failure denies.
    pub async fn allow(&self, client: &str, limit: u64, window: Duration) -> bool {
        let key = Self::key(client);
        match self.store.incr(&key, window).await {
            Ok(count) => count > 0 && (count as u64) <= limit,
            Err(e) => {
                tracing::warn!(client = %client, error = %e, "Rate limit store unavailable, denying");
                false
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish_non_exhaustive()
    }
}
