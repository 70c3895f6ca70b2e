//! Key/value store abstraction shared by the response cache and the rate limiter.

use std::time::Duration;

use async_trait::async_trait;

/// Errors talking to the cache store.
///
/// These never reach a client: reads degrade to a miss, writes are logged
/// and dropped, and the rate limiter turns them into a deny.
#[derive(Debug, thiserror::Error)]
pub enum CacheStoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("cache store did not answer within {0:?}")]
    Timeout(Duration),

    #[error("value at '{0}' is not an integer")]
    NotAnInteger(String),
}

/// Remote key/value store contract.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value; `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Atomically increment an integer counter and return the new value.
    ///
    /// A counter created by this call expires after `ttl`; incrementing an
    /// existing counter leaves its expiry untouched.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheStoreError>;
}
