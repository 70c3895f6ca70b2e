//! Redis-backed cache store.
//!
//! One managed connection is opened lazily and shared by every request; it
//! reconnects on its own after the server drops it. Each round trip is
//! bounded by the configured operation timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client as RedisClient, RedisResult};
use tokio::sync::OnceCell;

use crate::cache::store::{CacheStore, CacheStoreError};

/// Atomically INCR a counter and attach the window expiry on creation.
///
/// Doing both in one script means a crash between the two commands can't
/// leave a counter that never expires.
const INCR_WITH_EXPIRY_SCRIPT: &str = r"local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count";

pub struct RedisStore {
    client: RedisClient,
    connection: OnceCell<ConnectionManager>,
    op_timeout: Duration,
    /// Hashed once; `invoke_async` runs it by SHA and loads it on a miss.
    incr_script: redis::Script,
}

impl RedisStore {
    /// Validate the URL and prepare a client. No connection is made yet.
    pub fn open(url: &str, op_timeout: Duration) -> Result<Self, CacheStoreError> {
        Ok(Self {
            client: RedisClient::open(url)?,
            connection: OnceCell::new(),
            op_timeout,
            incr_script: redis::Script::new(INCR_WITH_EXPIRY_SCRIPT),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, CacheStoreError> {
        let connection = self
            .connection
            .get_or_try_init(|| self.bounded(ConnectionManager::new(self.client.clone())))
            .await?;
        Ok(connection.clone())
    }

    async fn bounded<T>(
        &self,
        operation: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, CacheStoreError> {
        match tokio::time::timeout(self.op_timeout, operation).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheStoreError::Timeout(self.op_timeout)),
        }
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("op_timeout", &self.op_timeout)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheStoreError> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheStoreError> {
        let mut conn = self.connection().await?;
        // SET EX has one-second resolution; never round a TTL down to "no expiry".
        let seconds = ttl.as_secs().max(1);
        self.bounded(conn.set_ex::<_, _, ()>(key, value, seconds)).await
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64, CacheStoreError> {
        let mut conn = self.connection().await?;
        let millis = ttl.as_millis().max(1) as i64;
        self.bounded(self.incr_script.key(key).arg(millis).invoke_async::<i64>(&mut conn))
            .await
    }
}
