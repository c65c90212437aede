//! Redis-backed admission counter store.

use async_trait::async_trait;
use redis::Script;
use redis::aio::ConnectionManager;
use tollgate_application::{CounterReading, CounterStore};
use tollgate_core::{AppError, AppResult};
use tracing::debug;

use crate::redis_connection::RedisConnection;

const INCR_EXPIRE_TTL_SCRIPT: &str = r#"
local key = KEYS[1]
local ttl_seconds = tonumber(ARGV[1])

local count = redis.call('INCR', key)
redis.call('EXPIRE', key, ttl_seconds)
local ttl = redis.call('TTL', key)

return {count, ttl}
"#;

const DECR_IF_PRESENT_SCRIPT: &str = r#"
local key = KEYS[1]

if redis.call('EXISTS', key) == 0 then
  return 0
end

redis.call('DECR', key)
return 1
"#;

/// Redis implementation of the counter store port.
///
/// Every mutation is a single Lua script, so concurrent gateways sharing the
/// same Redis never interleave inside one counter update.
#[derive(Clone)]
pub struct RedisCounterStore {
    redis: RedisConnection,
    key_prefix: String,
}

impl RedisCounterStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            redis: RedisConnection::new(client),
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, key: &str) -> String {
        format!("{}:counter:{key}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<ConnectionManager> {
        self.redis.get().await
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr_expire_ttl(&self, key: &str, ttl_seconds: u64) -> AppResult<CounterReading> {
        if ttl_seconds == 0 {
            return Err(AppError::PolicyConfiguration(
                "counter ttl must be greater than zero".to_owned(),
            ));
        }

        let mut connection = self.connection().await?;
        let (count, ttl): (i64, i64) = Script::new(INCR_EXPIRE_TTL_SCRIPT)
            .key(self.key_for(key))
            .arg(ttl_seconds)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to increment redis counter: {error}"))
            })?;

        let count = u64::try_from(count)
            .map_err(|error| AppError::Internal(format!("invalid redis counter value: {error}")))?;

        Ok(CounterReading {
            count,
            ttl_seconds: ttl,
        })
    }

    async fn decr(&self, key: &str) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let decremented: i64 = Script::new(DECR_IF_PRESENT_SCRIPT)
            .key(self.key_for(key))
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to decrement redis counter: {error}"))
            })?;

        if decremented == 0 {
            debug!(key = %key, "counter expired before compensation");
        }

        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|error| AppError::StoreUnavailable(format!("redis ping failed: {error}")))?;

        Ok(())
    }
}
