//! Redis pub/sub event bus.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tollgate_application::EventBus;
use tollgate_core::{AppError, AppResult};

use crate::redis_connection::RedisConnection;

/// Publishes events on Redis channels named `{prefix}:{topic}`.
#[derive(Clone)]
pub struct RedisEventBus {
    redis: RedisConnection,
    key_prefix: String,
}

impl RedisEventBus {
    /// Creates an event bus with a configured Redis client and channel prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            redis: RedisConnection::new(client),
            key_prefix: key_prefix.into(),
        }
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, topic: &str, payload: Value) -> AppResult<()> {
        let channel = format!("{}:{topic}", self.key_prefix);
        let mut connection = self.redis.get().await?;

        let _: i64 = connection
            .publish(channel, payload.to_string())
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to publish '{topic}' event: {error}"))
            })?;

        Ok(())
    }
}
