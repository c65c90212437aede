//! Redis-backed request analytics counters.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tollgate_application::{AnalyticsCounters, AnalyticsStore};
use tollgate_core::{AppError, AppResult};

use crate::redis_connection::RedisConnection;

/// Redis implementation of the analytics store port.
#[derive(Clone)]
pub struct RedisAnalyticsStore {
    redis: RedisConnection,
    key_prefix: String,
}

impl RedisAnalyticsStore {
    /// Creates a store with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            redis: RedisConnection::new(client),
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, name: &str) -> String {
        format!("{}:analytics:{name}", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<ConnectionManager> {
        self.redis.get().await
    }
}

#[async_trait]
impl AnalyticsStore for RedisAnalyticsStore {
    async fn record_request(
        &self,
        source_id: &str,
        endpoint: &str,
        blocked: bool,
    ) -> AppResult<()> {
        let mut pipeline = redis::pipe();
        pipeline
            .atomic()
            .incr(self.key_for("total_requests"), 1_u64)
            .ignore()
            .sadd(self.key_for("sources"), source_id)
            .ignore()
            .hincr(self.key_for("endpoints"), endpoint, 1_u64)
            .ignore();
        if blocked {
            pipeline
                .incr(self.key_for("blocked_requests"), 1_u64)
                .ignore();
        }

        let mut connection = self.connection().await?;
        let _: () = pipeline
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to record request analytics: {error}"))
            })?;

        Ok(())
    }

    async fn counters(&self) -> AppResult<AnalyticsCounters> {
        let mut connection = self.connection().await?;
        let (total_requests, blocked_requests, unique_sources, endpoint_counts): (
            Option<u64>,
            Option<u64>,
            u64,
            HashMap<String, u64>,
        ) = redis::pipe()
            .get(self.key_for("total_requests"))
            .get(self.key_for("blocked_requests"))
            .scard(self.key_for("sources"))
            .hgetall(self.key_for("endpoints"))
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to read request analytics: {error}"))
            })?;

        Ok(AnalyticsCounters {
            total_requests: total_requests.unwrap_or(0),
            blocked_requests: blocked_requests.unwrap_or(0),
            unique_sources,
            endpoint_counts: endpoint_counts.into_iter().collect(),
        })
    }
}
