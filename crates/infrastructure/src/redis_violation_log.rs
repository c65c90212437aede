//! Redis-backed violation log.
//!
//! Violations live in one sorted set scored by epoch milliseconds; lifetime
//! per-source counts live in one hash next to it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tollgate_application::{StoredViolation, ViolationLog};
use tollgate_core::{AppError, AppResult};
use tollgate_domain::Violation;

use crate::redis_connection::RedisConnection;

/// Redis implementation of the violation log port.
#[derive(Clone)]
pub struct RedisViolationLog {
    redis: RedisConnection,
    key_prefix: String,
}

impl RedisViolationLog {
    /// Creates a log with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            redis: RedisConnection::new(client),
            key_prefix: key_prefix.into(),
        }
    }

    fn log_key(&self) -> String {
        format!("{}:violations", self.key_prefix)
    }

    fn counts_key(&self) -> String {
        format!("{}:violation_counts", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<ConnectionManager> {
        self.redis.get().await
    }
}

#[async_trait]
impl ViolationLog for RedisViolationLog {
    async fn append(&self, violation: &Violation) -> AppResult<()> {
        let payload = violation.encode()?;
        let mut connection = self.connection().await?;

        let _: i64 = connection
            .zadd(self.log_key(), payload, violation.score())
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to append violation: {error}"))
            })?;

        Ok(())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut connection = self.connection().await?;

        connection
            .zrembyscore(
                self.log_key(),
                "-inf",
                format!("({}", cutoff.timestamp_millis()),
            )
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to prune violation log: {error}"))
            })
    }

    async fn increment_source_count(&self, source_id: &str) -> AppResult<u64> {
        let mut connection = self.connection().await?;

        connection
            .hincr(self.counts_key(), source_id, 1_u64)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!(
                    "failed to increment violation count for '{source_id}': {error}"
                ))
            })
    }

    async fn entries_since(&self, since: DateTime<Utc>) -> AppResult<Vec<StoredViolation>> {
        let mut connection = self.connection().await?;

        let entries: Vec<(String, f64)> = connection
            .zrangebyscore_withscores(self.log_key(), since.timestamp_millis(), "+inf")
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to read violation log: {error}"))
            })?;

        Ok(entries.into_iter().map(stored_violation).collect())
    }

    async fn latest(&self, limit: usize) -> AppResult<Vec<StoredViolation>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let stop = isize::try_from(limit)
            .map_err(|error| AppError::Validation(format!("invalid violation limit: {error}")))?
            - 1;
        let mut connection = self.connection().await?;

        let entries: Vec<(String, f64)> = connection
            .zrevrange_withscores(self.log_key(), 0, stop)
            .await
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to read violation log: {error}"))
            })?;

        Ok(entries.into_iter().map(stored_violation).collect())
    }

    async fn source_counts(&self) -> AppResult<Vec<(String, u64)>> {
        let mut connection = self.connection().await?;

        let counts: HashMap<String, u64> =
            connection.hgetall(self.counts_key()).await.map_err(|error| {
                AppError::StoreUnavailable(format!("failed to read violation counts: {error}"))
            })?;

        Ok(counts.into_iter().collect())
    }
}

fn stored_violation((payload, score): (String, f64)) -> StoredViolation {
    StoredViolation {
        score: score as i64,
        payload,
    }
}
