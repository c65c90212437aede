use async_trait::async_trait;
use tollgate_core::AppResult;

/// Counter state read back from the store after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterReading {
    /// Counter value including the increment that produced this reading.
    pub count: u64,
    /// Remaining physical TTL in seconds, as reported by the store.
    pub ttl_seconds: i64,
}

/// Shared multi-writer counter store.
///
/// Implementations push all mutation into the store's own atomic primitives;
/// callers never lock.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments `key`, sets its expiry to `ttl_seconds` and reads the TTL
    /// back, applied as one atomic unit.
    async fn incr_expire_ttl(&self, key: &str, ttl_seconds: u64) -> AppResult<CounterReading>;

    /// Decrements `key` when it still exists. Never recreates an expired key.
    async fn decr(&self, key: &str) -> AppResult<()>;

    /// Liveness probe.
    async fn ping(&self) -> AppResult<()>;
}
