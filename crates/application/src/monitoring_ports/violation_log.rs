use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tollgate_core::AppResult;
use tollgate_domain::Violation;

/// Raw violation log entry. Decoding is left to readers so one corrupt
/// entry cannot fail a whole scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredViolation {
    /// Log score, epoch milliseconds of `occurred_at`.
    pub score: i64,
    /// Serialized violation.
    pub payload: String,
}

impl StoredViolation {
    /// Decodes the payload.
    pub fn decode(&self) -> AppResult<Violation> {
        Violation::decode(&self.payload)
    }
}

/// Time-ordered violation log plus lifetime per-source counters.
#[async_trait]
pub trait ViolationLog: Send + Sync {
    /// Appends one violation scored by its `occurred_at`.
    async fn append(&self, violation: &Violation) -> AppResult<()>;

    /// Removes entries scored before `cutoff`. Returns the number removed.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;

    /// Increments the lifetime violation counter for one source.
    async fn increment_source_count(&self, source_id: &str) -> AppResult<u64>;

    /// Returns entries scored at or after `since`, oldest first.
    async fn entries_since(&self, since: DateTime<Utc>) -> AppResult<Vec<StoredViolation>>;

    /// Returns the newest `limit` entries, newest first.
    async fn latest(&self, limit: usize) -> AppResult<Vec<StoredViolation>>;

    /// Returns all lifetime per-source violation counters.
    async fn source_counts(&self) -> AppResult<Vec<(String, u64)>>;
}
