//! Process-local violation log.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tollgate_application::{StoredViolation, ViolationLog};
use tollgate_core::AppResult;
use tollgate_domain::Violation;

#[derive(Default)]
struct LogState {
    // Kept sorted by score, oldest first.
    entries: Vec<StoredViolation>,
    counts: HashMap<String, u64>,
}

/// In-memory violation log.
#[derive(Default)]
pub struct InMemoryViolationLog {
    state: RwLock<LogState>,
}

impl InMemoryViolationLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ViolationLog for InMemoryViolationLog {
    async fn append(&self, violation: &Violation) -> AppResult<()> {
        let entry = StoredViolation {
            score: violation.score(),
            payload: violation.encode()?,
        };

        let mut state = self.state.write().await;
        let position = state
            .entries
            .partition_point(|existing| existing.score <= entry.score);
        state.entries.insert(position, entry);
        Ok(())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = cutoff.timestamp_millis();
        let mut state = self.state.write().await;
        let expired = state
            .entries
            .partition_point(|entry| entry.score < cutoff);
        state.entries.drain(..expired);
        Ok(u64::try_from(expired).unwrap_or(u64::MAX))
    }

    async fn increment_source_count(&self, source_id: &str) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let count = state.counts.entry(source_id.to_owned()).or_default();
        *count += 1;
        Ok(*count)
    }

    async fn entries_since(&self, since: DateTime<Utc>) -> AppResult<Vec<StoredViolation>> {
        let since = since.timestamp_millis();
        let state = self.state.read().await;
        let start = state.entries.partition_point(|entry| entry.score < since);
        Ok(state.entries[start..].to_vec())
    }

    async fn latest(&self, limit: usize) -> AppResult<Vec<StoredViolation>> {
        let state = self.state.read().await;
        Ok(state.entries.iter().rev().take(limit).cloned().collect())
    }

    async fn source_counts(&self) -> AppResult<Vec<(String, u64)>> {
        let state = self.state.read().await;
        Ok(state
            .counts
            .iter()
            .map(|(source_id, count)| (source_id.clone(), *count))
            .collect())
    }
}

#[cfg(test)]
mod tests;
