//! Process-local counter store for single-instance deployments and tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tollgate_application::{CounterReading, CounterStore};
use tollgate_core::{AppError, AppResult};

#[derive(Debug, Clone, Copy)]
struct CounterEntry {
    count: u64,
    expires_at: Instant,
}

impl CounterEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Live key count that triggers a sweep of expired counters.
const SWEEP_HIGH_WATER_MARK: usize = 4096;

#[derive(Debug)]
struct CounterTable {
    entries: HashMap<String, CounterEntry>,
    sweep_at: usize,
}

impl Default for CounterTable {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: SWEEP_HIGH_WATER_MARK,
        }
    }
}

impl CounterTable {
    // The next mark is twice the surviving key count.
    fn sweep_if_needed(&mut self, now: Instant) {
        if self.entries.len() < self.sweep_at {
            return;
        }

        self.entries.retain(|_, entry| entry.is_live(now));
        self.sweep_at = SWEEP_HIGH_WATER_MARK.max(self.entries.len() * 2);
    }
}

/// In-memory counter store.
///
/// The mutex stands in for the atomicity a shared store provides natively.
/// Expiry is applied to the key being touched; stale keys are swept once the
/// table grows past a high-water mark.
#[derive(Default)]
pub struct InMemoryCounterStore {
    table: Mutex<CounterTable>,
}

impl InMemoryCounterStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.table.lock().await.entries.len()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn incr_expire_ttl(&self, key: &str, ttl_seconds: u64) -> AppResult<CounterReading> {
        if ttl_seconds == 0 {
            return Err(AppError::PolicyConfiguration(
                "counter ttl must be greater than zero".to_owned(),
            ));
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(ttl_seconds))
            .unwrap_or(now);

        let mut table = self.table.lock().await;
        table.sweep_if_needed(now);

        let entry = table.entries.entry(key.to_owned()).or_insert(CounterEntry {
            count: 0,
            expires_at,
        });
        if !entry.is_live(now) {
            entry.count = 0;
        }
        entry.count += 1;
        entry.expires_at = expires_at;

        Ok(CounterReading {
            count: entry.count,
            ttl_seconds: i64::try_from(ttl_seconds).unwrap_or(i64::MAX),
        })
    }

    async fn decr(&self, key: &str) -> AppResult<()> {
        let now = Instant::now();
        let mut table = self.table.lock().await;

        match table.entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.count = entry.count.saturating_sub(1);
            }
            Some(_) => {
                table.entries.remove(key);
            }
            None => {}
        }

        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
