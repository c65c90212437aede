//! Fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{RequestContext, ResolvedIdentity, Violation};

use crate::admission_ports::{Clock, CounterReading, CounterStore, IdentityResolver};
use crate::monitoring_ports::{AnalyticsCounters, AnalyticsStore, EventBus, StoredViolation, ViolationLog};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> AppResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|error| AppError::Internal(format!("failed to lock test state: {error}")))
}

pub(crate) fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub(crate) struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub(crate) fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

/// Counter store keeping counts in a map; TTL is reported as the last
/// value written.
#[derive(Default)]
pub(crate) struct FakeCounterStore {
    counters: Mutex<HashMap<String, (u64, i64)>>,
    failing: AtomicBool,
    delay: Option<Duration>,
    pub(crate) increments: AtomicUsize,
    pub(crate) decrements: AtomicUsize,
}

impl FakeCounterStore {
    pub(crate) fn failing() -> Self {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        store
    }

    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn count(&self, key: &str) -> u64 {
        self.counters
            .lock()
            .ok()
            .and_then(|counters| counters.get(key).map(|(count, _)| *count))
            .unwrap_or(0)
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.counters
            .lock()
            .map(|counters| counters.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CounterStore for FakeCounterStore {
    async fn incr_expire_ttl(&self, key: &str, ttl_seconds: u64) -> AppResult<CounterReading> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("connection refused".to_owned()));
        }

        self.increments.fetch_add(1, Ordering::SeqCst);
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        let mut counters = lock(&self.counters)?;
        let entry = counters.entry(key.to_owned()).or_insert((0, ttl));
        entry.0 += 1;
        entry.1 = ttl;

        Ok(CounterReading {
            count: entry.0,
            ttl_seconds: entry.1,
        })
    }

    async fn decr(&self, key: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("connection refused".to_owned()));
        }

        self.decrements.fetch_add(1, Ordering::SeqCst);
        if let Some(entry) = lock(&self.counters)?.get_mut(key) {
            entry.0 = entry.0.saturating_sub(1);
        }
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("connection refused".to_owned()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingEventBus {
    published: Mutex<Vec<(String, Value)>>,
}

impl RecordingEventBus {
    pub(crate) fn published_on(&self, topic: &str) -> Vec<Value> {
        self.published
            .lock()
            .map(|published| {
                published
                    .iter()
                    .filter(|(published_topic, _)| published_topic == topic)
                    .map(|(_, payload)| payload.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, topic: &str, payload: Value) -> AppResult<()> {
        lock(&self.published)?.push((topic.to_owned(), payload));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeViolationLog {
    entries: Mutex<Vec<StoredViolation>>,
    counts: Mutex<HashMap<String, u64>>,
    prune_fails: bool,
}

impl FakeViolationLog {
    pub(crate) fn with_failing_prune() -> Self {
        Self {
            prune_fails: true,
            ..Self::default()
        }
    }

    pub(crate) fn insert_raw(&self, score: i64, payload: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(StoredViolation {
                score,
                payload: payload.to_owned(),
            });
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub(crate) fn count_for(&self, source_id: &str) -> u64 {
        self.counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(source_id).copied())
            .unwrap_or(0)
    }
}

#[async_trait]
impl ViolationLog for FakeViolationLog {
    async fn append(&self, violation: &Violation) -> AppResult<()> {
        let payload = violation.encode()?;
        lock(&self.entries)?.push(StoredViolation {
            score: violation.score(),
            payload,
        });
        Ok(())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        if self.prune_fails {
            return Err(AppError::StoreUnavailable("prune timed out".to_owned()));
        }
        let cutoff = cutoff.timestamp_millis();
        let mut entries = lock(&self.entries)?;
        let before = entries.len();
        entries.retain(|entry| entry.score >= cutoff);
        Ok(u64::try_from(before - entries.len()).unwrap_or(0))
    }

    async fn increment_source_count(&self, source_id: &str) -> AppResult<u64> {
        let mut counts = lock(&self.counts)?;
        let count = counts.entry(source_id.to_owned()).or_default();
        *count += 1;
        Ok(*count)
    }

    async fn entries_since(&self, since: DateTime<Utc>) -> AppResult<Vec<StoredViolation>> {
        let since = since.timestamp_millis();
        let mut entries: Vec<StoredViolation> = lock(&self.entries)?
            .iter()
            .filter(|entry| entry.score >= since)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.score);
        Ok(entries)
    }

    async fn latest(&self, limit: usize) -> AppResult<Vec<StoredViolation>> {
        let mut entries = lock(&self.entries)?.clone();
        entries.sort_by(|left, right| right.score.cmp(&left.score));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn source_counts(&self) -> AppResult<Vec<(String, u64)>> {
        Ok(lock(&self.counts)?
            .iter()
            .map(|(source_id, count)| (source_id.clone(), *count))
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeAnalyticsStore {
    pub(crate) counters: Mutex<AnalyticsCounters>,
    recorded: Mutex<Vec<(String, String, bool)>>,
}

impl FakeAnalyticsStore {
    pub(crate) fn recorded(&self) -> Vec<(String, String, bool)> {
        self.recorded
            .lock()
            .map(|recorded| recorded.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnalyticsStore for FakeAnalyticsStore {
    async fn record_request(
        &self,
        source_id: &str,
        endpoint: &str,
        blocked: bool,
    ) -> AppResult<()> {
        lock(&self.recorded)?.push((source_id.to_owned(), endpoint.to_owned(), blocked));
        Ok(())
    }

    async fn counters(&self) -> AppResult<AnalyticsCounters> {
        Ok(lock(&self.counters)?.clone())
    }
}

/// Resolves identities from a credential lookup table.
#[derive(Default)]
pub(crate) struct StaticIdentityResolver {
    identities: HashMap<String, ResolvedIdentity>,
    pub(crate) calls: AtomicUsize,
}

impl StaticIdentityResolver {
    pub(crate) fn with_identity(mut self, credential: &str, identity: ResolvedIdentity) -> Self {
        self.identities.insert(credential.to_owned(), identity);
        self
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn resolve(&self, request: &RequestContext) -> ResolvedIdentity {
        self.calls.fetch_add(1, Ordering::SeqCst);
        request
            .credential()
            .and_then(|credential| self.identities.get(credential).cloned())
            .unwrap_or_else(ResolvedIdentity::anonymous)
    }
}
