//! Read-only analytics over the monitoring stores.

use std::sync::Arc;

use tollgate_core::AppResult;
use tollgate_domain::{AnalyticsSnapshot, Violation, block_rate, top_ranked};
use tracing::warn;

use crate::monitoring_ports::{AnalyticsStore, ViolationLog};

/// Largest page accepted by [`AnalyticsAggregator::recent_violations`].
pub const MAX_RECENT_VIOLATIONS: usize = 500;

/// Computes dashboard views. Never mutates; tolerates concurrent writers.
#[derive(Clone)]
pub struct AnalyticsAggregator {
    analytics_store: Arc<dyn AnalyticsStore>,
    log: Arc<dyn ViolationLog>,
}

impl AnalyticsAggregator {
    /// Creates an aggregator.
    #[must_use]
    pub fn new(analytics_store: Arc<dyn AnalyticsStore>, log: Arc<dyn ViolationLog>) -> Self {
        Self {
            analytics_store,
            log,
        }
    }

    /// Computes a point-in-time snapshot.
    pub async fn snapshot(&self) -> AppResult<AnalyticsSnapshot> {
        let counters = self.analytics_store.counters().await?;
        let source_counts = self.log.source_counts().await?;

        Ok(AnalyticsSnapshot {
            total_requests: counters.total_requests,
            blocked_requests: counters.blocked_requests,
            unique_sources: counters.unique_sources,
            block_rate: block_rate(counters.total_requests, counters.blocked_requests),
            top_endpoints: top_ranked(counters.endpoint_counts),
            top_violators: top_ranked(source_counts),
        })
    }

    /// Returns up to `limit` of the newest violations, newest first.
    pub async fn recent_violations(&self, limit: usize) -> AppResult<Vec<Violation>> {
        let limit = limit.clamp(1, MAX_RECENT_VIOLATIONS);
        let entries = self.log.latest(limit).await?;

        Ok(entries
            .into_iter()
            .filter_map(|entry| match entry.decode() {
                Ok(violation) => Some(violation),
                Err(error) => {
                    warn!(score = entry.score, error = %error, "skipping malformed violation log entry");
                    None
                }
            })
            .collect())
    }
}
