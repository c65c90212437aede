//! Process-local request analytics counters.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tollgate_application::{AnalyticsCounters, AnalyticsStore};
use tollgate_core::AppResult;

#[derive(Default)]
struct AnalyticsState {
    total_requests: u64,
    blocked_requests: u64,
    sources: HashSet<String>,
    endpoints: HashMap<String, u64>,
}

/// In-memory analytics store.
#[derive(Default)]
pub struct InMemoryAnalyticsStore {
    state: RwLock<AnalyticsState>,
}

impl InMemoryAnalyticsStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalyticsStore for InMemoryAnalyticsStore {
    async fn record_request(
        &self,
        source_id: &str,
        endpoint: &str,
        blocked: bool,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.total_requests += 1;
        if blocked {
            state.blocked_requests += 1;
        }
        if !state.sources.contains(source_id) {
            state.sources.insert(source_id.to_owned());
        }
        *state.endpoints.entry(endpoint.to_owned()).or_default() += 1;
        Ok(())
    }

    async fn counters(&self) -> AppResult<AnalyticsCounters> {
        let state = self.state.read().await;
        Ok(AnalyticsCounters {
            total_requests: state.total_requests,
            blocked_requests: state.blocked_requests,
            unique_sources: u64::try_from(state.sources.len()).unwrap_or(u64::MAX),
            endpoint_counts: state
                .endpoints
                .iter()
                .map(|(endpoint, count)| (endpoint.clone(), *count))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests;
