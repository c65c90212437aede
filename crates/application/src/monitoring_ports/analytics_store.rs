use async_trait::async_trait;
use tollgate_core::AppResult;

/// Raw counters behind the analytics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsCounters {
    /// Requests counted by the gate.
    pub total_requests: u64,
    /// Requests rejected by the gate.
    pub blocked_requests: u64,
    /// Distinct sources seen.
    pub unique_sources: u64,
    /// Requests per endpoint.
    pub endpoint_counts: Vec<(String, u64)>,
}

/// Request counters maintained off the request path.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Counts one evaluated request.
    async fn record_request(&self, source_id: &str, endpoint: &str, blocked: bool)
    -> AppResult<()>;

    /// Reads all counters. Readers tolerate torn reads.
    async fn counters(&self) -> AppResult<AnalyticsCounters>;
}
