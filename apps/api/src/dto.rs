use serde::{Deserialize, Serialize};
use tollgate_domain::{AnalyticsSnapshot, RankedCount};

/// Counter store probe result.
#[derive(Debug, Serialize)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub counter_store: HealthDependencyStatus,
}

/// Query string for the recent violations listing.
#[derive(Debug, Deserialize)]
pub struct ViolationListQuery {
    pub limit: Option<usize>,
}

/// API representation of an analytics snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total_requests: u64,
    pub blocked_requests: u64,
    pub unique_sources: u64,
    pub block_rate: f64,
    pub top_endpoints: Vec<RankedCount>,
    pub top_violators: Vec<RankedCount>,
}

impl From<AnalyticsSnapshot> for AnalyticsResponse {
    fn from(value: AnalyticsSnapshot) -> Self {
        Self {
            total_requests: value.total_requests,
            blocked_requests: value.blocked_requests,
            unique_sources: value.unique_sources,
            block_rate: value.block_rate,
            top_endpoints: value.top_endpoints,
            top_violators: value.top_violators,
        }
    }
}

/// Sources flagged by an anomaly scan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyScanResponse {
    pub flagged_sources: Vec<String>,
}
