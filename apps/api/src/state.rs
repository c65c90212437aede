use tollgate_application::{
    AdmissionGate, AnalyticsAggregator, AnomalyDetector, TieredPolicyResolver,
};

use crate::upstream::UpstreamClient;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub admission_gate: AdmissionGate,
    pub policy_resolver: TieredPolicyResolver,
    pub analytics_aggregator: AnalyticsAggregator,
    pub anomaly_detector: AnomalyDetector,
    pub upstream: UpstreamClient,
    pub admin_token: Option<String>,
    pub trust_forwarded_for: bool,
}
