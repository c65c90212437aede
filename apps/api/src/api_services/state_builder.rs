use std::sync::Arc;

use tollgate_application::{
    AdmissionGate, AnalyticsAggregator, AnomalyDetector, MonitoringPipeline, MonitoringReceiver,
    SystemClock, TieredPolicyResolver, ViolationRecorder, monitoring_channel,
};
use tollgate_core::AppResult;
use tollgate_infrastructure::SignedTokenIdentityResolver;

use crate::api_config::ApiConfig;
use crate::state::AppState;
use crate::upstream::UpstreamClient;

mod stores;

pub use stores::AdmissionStores;

/// Request state plus the monitoring task that must be spawned next to it.
pub struct AppRuntime {
    pub state: AppState,
    pub pipeline: MonitoringPipeline,
    pub receiver: MonitoringReceiver,
}

pub fn build_app_runtime(config: &ApiConfig, stores: AdmissionStores) -> AppResult<AppRuntime> {
    let clock = Arc::new(SystemClock);
    let (monitor, receiver) = monitoring_channel(config.monitoring_channel_capacity);

    let admission_gate = AdmissionGate::new(stores.counter_store, clock.clone(), monitor)
        .with_store_timeout(config.store_timeout);

    let identity_resolver = Arc::new(SignedTokenIdentityResolver::new(
        config.identity_token_secret.as_bytes(),
    )?);
    let policy_resolver =
        TieredPolicyResolver::new(identity_resolver, config.policy_table.clone())?
            .with_bypass_networks(config.bypass_networks.clone());

    let recorder = ViolationRecorder::new(
        stores.violation_log.clone(),
        stores.event_bus.clone(),
        clock.clone(),
    );
    let pipeline = MonitoringPipeline::new(
        recorder,
        stores.analytics_store.clone(),
        stores.event_bus.clone(),
    );

    let anomaly_detector =
        AnomalyDetector::new(stores.violation_log.clone(), stores.event_bus, clock)
            .with_thresholds(config.anomaly_threshold, config.anomaly_window_seconds)?;
    let analytics_aggregator =
        AnalyticsAggregator::new(stores.analytics_store, stores.violation_log);

    let state = AppState {
        admission_gate,
        policy_resolver,
        analytics_aggregator,
        anomaly_detector,
        upstream: UpstreamClient::new(reqwest::Client::new(), config.upstream_base_url.clone()),
        admin_token: config.admin_token.clone(),
        trust_forwarded_for: config.trust_forwarded_for,
    };

    Ok(AppRuntime {
        state,
        pipeline,
        receiver,
    })
}
