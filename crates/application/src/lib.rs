//! Application services and ports.

#![forbid(unsafe_code)]

mod admission_gate;
mod admission_ports;
mod analytics_aggregator;
mod anomaly_detector;
mod monitoring;
mod monitoring_ports;
mod policy;
mod policy_resolver;
mod violation_recorder;

#[cfg(test)]
mod test_support;

pub use admission_gate::{
    Admission, AdmissionGate, CompensationHook, DEFAULT_STORE_TIMEOUT, StoreHealth,
};
pub use admission_ports::{Clock, CounterReading, CounterStore, IdentityResolver, SystemClock};
pub use analytics_aggregator::{AnalyticsAggregator, MAX_RECENT_VIOLATIONS};
pub use anomaly_detector::{
    AnomalyDetector, DEFAULT_ANOMALY_THRESHOLD, DEFAULT_ANOMALY_WINDOW_SECONDS,
};
pub use monitoring::{
    MonitoringEvent, MonitoringPipeline, MonitoringReceiver, MonitoringSender, monitoring_channel,
};
pub use monitoring_ports::{
    ANOMALY_TOPIC, AnalyticsCounters, AnalyticsStore, EventBus, STORE_FAILURE_TOPIC,
    StoredViolation, VIOLATION_TOPIC, ViolationLog,
};
pub use policy::{CountingMode, KeyFn, LimitFn, Policy, SkipFn};
pub use policy_resolver::{
    CategoryLimits, PolicyRow, PolicyTable, TierLimits, TieredPolicyResolver,
};
pub use violation_recorder::{VIOLATION_RETENTION_HOURS, ViolationRecorder};
