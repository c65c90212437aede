mod analytics_store;
mod event_bus;
mod violation_log;

pub use analytics_store::{AnalyticsCounters, AnalyticsStore};
pub use event_bus::{ANOMALY_TOPIC, EventBus, STORE_FAILURE_TOPIC, VIOLATION_TOPIC};
pub use violation_log::{StoredViolation, ViolationLog};
