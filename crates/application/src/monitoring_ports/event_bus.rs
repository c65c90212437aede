use async_trait::async_trait;
use serde_json::Value;
use tollgate_core::AppResult;

/// Topic carrying every recorded violation.
pub const VIOLATION_TOPIC: &str = "rate_limit.violation";
/// Topic carrying anomaly alerts.
pub const ANOMALY_TOPIC: &str = "security.anomaly";
/// Topic carrying counter store failures observed by the gate.
pub const STORE_FAILURE_TOPIC: &str = "admission.store_failure";

/// Fire-and-forget event publication port.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes one payload. Delivery is not guaranteed.
    async fn publish(&self, topic: &str, payload: Value) -> AppResult<()>;
}
