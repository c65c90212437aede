//! Violation recording service.

use std::sync::Arc;

use chrono::Duration;
use tollgate_core::AppResult;
use tollgate_domain::Violation;
use tracing::{debug, warn};

use crate::admission_ports::Clock;
use crate::monitoring_ports::{EventBus, VIOLATION_TOPIC, ViolationLog};

/// Hours a violation stays in the time-ordered log.
pub const VIOLATION_RETENTION_HOURS: i64 = 24;

/// Sole writer of the violation log and per-source violation counters.
#[derive(Clone)]
pub struct ViolationRecorder {
    log: Arc<dyn ViolationLog>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    retention: Duration,
}

impl ViolationRecorder {
    /// Creates a recorder with the default 24 hour retention.
    #[must_use]
    pub fn new(
        log: Arc<dyn ViolationLog>,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            log,
            event_bus,
            clock,
            retention: Duration::hours(VIOLATION_RETENTION_HOURS),
        }
    }

    /// Records one rejected request.
    ///
    /// Appends to the log, prunes entries past retention, bumps the lifetime
    /// counter for the source and publishes the violation. Pruning runs on
    /// every write so the log stays bounded without a scheduled job. A failed
    /// prune is left for the next write.
    pub async fn record_violation(&self, violation: Violation) -> AppResult<()> {
        self.log.append(&violation).await?;

        let cutoff = self.clock.now() - self.retention;
        match self.log.prune_before(cutoff).await {
            Ok(0) => {}
            Ok(pruned) => debug!(pruned, "pruned expired violation log entries"),
            Err(error) => warn!(error = %error, "failed to prune violation log"),
        }

        self.log
            .increment_source_count(violation.source_id.as_str())
            .await?;

        match serde_json::to_value(&violation) {
            Ok(payload) => {
                if let Err(error) = self.event_bus.publish(VIOLATION_TOPIC, payload).await {
                    warn!(
                        source_id = %violation.source_id,
                        error = %error,
                        "failed to publish violation event"
                    );
                }
            }
            Err(error) => {
                warn!(error = %error, "failed to serialize violation event");
            }
        }

        Ok(())
    }
}
