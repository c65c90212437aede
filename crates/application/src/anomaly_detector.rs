//! Repeated-violation detection over the recent violation log.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{AnomalyEvent, AnomalyKind, window_label};
use tracing::warn;

use crate::admission_ports::Clock;
use crate::monitoring_ports::{ANOMALY_TOPIC, EventBus, ViolationLog};

/// Default violations needed inside the scan window to flag a source.
pub const DEFAULT_ANOMALY_THRESHOLD: u64 = 5;
/// Default scan window.
pub const DEFAULT_ANOMALY_WINDOW_SECONDS: u64 = 60 * 60;

/// Flags sources that keep hitting their limits.
///
/// Every scan is a fresh recomputation; no flagged state is kept, so a
/// source stays flagged on each call while it remains over threshold.
#[derive(Clone)]
pub struct AnomalyDetector {
    log: Arc<dyn ViolationLog>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    threshold: u64,
    window_seconds: u64,
}

impl AnomalyDetector {
    /// Creates a detector with the default threshold and window.
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
            threshold: DEFAULT_ANOMALY_THRESHOLD,
            window_seconds: DEFAULT_ANOMALY_WINDOW_SECONDS,
        }
    }

    /// Overrides threshold and scan window.
    pub fn with_thresholds(mut self, threshold: u64, window_seconds: u64) -> AppResult<Self> {
        if threshold == 0 || window_seconds == 0 {
            return Err(AppError::Validation(
                "anomaly threshold and window must be greater than zero".to_owned(),
            ));
        }

        self.threshold = threshold;
        self.window_seconds = window_seconds;
        Ok(self)
    }

    /// Returns the sources over threshold, most violations first, and
    /// publishes one anomaly event per flagged source.
    pub async fn detect_suspicious_activity(&self) -> AppResult<Vec<String>> {
        let window = Duration::seconds(i64::try_from(self.window_seconds).unwrap_or(i64::MAX));
        let since = self.clock.now() - window;
        let entries = self.log.entries_since(since).await?;

        let mut per_source: HashMap<String, u64> = HashMap::new();
        for entry in entries {
            let violation = match entry.decode() {
                Ok(violation) => violation,
                Err(error) => {
                    warn!(score = entry.score, error = %error, "skipping malformed violation log entry");
                    continue;
                }
            };
            if violation.occurred_at < since {
                continue;
            }
            *per_source.entry(violation.source_id).or_default() += 1;
        }

        let mut flagged: Vec<(String, u64)> = per_source
            .into_iter()
            .filter(|(_, count)| *count >= self.threshold)
            .collect();
        flagged.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));

        let label = window_label(self.window_seconds);
        for (source_id, violation_count) in &flagged {
            let event = AnomalyEvent {
                kind: AnomalyKind::RepeatedViolations,
                source_id: source_id.clone(),
                violation_count: *violation_count,
                window_label: label.clone(),
            };
            self.publish(&event).await;
        }

        Ok(flagged.into_iter().map(|(source_id, _)| source_id).collect())
    }

    async fn publish(&self, event: &AnomalyEvent) {
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(error = %error, "failed to serialize anomaly event");
                return;
            }
        };

        if let Err(error) = self.event_bus.publish(ANOMALY_TOPIC, payload).await {
            warn!(
                source_id = %event.source_id,
                error = %error,
                "failed to publish anomaly event"
            );
        }
    }
}
