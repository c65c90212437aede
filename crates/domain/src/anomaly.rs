//! Anomaly signals derived from recorded violations.

use serde::{Deserialize, Serialize};

/// Kind of anomaly that was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// A source crossed the violation threshold inside the scan window.
    RepeatedViolations,
}

/// Event published for each flagged source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEvent {
    /// Anomaly kind.
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    /// Flagged source.
    pub source_id: String,
    /// Violations counted inside the scan window.
    pub violation_count: u64,
    /// Human-readable scan window, e.g. `1 hour`.
    pub window_label: String,
}

/// Renders a scan window as a short human-readable label.
#[must_use]
pub fn window_label(window_seconds: u64) -> String {
    let (amount, unit) = if window_seconds % 3600 == 0 {
        (window_seconds / 3600, "hour")
    } else if window_seconds % 60 == 0 {
        (window_seconds / 60, "minute")
    } else {
        (window_seconds, "second")
    };

    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}
