//! Fixed-window key derivation.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use tollgate_core::{AppError, AppResult};

/// Counter key for one scope within one fixed window.
///
/// Every request for the same scope whose timestamp falls in the same
/// `window_duration_ms` bucket derives the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowKey {
    scope: String,
    bucket: i64,
}

impl WindowKey {
    /// Derives the key for `scope` at `now`.
    pub fn derive(scope: &str, now: DateTime<Utc>, window_duration_ms: u64) -> AppResult<Self> {
        if scope.trim().is_empty() {
            return Err(AppError::PolicyConfiguration(
                "window key scope must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            scope: scope.to_owned(),
            bucket: bucket_for(now.timestamp_millis(), window_duration_ms)?,
        })
    }

    /// Returns the policy scope part of the key.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.scope.as_str()
    }

    /// Returns the window index.
    #[must_use]
    pub fn bucket(&self) -> i64 {
        self.bucket
    }
}

impl Display for WindowKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.scope, self.bucket)
    }
}

/// Returns `floor(now_ms / window_duration_ms)`.
pub fn bucket_for(now_ms: i64, window_duration_ms: u64) -> AppResult<i64> {
    let window = i64::try_from(window_duration_ms)
        .ok()
        .filter(|window| *window > 0)
        .ok_or_else(|| {
            AppError::PolicyConfiguration(format!(
                "window duration must be a positive millisecond count, got {window_duration_ms}"
            ))
        })?;

    Ok(now_ms.div_euclid(window))
}

/// Physical expiry for a window, rounded up to whole seconds.
#[must_use]
pub fn window_ttl_seconds(window_duration_ms: u64) -> u64 {
    window_duration_ms.div_ceil(1000).max(1)
}
