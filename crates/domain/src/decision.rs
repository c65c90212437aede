//! Admission decisions and their HTTP-facing rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

/// Header carrying the active limit.
pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
/// Header carrying the requests left in the window.
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
/// Header carrying the ISO-8601 window reset instant.
pub const HEADER_RESET: &str = "X-RateLimit-Reset";
/// Header carrying the seconds to wait after a rejection.
pub const HEADER_RETRY_AFTER: &str = "Retry-After";

/// Quota state reported with an admitted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Limit applied to the request.
    pub limit: u32,
    /// Requests left in the current window.
    pub remaining: u32,
    /// When the counter resets.
    pub reset_at: DateTime<Utc>,
}

/// Rejection details for a request over its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    /// Seconds until the window counter expires. Always positive.
    pub retry_after_seconds: u64,
    /// Limit applied to the request.
    pub limit: u32,
    /// When the counter resets.
    pub reset_at: DateTime<Utc>,
}

/// Admission outcome for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed. `quota` is absent when limiting was bypassed.
    Allow {
        /// Quota state, if the counter store was consulted successfully.
        quota: Option<Quota>,
    },
    /// Request is over its limit.
    Deny(Rejection),
}

impl Decision {
    /// Allow without consulting or reporting a quota.
    #[must_use]
    pub fn bypass() -> Self {
        Self::Allow { quota: None }
    }

    /// Returns true when the request may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    /// Rate limit headers to attach to the response.
    ///
    /// Empty for bypassed decisions; the absence of headers is the signal
    /// that limiting was not applied.
    #[must_use]
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Allow { quota: None } => Vec::new(),
            Self::Allow {
                quota: Some(quota),
            } => vec![
                (HEADER_LIMIT, quota.limit.to_string()),
                (HEADER_REMAINING, quota.remaining.to_string()),
                (HEADER_RESET, iso_timestamp(quota.reset_at)),
            ],
            Self::Deny(rejection) => vec![
                (HEADER_LIMIT, rejection.limit.to_string()),
                (HEADER_REMAINING, "0".to_owned()),
                (HEADER_RESET, iso_timestamp(rejection.reset_at)),
                (HEADER_RETRY_AFTER, rejection.retry_after_seconds.to_string()),
            ],
        }
    }
}

/// JSON body returned with a 429 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionBody {
    /// Fixed error label.
    pub error: &'static str,
    /// Seconds until the caller may retry.
    pub retry_after: u64,
    /// Limit that was exceeded.
    pub limit: u32,
    /// ISO-8601 reset instant.
    pub reset_time: String,
}

impl From<&Rejection> for RejectionBody {
    fn from(rejection: &Rejection) -> Self {
        Self {
            error: "Rate limit exceeded",
            retry_after: rejection.retry_after_seconds,
            limit: rejection.limit,
            reset_time: iso_timestamp(rejection.reset_at),
        }
    }
}

fn iso_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}
