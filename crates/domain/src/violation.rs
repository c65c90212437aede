//! Rejected-request records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tollgate_core::{AppError, AppResult};
use uuid::Uuid;

/// Immutable record of one rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Unique record id, keeps identical rejections distinct in the log.
    pub id: Uuid,
    /// Network address or identity the counter was keyed on.
    pub source_id: String,
    /// Request path that was rejected.
    pub endpoint: String,
    /// When the rejection happened.
    pub occurred_at: DateTime<Utc>,
    /// Counter value observed by the rejected request.
    pub requests_in_window: u64,
    /// Limit that was exceeded.
    pub limit: u32,
    /// Caller user agent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Resolved identity, if the caller was signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
}

impl Violation {
    /// Creates a violation with a fresh record id.
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        endpoint: impl Into<String>,
        occurred_at: DateTime<Utc>,
        requests_in_window: u64,
        limit: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_id: source_id.into(),
            endpoint: endpoint.into(),
            occurred_at,
            requests_in_window,
            limit,
            user_agent: None,
            identity_id: None,
        }
    }

    /// Attaches caller details.
    #[must_use]
    pub fn with_caller(mut self, user_agent: Option<String>, identity_id: Option<String>) -> Self {
        self.user_agent = user_agent;
        self.identity_id = identity_id;
        self
    }

    /// Score used to order the violation log.
    #[must_use]
    pub fn score(&self) -> i64 {
        self.occurred_at.timestamp_millis()
    }

    /// Serializes the record for the violation log.
    pub fn encode(&self) -> AppResult<String> {
        serde_json::to_string(self)
            .map_err(|error| AppError::Internal(format!("failed to encode violation: {error}")))
    }

    /// Decodes one violation log entry.
    pub fn decode(payload: &str) -> AppResult<Self> {
        serde_json::from_str(payload).map_err(|error| {
            AppError::MalformedRecord(format!("invalid violation log entry: {error}"))
        })
    }
}
