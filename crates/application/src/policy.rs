//! Admission policy definition.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tollgate_core::{AppError, AppResult, NonEmptyString};
use tollgate_domain::RequestContext;

/// Per-request limit function. Constant limits ignore their input.
pub type LimitFn = Arc<dyn Fn(&RequestContext) -> AppResult<u32> + Send + Sync>;
/// Per-request counter scope function.
pub type KeyFn = Arc<dyn Fn(&RequestContext) -> AppResult<String> + Send + Sync>;
/// Per-request bypass predicate.
pub type SkipFn = Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>;

/// Which responses keep their counted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountingMode {
    /// Every admitted request counts.
    #[default]
    Always,
    /// Successful responses (status below 400) are refunded.
    SkipOnSuccess,
    /// Failed responses (status 400 and above) are refunded.
    SkipOnFailure,
}

impl CountingMode {
    /// Returns true when a response with `status` must be refunded.
    #[must_use]
    pub fn refunds(self, status: u16) -> bool {
        match self {
            Self::Always => false,
            Self::SkipOnSuccess => status < 400,
            Self::SkipOnFailure => status >= 400,
        }
    }
}

/// Fixed-window admission policy for one request.
#[derive(Clone)]
pub struct Policy {
    window_duration_ms: u64,
    limit_for_request: LimitFn,
    key_for_request: KeyFn,
    skip_when: SkipFn,
    counting_mode: CountingMode,
    caller_identity: Option<String>,
}

impl Policy {
    /// Creates a policy with a constant limit, keyed on the client address.
    #[must_use]
    pub fn new(window_duration_ms: u64, max_requests: u32) -> Self {
        Self {
            window_duration_ms,
            limit_for_request: Arc::new(move |_| Ok(max_requests)),
            key_for_request: Arc::new(|request| Ok(request.client_address().to_owned())),
            skip_when: Arc::new(|_| false),
            counting_mode: CountingMode::Always,
            caller_identity: None,
        }
    }

    /// Replaces the limit function.
    #[must_use]
    pub fn with_limit(
        mut self,
        limit: impl Fn(&RequestContext) -> AppResult<u32> + Send + Sync + 'static,
    ) -> Self {
        self.limit_for_request = Arc::new(limit);
        self
    }

    /// Replaces the counter scope function.
    #[must_use]
    pub fn with_key(
        mut self,
        key: impl Fn(&RequestContext) -> AppResult<String> + Send + Sync + 'static,
    ) -> Self {
        self.key_for_request = Arc::new(key);
        self
    }

    /// Replaces the bypass predicate.
    #[must_use]
    pub fn with_skip(
        mut self,
        skip: impl Fn(&RequestContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip_when = Arc::new(skip);
        self
    }

    /// Sets the counting mode.
    #[must_use]
    pub fn with_counting_mode(mut self, counting_mode: CountingMode) -> Self {
        self.counting_mode = counting_mode;
        self
    }

    /// Records the resolved caller identity for violation records.
    #[must_use]
    pub fn with_caller_identity(mut self, caller_identity: Option<String>) -> Self {
        self.caller_identity = caller_identity;
        self
    }

    /// Returns the window length in milliseconds.
    #[must_use]
    pub fn window_duration_ms(&self) -> u64 {
        self.window_duration_ms
    }

    /// Returns the counting mode.
    #[must_use]
    pub fn counting_mode(&self) -> CountingMode {
        self.counting_mode
    }

    /// Returns the resolved caller identity, if any.
    #[must_use]
    pub fn caller_identity(&self) -> Option<&str> {
        self.caller_identity.as_deref()
    }

    /// Evaluates the bypass predicate.
    #[must_use]
    pub fn should_skip(&self, request: &RequestContext) -> bool {
        (self.skip_when)(request)
    }

    /// Evaluates the limit function. A zero limit is a configuration defect.
    pub fn limit_for(&self, request: &RequestContext) -> AppResult<u32> {
        let limit = (self.limit_for_request)(request)?;
        if limit == 0 {
            return Err(AppError::PolicyConfiguration(
                "limit_for_request must return a positive limit".to_owned(),
            ));
        }

        Ok(limit)
    }

    /// Evaluates the counter scope function.
    pub fn key_for(&self, request: &RequestContext) -> AppResult<String> {
        let key = (self.key_for_request)(request)?;
        NonEmptyString::new(key).map(String::from).map_err(|_| {
            AppError::PolicyConfiguration("key_for_request must return a non-empty key".to_owned())
        })
    }
}

impl Debug for Policy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Policy")
            .field("window_duration_ms", &self.window_duration_ms)
            .field("counting_mode", &self.counting_mode)
            .field("caller_identity", &self.caller_identity)
            .finish_non_exhaustive()
    }
}
