//! Fixed-window admission gate.
//!
//! Each evaluation costs one atomic increment/expire/ttl batch against the
//! shared counter store. Store failures fail open: the request is admitted
//! without rate limit metadata and the failure is reported off the request
//! path. Policy function failures propagate to the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tollgate_core::{AppError, AppResult};
use tollgate_domain::{
    Decision, Quota, Rejection, RequestContext, Violation, WindowKey, window_ttl_seconds,
};
use tracing::warn;

use crate::admission_ports::{Clock, CounterReading, CounterStore};
use crate::monitoring::{MonitoringEvent, MonitoringSender};
use crate::policy::Policy;

mod compensation;

pub use compensation::CompensationHook;

/// Default upper bound for one counter store round trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// Result of one evaluation.
#[derive(Debug)]
pub struct Admission {
    decision: Decision,
    compensation: Option<CompensationHook>,
}

impl Admission {
    fn bypass() -> Self {
        Self {
            decision: Decision::bypass(),
            compensation: None,
        }
    }

    /// Returns the admission decision.
    #[must_use]
    pub fn decision(&self) -> &Decision {
        &self.decision
    }

    /// Splits the admission into its decision and the post-response hook.
    ///
    /// The hook is present only for admitted, counted requests under a
    /// policy whose counting mode can refund.
    #[must_use]
    pub fn into_parts(self) -> (Decision, Option<CompensationHook>) {
        (self.decision, self.compensation)
    }
}

/// Liveness of the counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreHealth {
    /// Whether the store answered the probe in time.
    pub reachable: bool,
    /// Failure description when unreachable.
    pub detail: Option<String>,
}

/// Admission gate evaluating policies against the shared counter store.
#[derive(Clone)]
pub struct AdmissionGate {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    monitor: MonitoringSender,
    store_timeout: Duration,
}

impl AdmissionGate {
    /// Creates a gate with the default store timeout.
    #[must_use]
    pub fn new(
        store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
        monitor: MonitoringSender,
    ) -> Self {
        Self {
            store,
            clock,
            monitor,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Overrides the bound on store round trips.
    #[must_use]
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Evaluates one request against one policy.
    pub async fn evaluate(&self, request: &RequestContext, policy: &Policy) -> AppResult<Admission> {
        if policy.should_skip(request) {
            return Ok(Admission::bypass());
        }

        let now = self.clock.now();
        let scope = policy.key_for(request)?;
        let key = WindowKey::derive(&scope, now, policy.window_duration_ms())?.to_string();
        let window_ttl = window_ttl_seconds(policy.window_duration_ms());

        let reading = match self.increment(&key, window_ttl).await {
            Ok(reading) => reading,
            Err(error) => {
                warn!(key = %key, error = %error, "counter store failed, admitting request");
                self.monitor.notify(MonitoringEvent::StoreFailure {
                    key,
                    message: error.to_string(),
                });
                self.notify_admitted(request);
                return Ok(Admission::bypass());
            }
        };

        let limit = policy.limit_for(request)?;
        let ttl_seconds = effective_ttl(reading, window_ttl);
        let reset_at = reset_instant(now, ttl_seconds);

        if reading.count > u64::from(limit) {
            let violation = self.violation(request, policy, reading, limit, now);
            self.monitor.notify(MonitoringEvent::Rejected(violation));
            return Ok(Admission {
                decision: Decision::Deny(Rejection {
                    retry_after_seconds: ttl_seconds,
                    limit,
                    reset_at,
                }),
                compensation: None,
            });
        }

        self.notify_admitted(request);
        let remaining = u64::from(limit).saturating_sub(reading.count);
        let compensation = CompensationHook::for_policy(
            self.store.clone(),
            key,
            policy.counting_mode(),
            self.store_timeout,
        );

        Ok(Admission {
            decision: Decision::Allow {
                quota: Some(Quota {
                    limit,
                    remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
                    reset_at,
                }),
            },
            compensation,
        })
    }

    /// Probes the counter store with the same bound as evaluations.
    pub async fn probe_store(&self) -> StoreHealth {
        let result = tokio::time::timeout(self.store_timeout, self.store.ping())
            .await
            .unwrap_or_else(|_| Err(timeout_error(self.store_timeout)));

        match result {
            Ok(()) => StoreHealth {
                reachable: true,
                detail: None,
            },
            Err(error) => StoreHealth {
                reachable: false,
                detail: Some(error.to_string()),
            },
        }
    }

    async fn increment(&self, key: &str, ttl_seconds: u64) -> AppResult<CounterReading> {
        tokio::time::timeout(self.store_timeout, self.store.incr_expire_ttl(key, ttl_seconds))
            .await
            .unwrap_or_else(|_| Err(timeout_error(self.store_timeout)))
    }

    fn notify_admitted(&self, request: &RequestContext) {
        self.monitor.notify(MonitoringEvent::Admitted {
            source_id: request.client_address().to_owned(),
            endpoint: request.endpoint(),
        });
    }

    fn violation(
        &self,
        request: &RequestContext,
        policy: &Policy,
        reading: CounterReading,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Violation {
        Violation::new(
            request.client_address(),
            request.endpoint(),
            now,
            reading.count,
            limit,
        )
        .with_caller(
            request.user_agent().map(str::to_owned),
            policy.caller_identity().map(str::to_owned),
        )
    }
}

/// Store-reported TTL, or the window TTL when the store reports none.
fn effective_ttl(reading: CounterReading, window_ttl: u64) -> u64 {
    u64::try_from(reading.ttl_seconds)
        .ok()
        .filter(|ttl| *ttl > 0)
        .unwrap_or(window_ttl)
}

fn reset_instant(now: DateTime<Utc>, ttl_seconds: u64) -> DateTime<Utc> {
    let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
    now.checked_add_signed(chrono::Duration::seconds(ttl))
        .unwrap_or(now)
}

fn timeout_error(timeout: Duration) -> AppError {
    AppError::StoreUnavailable(format!(
        "counter store did not answer within {}ms",
        timeout.as_millis()
    ))
}
