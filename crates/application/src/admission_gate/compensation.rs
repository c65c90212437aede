use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::admission_ports::CounterStore;
use crate::policy::CountingMode;

/// Post-response hook that refunds a counted request.
///
/// The framework layer invokes [`CompensationHook::on_response_complete`]
/// once the response status is known. The hook is consumed by the call, so
/// it cannot run twice.
pub struct CompensationHook {
    store: Arc<dyn CounterStore>,
    key: String,
    counting_mode: CountingMode,
    store_timeout: Duration,
}

impl CompensationHook {
    pub(super) fn for_policy(
        store: Arc<dyn CounterStore>,
        key: String,
        counting_mode: CountingMode,
        store_timeout: Duration,
    ) -> Option<Self> {
        if counting_mode == CountingMode::Always {
            return None;
        }

        Some(Self {
            store,
            key,
            counting_mode,
            store_timeout,
        })
    }

    /// Returns the window key this hook would decrement.
    #[must_use]
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Applies the counting mode to the final response status.
    ///
    /// Returns true when a refund decrement was applied. A failed decrement
    /// is logged and not retried.
    pub async fn on_response_complete(self, status: u16) -> bool {
        if !self.counting_mode.refunds(status) {
            return false;
        }

        let result = tokio::time::timeout(self.store_timeout, self.store.decr(&self.key)).await;
        match result {
            Ok(Ok(())) => {
                debug!(key = %self.key, status, "refunded counted request");
                true
            }
            Ok(Err(error)) => {
                warn!(key = %self.key, error = %error, "failed to refund counted request");
                false
            }
            Err(_) => {
                warn!(key = %self.key, "timed out refunding counted request");
                false
            }
        }
    }
}

impl Debug for CompensationHook {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("CompensationHook")
            .field("key", &self.key)
            .field("counting_mode", &self.counting_mode)
            .finish_non_exhaustive()
    }
}
