//! Off-path monitoring channel between the admission gate and the recorders.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tollgate_domain::Violation;
use tracing::{debug, warn};

use crate::monitoring_ports::{AnalyticsStore, EventBus, STORE_FAILURE_TOPIC};
use crate::violation_recorder::ViolationRecorder;

/// Event emitted by the gate for every counted evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitoringEvent {
    /// A request was admitted.
    Admitted {
        /// Source the request came from.
        source_id: String,
        /// Request path.
        endpoint: String,
    },
    /// A request was rejected.
    Rejected(Violation),
    /// The counter store failed and the request was admitted without limiting.
    StoreFailure {
        /// Counter key that could not be evaluated.
        key: String,
        /// Failure description.
        message: String,
    },
}

/// Creates a bounded monitoring channel.
#[must_use]
pub fn monitoring_channel(capacity: usize) -> (MonitoringSender, MonitoringReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (MonitoringSender { sender }, MonitoringReceiver { receiver })
}

/// Non-blocking sending half held by the gate.
#[derive(Clone, Debug)]
pub struct MonitoringSender {
    sender: mpsc::Sender<MonitoringEvent>,
}

impl MonitoringSender {
    /// Queues one event without waiting. Drops the event when the channel is full.
    pub fn notify(&self, event: MonitoringEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "monitoring channel full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("monitoring channel closed");
            }
        }
    }
}

/// Receiving half consumed by [`MonitoringPipeline::run`].
#[derive(Debug)]
pub struct MonitoringReceiver {
    receiver: mpsc::Receiver<MonitoringEvent>,
}

impl MonitoringReceiver {
    /// Waits for the next event. Returns `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<MonitoringEvent> {
        self.receiver.recv().await
    }
}

/// Consumes monitoring events and applies them to the analytics and
/// violation stores.
#[derive(Clone)]
pub struct MonitoringPipeline {
    recorder: ViolationRecorder,
    analytics_store: Arc<dyn AnalyticsStore>,
    event_bus: Arc<dyn EventBus>,
}

impl MonitoringPipeline {
    /// Creates a pipeline.
    #[must_use]
    pub fn new(
        recorder: ViolationRecorder,
        analytics_store: Arc<dyn AnalyticsStore>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            recorder,
            analytics_store,
            event_bus,
        }
    }

    /// Drains the channel until every sender is dropped.
    pub async fn run(self, mut receiver: MonitoringReceiver) {
        while let Some(event) = receiver.recv().await {
            self.handle(event).await;
        }
        debug!("monitoring pipeline stopped");
    }

    /// Applies one event. Store errors are logged; they never stop the pipeline.
    pub async fn handle(&self, event: MonitoringEvent) {
        match event {
            MonitoringEvent::Admitted {
                source_id,
                endpoint,
            } => {
                self.count_request(&source_id, &endpoint, false).await;
            }
            MonitoringEvent::Rejected(violation) => {
                self.count_request(&violation.source_id, &violation.endpoint, true)
                    .await;
                let source_id = violation.source_id.clone();
                if let Err(error) = self.recorder.record_violation(violation).await {
                    warn!(source_id = %source_id, error = %error, "failed to record violation");
                }
            }
            MonitoringEvent::StoreFailure { key, message } => {
                let payload = json!({ "key": key, "error": message });
                if let Err(error) = self.event_bus.publish(STORE_FAILURE_TOPIC, payload).await {
                    warn!(error = %error, "failed to publish counter store failure");
                }
            }
        }
    }

    async fn count_request(&self, source_id: &str, endpoint: &str, blocked: bool) {
        if let Err(error) = self
            .analytics_store
            .record_request(source_id, endpoint, blocked)
            .await
        {
            warn!(
                source_id = %source_id,
                endpoint = %endpoint,
                error = %error,
                "failed to update request analytics"
            );
        }
    }
}
