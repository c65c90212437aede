//! In-process event bus over a tokio broadcast channel.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tollgate_application::EventBus;
use tollgate_core::AppResult;
use tracing::debug;

/// One event delivered to broadcast subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    /// Topic the event was published on.
    pub topic: String,
    /// Event payload.
    pub payload: Value,
}

/// Event bus fanning events out to in-process subscribers.
///
/// Publishing with no subscribers is not an error; the event is dropped.
#[derive(Clone, Debug)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<PublishedEvent>,
}

impl BroadcastEventBus {
    /// Creates a bus retaining up to `capacity` undelivered events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to every topic.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn publish(&self, topic: &str, payload: Value) -> AppResult<()> {
        let event = PublishedEvent {
            topic: topic.to_owned(),
            payload,
        };

        if self.sender.send(event).is_err() {
            debug!(topic = %topic, "no event subscribers");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
