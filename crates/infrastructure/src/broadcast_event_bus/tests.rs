use serde_json::json;
use tollgate_application::{ANOMALY_TOPIC, EventBus};
use tollgate_core::AppResult;

use super::BroadcastEventBus;

#[tokio::test]
async fn subscribers_receive_published_events() -> AppResult<()> {
    let bus = BroadcastEventBus::new(8);
    let mut receiver = bus.subscribe();

    bus.publish(ANOMALY_TOPIC, json!({ "sourceId": "203.0.113.7" }))
        .await?;

    let event = receiver.recv().await;
    assert!(event.is_ok());
    let event = event.unwrap_or_else(|_| unreachable!());
    assert_eq!(event.topic, ANOMALY_TOPIC);
    assert_eq!(event.payload["sourceId"], "203.0.113.7");
    Ok(())
}

#[tokio::test]
async fn publishing_without_subscribers_succeeds() {
    let bus = BroadcastEventBus::new(1);

    assert!(bus.publish(ANOMALY_TOPIC, json!({})).await.is_ok());
}
