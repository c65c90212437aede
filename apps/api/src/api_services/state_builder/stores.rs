use std::sync::Arc;

use tollgate_application::{AnalyticsStore, CounterStore, EventBus, ViolationLog};
use tollgate_core::AppResult;
use tollgate_infrastructure::{
    BroadcastEventBus, InMemoryAnalyticsStore, InMemoryCounterStore, InMemoryViolationLog,
    RedisAnalyticsStore, RedisCounterStore, RedisEventBus, RedisViolationLog,
};
use tracing::info;

use crate::api_config::AdmissionStoreConfig;

use super::super::redis::build_redis_client;

const EVENT_BUS_CAPACITY: usize = 256;

/// Store adapters shared by the gate and the monitoring services.
#[derive(Clone)]
pub struct AdmissionStores {
    pub counter_store: Arc<dyn CounterStore>,
    pub violation_log: Arc<dyn ViolationLog>,
    pub analytics_store: Arc<dyn AnalyticsStore>,
    pub event_bus: Arc<dyn EventBus>,
}

impl AdmissionStores {
    pub fn from_config(config: &AdmissionStoreConfig) -> AppResult<Self> {
        match config {
            AdmissionStoreConfig::Memory => {
                info!("using in-memory admission stores");
                Ok(Self::in_memory())
            }
            AdmissionStoreConfig::Redis { url, key_prefix } => {
                info!(key_prefix = %key_prefix, "using redis admission stores");
                let client = build_redis_client(url)?;
                Ok(Self {
                    counter_store: Arc::new(RedisCounterStore::new(
                        client.clone(),
                        key_prefix.clone(),
                    )),
                    violation_log: Arc::new(RedisViolationLog::new(
                        client.clone(),
                        key_prefix.clone(),
                    )),
                    analytics_store: Arc::new(RedisAnalyticsStore::new(
                        client.clone(),
                        key_prefix.clone(),
                    )),
                    event_bus: Arc::new(RedisEventBus::new(client, key_prefix.clone())),
                })
            }
        }
    }

    pub fn in_memory() -> Self {
        Self {
            counter_store: Arc::new(InMemoryCounterStore::new()),
            violation_log: Arc::new(InMemoryViolationLog::new()),
            analytics_store: Arc::new(InMemoryAnalyticsStore::new()),
            event_bus: Arc::new(BroadcastEventBus::new(EVENT_BUS_CAPACITY)),
        }
    }
}
