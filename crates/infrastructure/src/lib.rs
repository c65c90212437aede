//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod broadcast_event_bus;
mod in_memory_analytics_store;
mod in_memory_counter_store;
mod in_memory_violation_log;
mod redis_analytics_store;
mod redis_connection;
mod redis_counter_store;
mod redis_event_bus;
mod redis_violation_log;
mod signed_token_identity_resolver;

pub use broadcast_event_bus::{BroadcastEventBus, PublishedEvent};
pub use in_memory_analytics_store::InMemoryAnalyticsStore;
pub use in_memory_counter_store::InMemoryCounterStore;
pub use in_memory_violation_log::InMemoryViolationLog;
pub use redis_analytics_store::RedisAnalyticsStore;
pub use redis_counter_store::RedisCounterStore;
pub use redis_event_bus::RedisEventBus;
pub use redis_violation_log::RedisViolationLog;
pub use signed_token_identity_resolver::SignedTokenIdentityResolver;
