//! Lazily established, reconnecting Redis connection shared by an adapter's
//! clones.

use std::sync::Arc;

use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tollgate_core::{AppError, AppResult};

#[derive(Clone)]
pub(crate) struct RedisConnection {
    client: redis::Client,
    manager: Arc<OnceCell<ConnectionManager>>,
}

impl RedisConnection {
    pub(crate) fn new(client: redis::Client) -> Self {
        Self {
            client,
            manager: Arc::new(OnceCell::new()),
        }
    }

    /// Returns a handle to the managed connection, connecting on first use.
    ///
    /// A failed first connect leaves the cell empty so the next call retries.
    /// Once established, the manager reconnects in the background after
    /// connection loss.
    pub(crate) async fn get(&self) -> AppResult<ConnectionManager> {
        self.manager
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await
            .cloned()
            .map_err(|error| {
                AppError::StoreUnavailable(format!("failed to connect to redis: {error}"))
            })
    }
}
