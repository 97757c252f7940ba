//! Shared state handed to every service.

use std::future::Future;
use std::sync::Arc;

use bazaar_db::{Database, DbResult};
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::events::EventBus;

#[derive(Debug, Clone)]
pub(crate) struct ServiceContext {
    pub(crate) db: Database,
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) events: EventBus,
}

impl ServiceContext {
    /// Runs one store unit under the configured timeout.
    ///
    /// On expiry the future is dropped, which rolls back any open
    /// transaction inside it. A commit already handed to SQLite is not
    /// undone, so a timeout reports an unknown outcome rather than a
    /// guaranteed rollback.
    pub(crate) async fn bounded<T, F>(&self, operation: &'static str, unit: F) -> EngineResult<T>
    where
        F: Future<Output = DbResult<T>>,
    {
        let after = self.config.store_timeout();
        match tokio::time::timeout(after, unit).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(
                    operation,
                    timeout_ms = after.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(EngineError::Timeout { operation, after })
            }
        }
    }
}
