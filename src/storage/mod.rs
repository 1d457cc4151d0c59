//! Persistence for finished calculations.
//!
//! Handlers only see `Arc<dyn CalculationStore>`; which backend sits behind
//! it is decided once at startup by [`open`].

pub mod memory_store;
pub mod sqlite_store;

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::StorageError;
use crate::models::calculation::{NewCalculation, StoredCalculation};

pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

/// Append-only calculation log.
///
/// Implementations must hand out unique, strictly increasing ids and never
/// expose a partially written record.
pub trait CalculationStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    fn save(&self, record: NewCalculation) -> BoxFuture<'_, Result<i64, StorageError>>;

    fn get(&self, id: i64) -> BoxFuture<'_, Result<Option<StoredCalculation>, StorageError>>;

    /// Newest first, at most `limit` records.
    ///
    /// Records that exist but can no longer be decoded are skipped, not
    /// replaced by older ones, so fewer than `limit` may come back.
    fn list_recent(&self, limit: usize) -> BoxFuture<'_, Result<Vec<StoredCalculation>, StorageError>>;
}

/// Builds the configured backend, degrading to memory if SQLite cannot be
/// opened and the config allows it.
pub async fn open(cfg: &StorageConfig) -> Result<Arc<dyn CalculationStore>, StorageError> {
    match cfg.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new(cfg.memory_capacity))),
        StorageBackend::Sqlite => match SqliteStore::connect(&cfg.database_url).await {
            Ok(store) => Ok(Arc::new(store)),
            Err(e) if cfg.fallback_to_memory => {
                tracing::warn!(
                    "SQLite store at {} unavailable ({}), keeping the last {} calculations in memory",
                    cfg.database_url,
                    e,
                    cfg.memory_capacity
                );
                Ok(Arc::new(MemoryStore::new(cfg.memory_capacity)))
            }
            Err(e) => Err(e),
        },
    }
}
