use std::sync::Arc;

use crate::config::Config;
use crate::storage::CalculationStore;

/// State handed to every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Where finished calculations are recorded
    pub store: Arc<dyn CalculationStore>,
    /// Maximum entries returned by the history endpoint
    pub history_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn CalculationStore>, config: &Config) -> Self {
        Self {
            store,
            history_limit: config.history_limit,
        }
    }

    /// State over a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory(capacity: usize, history_limit: usize) -> Self {
        Self {
            store: Arc::new(crate::storage::MemoryStore::new(capacity)),
            history_limit,
        }
    }
}
