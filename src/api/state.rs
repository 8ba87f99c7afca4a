use std::sync::Arc;

use crate::services::watchlist::{AccountWatchlists, KeyValueAccounts, MemoryStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub watchlists: Arc<dyn AccountWatchlists>,
}

impl AppState {
    pub fn new(watchlists: Arc<dyn AccountWatchlists>) -> Self {
        Self { watchlists }
    }

    /// State backed by process memory; lists are lost on restart
    pub fn in_memory() -> Self {
        Self::new(Arc::new(KeyValueAccounts::new(Arc::new(MemoryStore::new()))))
    }
}
