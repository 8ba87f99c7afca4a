use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::models::{ListMembership, WatchlistEntry};

struct CachedList {
    entries: Vec<WatchlistEntry>,
    fetched_at: Instant,
}

/// Short-lived copies of remote lists
///
/// Entries expire after the TTL and are dropped whenever a mutation touches
/// the list, so a read never outlives a write made through the same client.
pub struct ListCache {
    ttl: Duration,
    lists: RwLock<HashMap<ListMembership, CachedList>>,
}

impl ListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            lists: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, membership: ListMembership) -> Option<Vec<WatchlistEntry>> {
        let lists = self.lists.read().await;
        let cached = lists.get(&membership)?;

        if cached.fetched_at.elapsed() < self.ttl {
            tracing::debug!(list = %membership, "List cache hit");
            Some(cached.entries.clone())
        } else {
            None
        }
    }

    pub async fn put(&self, membership: ListMembership, entries: Vec<WatchlistEntry>) {
        self.lists.write().await.insert(
            membership,
            CachedList {
                entries,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn invalidate(&self, membership: ListMembership) {
        self.lists.write().await.remove(&membership);
    }

    pub async fn invalidate_all(&self) {
        self.lists.write().await.clear();
    }
}
