/// Watchlist storage abstraction
///
/// Two named lists ("to watch" and "watched") behind one trait, with
/// swappable backends: key-value storage, a remote REST service, or
/// PostgreSQL. [`WatchlistStore`] layers the list rules (no item on both
/// lists, forward-only moves) on top of whichever backend is active.
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{CandidateItem, ListMembership, MediaId, WatchlistEntry, WatchlistStats},
};

pub mod cache;
pub mod keyvalue;
pub mod postgres;
pub mod remote;

pub use cache::ListCache;
pub use keyvalue::{FileStore, KeyValueAccounts, KeyValueStore, KeyValueWatchlist, MemoryStore, RedisStore};
pub use postgres::{PostgresAccounts, PostgresWatchlist};
pub use remote::RemoteWatchlist;

/// Trait for watchlist backends
#[async_trait::async_trait]
pub trait WatchlistBackend: Send + Sync {
    /// Entries of one list in the order they were added
    async fn list(&self, membership: ListMembership) -> AppResult<Vec<WatchlistEntry>>;

    /// Stores the entry; returns false when its id is already on either list
    async fn insert(&self, entry: WatchlistEntry) -> AppResult<bool>;

    /// Returns false when the id is not on that list
    async fn remove(&self, id: MediaId, membership: ListMembership) -> AppResult<bool>;

    async fn contains(&self, id: MediaId, membership: ListMembership) -> AppResult<bool> {
        let entries = self.list(membership).await?;
        Ok(entries.iter().any(|entry| entry.item.id == id))
    }

    /// Moves an entry from "to watch" to "watched"; false when it is not on "to watch"
    ///
    /// Backends with a native update should override this to make the move atomic.
    async fn mark_watched(&self, id: MediaId, watched_at: DateTime<Utc>) -> AppResult<bool> {
        let to_watch = self.list(ListMembership::ToWatch).await?;
        let Some(entry) = to_watch.into_iter().find(|entry| entry.item.id == id) else {
            return Ok(false);
        };

        self.remove(id, ListMembership::ToWatch).await?;
        self.insert(entry.into_watched(watched_at)).await
    }

    async fn statistics(&self) -> AppResult<WatchlistStats> {
        let to_watch = self.list(ListMembership::ToWatch).await?;
        let watched = self.list(ListMembership::Watched).await?;
        Ok(WatchlistStats::from_lists(&to_watch, &watched))
    }

    /// Empties both lists
    async fn clear(&self) -> AppResult<()>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Hands out the watchlist of one account; used by the REST service
pub trait AccountWatchlists: Send + Sync {
    fn for_account(&self, account_id: Uuid) -> WatchlistStore;
}

/// Watchlist operations with the list invariants enforced
#[derive(Clone)]
pub struct WatchlistStore {
    backend: Arc<dyn WatchlistBackend>,
}

impl WatchlistStore {
    pub fn new(backend: Arc<dyn WatchlistBackend>) -> Self {
        Self { backend }
    }

    /// Store kept in process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(KeyValueWatchlist::new(Arc::new(MemoryStore::new()))))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn list(&self, membership: ListMembership) -> AppResult<Vec<WatchlistEntry>> {
        self.backend.list(membership).await
    }

    /// Saves the item on a list; false when it is already saved on either list
    pub async fn add(&self, item: &CandidateItem, membership: ListMembership) -> AppResult<bool> {
        if self.backend.contains(item.id, membership.other()).await? {
            tracing::info!(
                id = item.id,
                list = %membership,
                other = %membership.other(),
                "Item already saved on the other list"
            );
            return Ok(false);
        }

        let inserted = self
            .backend
            .insert(WatchlistEntry::new(item.clone(), membership))
            .await?;

        if inserted {
            tracing::info!(id = item.id, list = %membership, backend = self.backend.name(), "Added to watchlist");
        } else {
            tracing::info!(id = item.id, list = %membership, "Item already in list");
        }

        Ok(inserted)
    }

    pub async fn remove(&self, id: MediaId, membership: ListMembership) -> AppResult<bool> {
        let removed = self.backend.remove(id, membership).await?;
        if removed {
            tracing::info!(id, list = %membership, "Removed from watchlist");
        } else {
            tracing::debug!(id, list = %membership, "Nothing to remove");
        }
        Ok(removed)
    }

    /// Moves a "to watch" entry to "watched"; false when it is not on "to watch"
    pub async fn move_to_watched(&self, id: MediaId, watched_at: DateTime<Utc>) -> AppResult<bool> {
        let moved = self.backend.mark_watched(id, watched_at).await?;
        if moved {
            tracing::info!(id, "Marked as watched");
        }
        Ok(moved)
    }

    /// Moves the item to "watched", or saves it there directly when it is on no list
    ///
    /// Returns false only when the item is already on "watched".
    pub async fn mark_watched(&self, item: &CandidateItem) -> AppResult<bool> {
        if self.move_to_watched(item.id, Utc::now()).await? {
            return Ok(true);
        }
        self.add(item, ListMembership::Watched).await
    }

    pub async fn contains(&self, id: MediaId, membership: ListMembership) -> AppResult<bool> {
        self.backend.contains(id, membership).await
    }

    /// The entry for an id, whichever list holds it
    pub async fn find(&self, id: MediaId) -> AppResult<Option<WatchlistEntry>> {
        for membership in ListMembership::ALL {
            let entries = self.backend.list(membership).await?;
            if let Some(entry) = entries.into_iter().find(|entry| entry.item.id == id) {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    pub async fn statistics(&self) -> AppResult<WatchlistStats> {
        self.backend.statistics().await
    }

    pub async fn clear_all(&self) -> AppResult<()> {
        self.backend.clear().await?;
        tracing::info!(backend = self.backend.name(), "Watchlist cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, MediaKind};

    fn item(id: MediaId, genres: &[&str]) -> CandidateItem {
        CandidateItem {
            id,
            kind: MediaKind::Movie,
            title: format!("Movie {}", id),
            original_title: None,
            overview: "Plot.".to_string(),
            release_date: None,
            vote_average: 7.0,
            vote_count: 500,
            genres: genres
                .iter()
                .enumerate()
                .map(|(i, name)| Genre {
                    id: i as u32,
                    name: name.to_string(),
                })
                .collect(),
            poster_path: Some(format!("/{}.jpg", id)),
            backdrop_path: None,
            runtime: Some(100),
            number_of_seasons: None,
            number_of_episodes: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_add_returns_false() {
        let store = WatchlistStore::in_memory();
        assert!(store.add(&item(1, &[]), ListMembership::ToWatch).await.unwrap());
        assert!(!store.add(&item(1, &[]), ListMembership::ToWatch).await.unwrap());
        assert_eq!(store.list(ListMembership::ToWatch).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rejects_item_on_other_list() {
        let store = WatchlistStore::in_memory();
        assert!(store.add(&item(1, &[]), ListMembership::Watched).await.unwrap());
        assert!(!store.add(&item(1, &[]), ListMembership::ToWatch).await.unwrap());
        assert!(!store.contains(1, ListMembership::ToWatch).await.unwrap());
    }

    #[tokio::test]
    async fn test_mark_watched_moves_entry() {
        let store = WatchlistStore::in_memory();
        store.add(&item(7, &[]), ListMembership::ToWatch).await.unwrap();

        assert!(store.mark_watched(&item(7, &[])).await.unwrap());
        assert!(!store.contains(7, ListMembership::ToWatch).await.unwrap());
        assert!(store.contains(7, ListMembership::Watched).await.unwrap());

        let entry = store.find(7).await.unwrap().unwrap();
        assert_eq!(entry.membership, ListMembership::Watched);
        assert!(entry.watched_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_watched_on_absent_item_adds_it() {
        let store = WatchlistStore::in_memory();
        assert!(store.mark_watched(&item(8, &[])).await.unwrap());
        assert!(store.contains(8, ListMembership::Watched).await.unwrap());

        // Already watched
        assert!(!store.mark_watched(&item(8, &[])).await.unwrap());
        assert_eq!(store.list(ListMembership::Watched).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_move_to_watched_requires_to_watch_entry() {
        let store = WatchlistStore::in_memory();
        assert!(!store.move_to_watched(3, Utc::now()).await.unwrap());
        assert!(store.find(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_absent_leaves_list_unchanged() {
        let store = WatchlistStore::in_memory();
        store.add(&item(1, &[]), ListMembership::Watched).await.unwrap();
        store.add(&item(2, &[]), ListMembership::Watched).await.unwrap();

        assert!(!store.remove(99, ListMembership::Watched).await.unwrap());
        assert_eq!(store.list(ListMembership::Watched).await.unwrap().len(), 2);

        assert!(store.remove(1, ListMembership::Watched).await.unwrap());
        assert_eq!(store.list(ListMembership::Watched).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_statistics_after_adds() {
        let store = WatchlistStore::in_memory();
        store.add(&item(1, &["Drama"]), ListMembership::ToWatch).await.unwrap();
        store.add(&item(2, &["Drama", "Crime"]), ListMembership::ToWatch).await.unwrap();
        store.add(&item(3, &["Comedy"]), ListMembership::Watched).await.unwrap();

        let stats = store.statistics().await.unwrap();
        assert_eq!(stats.to_watch_count, 2);
        assert_eq!(stats.watched_count, 1);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.genre_counts.get("Drama"), Some(&2));
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = WatchlistStore::in_memory();
        for id in [5, 2, 9] {
            store.add(&item(id, &[]), ListMembership::ToWatch).await.unwrap();
        }
        let ids: Vec<MediaId> = store
            .list(ListMembership::ToWatch)
            .await
            .unwrap()
            .iter()
            .map(|entry| entry.item.id)
            .collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_lists() {
        let store = WatchlistStore::in_memory();
        store.add(&item(1, &[]), ListMembership::ToWatch).await.unwrap();
        store.add(&item(2, &[]), ListMembership::Watched).await.unwrap();

        store.clear_all().await.unwrap();
        assert_eq!(store.statistics().await.unwrap().total_count, 0);
        assert_eq!(store.backend_name(), "key_value");
    }
}
