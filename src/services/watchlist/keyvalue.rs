/// Watchlists persisted as JSON documents in a key-value store
///
/// Each list is one JSON array stored under `{prefix}{list key}`, so a
/// store holds at most two keys per account.
use redis::{AsyncCommands, Client};
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{AccountWatchlists, WatchlistBackend, WatchlistStore};
use crate::{
    error::AppResult,
    models::{ListMembership, MediaId, WatchlistEntry},
};
use chrono::{DateTime, Utc};

/// Minimal string key-value storage
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> AppResult<()>;
    async fn delete(&self, key: &str) -> AppResult<()>;
}

/// Process-local store; contents are lost on exit
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// One `{key}.json` file per key inside a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write then rename so readers never see a half-written document
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keys stored as plain Redis strings without expiry
#[derive(Clone)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

pub struct KeyValueWatchlist {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
    /// Serializes read-modify-write cycles on the stored documents
    write_lock: Arc<Mutex<()>>,
}

impl KeyValueWatchlist {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            prefix: String::new(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Watchlist whose keys are namespaced by account, sharing a write lock
    pub fn for_account(store: Arc<dyn KeyValueStore>, account_id: Uuid, write_lock: Arc<Mutex<()>>) -> Self {
        Self {
            store,
            prefix: format!("{}:", account_id),
            write_lock,
        }
    }

    fn key(&self, membership: ListMembership) -> String {
        format!("{}{}", self.prefix, membership.storage_key())
    }

    async fn read(&self, membership: ListMembership) -> AppResult<Vec<WatchlistEntry>> {
        let key = self.key(membership);
        match self.store.get(&key).await? {
            Some(json) => {
                let entries = serde_json::from_str(&json).map_err(|e| {
                    tracing::error!(key = %key, error = %e, "Stored watchlist is not valid JSON");
                    e
                })?;
                Ok(entries)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, membership: ListMembership, entries: &[WatchlistEntry]) -> AppResult<()> {
        let json = serde_json::to_string(entries)?;
        self.store.set(&self.key(membership), json).await
    }
}

#[async_trait::async_trait]
impl WatchlistBackend for KeyValueWatchlist {
    async fn list(&self, membership: ListMembership) -> AppResult<Vec<WatchlistEntry>> {
        self.read(membership).await
    }

    async fn insert(&self, entry: WatchlistEntry) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;

        // Both documents are checked under the lock so an id never lands on both lists
        let other = self.read(entry.membership.other()).await?;
        if other.iter().any(|existing| existing.item.id == entry.item.id) {
            return Ok(false);
        }

        let mut entries = self.read(entry.membership).await?;
        if entries.iter().any(|existing| existing.item.id == entry.item.id) {
            return Ok(false);
        }

        let membership = entry.membership;
        entries.push(entry);
        self.write(membership, &entries).await?;
        Ok(true)
    }

    async fn remove(&self, id: MediaId, membership: ListMembership) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read(membership).await?;
        let before = entries.len();
        entries.retain(|entry| entry.item.id != id);
        if entries.len() == before {
            return Ok(false);
        }

        self.write(membership, &entries).await?;
        Ok(true)
    }

    async fn mark_watched(&self, id: MediaId, watched_at: DateTime<Utc>) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;

        let mut to_watch = self.read(ListMembership::ToWatch).await?;
        let Some(position) = to_watch.iter().position(|entry| entry.item.id == id) else {
            return Ok(false);
        };
        let entry = to_watch.remove(position);

        let mut watched = self.read(ListMembership::Watched).await?;
        if !watched.iter().any(|existing| existing.item.id == id) {
            watched.push(entry.into_watched(watched_at));
        }

        // Write the destination first so a failure in between duplicates rather than loses
        self.write(ListMembership::Watched, &watched).await?;
        self.write(ListMembership::ToWatch, &to_watch).await?;
        Ok(true)
    }

    async fn clear(&self) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        for membership in ListMembership::ALL {
            self.store.delete(&self.key(membership)).await?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "key_value"
    }
}

/// Per-account key-value watchlists over one shared store
pub struct KeyValueAccounts {
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl KeyValueAccounts {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

impl AccountWatchlists for KeyValueAccounts {
    fn for_account(&self, account_id: Uuid) -> WatchlistStore {
        WatchlistStore::new(Arc::new(KeyValueWatchlist::for_account(
            self.store.clone(),
            account_id,
            self.write_lock.clone(),
        )))
    }
}
