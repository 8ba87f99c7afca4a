use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use std::sync::Arc;
use uuid::Uuid;

use super::{AccountWatchlists, WatchlistBackend, WatchlistStore};
use crate::{
    error::{AppError, AppResult},
    models::{CandidateItem, ListMembership, MediaId, WatchlistEntry},
};

#[derive(FromRow)]
struct EntryRow {
    membership: String,
    media: Json<CandidateItem>,
    added_at: DateTime<Utc>,
    watched_at: Option<DateTime<Utc>>,
}

impl TryFrom<EntryRow> for WatchlistEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            membership: row.membership.parse()?,
            item: row.media.0,
            added_at: row.added_at,
            watched_at: row.watched_at,
        })
    }
}

/// Watchlist of one account stored in the `watchlist_entries` table
///
/// The primary key `(account_id, media_id)` keeps an item on at most one list.
pub struct PostgresWatchlist {
    pool: PgPool,
    account_id: Uuid,
}

impl PostgresWatchlist {
    pub fn new(pool: PgPool, account_id: Uuid) -> Self {
        Self { pool, account_id }
    }
}

#[async_trait::async_trait]
impl WatchlistBackend for PostgresWatchlist {
    async fn list(&self, membership: ListMembership) -> AppResult<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT membership, media, added_at, watched_at
            FROM watchlist_entries
            WHERE account_id = $1 AND membership = $2
            ORDER BY COALESCE(watched_at, added_at), seq
            "#,
        )
        .bind(self.account_id)
        .bind(membership.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WatchlistEntry::try_from).collect()
    }

    async fn insert(&self, entry: WatchlistEntry) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO watchlist_entries (account_id, media_id, membership, media, added_at, watched_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (account_id, media_id) DO NOTHING
            "#,
        )
        .bind(self.account_id)
        .bind(entry.item.id as i64)
        .bind(entry.membership.as_str())
        .bind(Json(&entry.item))
        .bind(entry.added_at)
        .bind(entry.watched_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, id: MediaId, membership: ListMembership) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM watchlist_entries WHERE account_id = $1 AND media_id = $2 AND membership = $3",
        )
        .bind(self.account_id)
        .bind(id as i64)
        .bind(membership.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn contains(&self, id: MediaId, membership: ListMembership) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM watchlist_entries
                WHERE account_id = $1 AND media_id = $2 AND membership = $3
            )
            "#,
        )
        .bind(self.account_id)
        .bind(id as i64)
        .bind(membership.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn mark_watched(&self, id: MediaId, watched_at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE watchlist_entries
            SET membership = 'watched', watched_at = $3
            WHERE account_id = $1 AND media_id = $2 AND membership = 'to_watch'
            "#,
        )
        .bind(self.account_id)
        .bind(id as i64)
        .bind(watched_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM watchlist_entries WHERE account_id = $1")
            .bind(self.account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Per-account watchlists over one connection pool
#[derive(Clone)]
pub struct PostgresAccounts {
    pool: PgPool,
}

impl PostgresAccounts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AccountWatchlists for PostgresAccounts {
    fn for_account(&self, account_id: Uuid) -> WatchlistStore {
        WatchlistStore::new(Arc::new(PostgresWatchlist::new(self.pool.clone(), account_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn database_url() -> String {
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/cinepick".to_string())
    }

    fn item(id: MediaId) -> CandidateItem {
        CandidateItem {
            id,
            kind: MediaKind::Movie,
            title: format!("Movie {}", id),
            original_title: None,
            overview: "Plot.".to_string(),
            release_date: None,
            vote_average: 7.5,
            vote_count: 900,
            genres: vec![],
            poster_path: None,
            backdrop_path: None,
            runtime: Some(95),
            number_of_seasons: None,
            number_of_episodes: None,
        }
    }

    #[test]
    fn test_row_with_unknown_membership_is_rejected() {
        let row = EntryRow {
            membership: "abandoned".to_string(),
            media: Json(item(1)),
            added_at: Utc::now(),
            watched_at: None,
        };
        assert!(matches!(
            WatchlistEntry::try_from(row),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_row_converts_to_entry() {
        let now = Utc::now();
        let row = EntryRow {
            membership: "watched".to_string(),
            media: Json(item(2)),
            added_at: now,
            watched_at: Some(now),
        };
        let entry = WatchlistEntry::try_from(row).unwrap();
        assert_eq!(entry.membership, ListMembership::Watched);
        assert_eq!(entry.item.id, 2);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL"]
    async fn test_round_trip_against_database() {
        let pool = crate::db::create_pool(&database_url()).await.unwrap();
        let watchlist = PostgresWatchlist::new(pool, Uuid::new_v4());

        assert!(watchlist
            .insert(WatchlistEntry::new(item(10), ListMembership::ToWatch))
            .await
            .unwrap());
        assert!(!watchlist
            .insert(WatchlistEntry::new(item(10), ListMembership::Watched))
            .await
            .unwrap());

        assert!(watchlist.mark_watched(10, Utc::now()).await.unwrap());
        assert!(watchlist.contains(10, ListMembership::Watched).await.unwrap());
        assert!(!watchlist.remove(10, ListMembership::ToWatch).await.unwrap());

        watchlist.clear().await.unwrap();
        assert!(watchlist.list(ListMembership::Watched).await.unwrap().is_empty());
    }
}
