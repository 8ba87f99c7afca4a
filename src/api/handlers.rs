use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{CandidateItem, ListMembership, MediaId, WatchlistEntry, WatchlistStats},
};

use super::{Account, AppState};

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    fn membership(&self) -> AppResult<Option<ListMembership>> {
        self.status.as_deref().map(str::parse::<ListMembership>).transpose()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    pub media: CandidateItem,
    #[serde(default = "default_status")]
    pub status: ListMembership,
}

fn default_status() -> ListMembership {
    ListMembership::ToWatch
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ListMembership,
    /// Defaults to the time the request is handled
    #[serde(default)]
    pub watched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub in_watchlist: bool,
    pub status: Option<ListMembership>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Entries of one list, or of both lists when no status is given
pub async fn list_entries(
    State(state): State<AppState>,
    account: Account,
    Query(query): Query<StatusQuery>,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    let store = state.watchlists.for_account(account.id());

    let entries = match query.membership()? {
        Some(membership) => store.list(membership).await?,
        None => {
            let mut entries = store.list(ListMembership::ToWatch).await?;
            entries.extend(store.list(ListMembership::Watched).await?);
            entries
        }
    };

    Ok(Json(entries))
}

pub async fn add_entry(
    State(state): State<AppState>,
    account: Account,
    Json(request): Json<AddEntryRequest>,
) -> AppResult<(StatusCode, Json<WatchlistEntry>)> {
    let store = state.watchlists.for_account(account.id());

    if !store.add(&request.media, request.status).await? {
        return Err(AppError::Conflict(format!(
            "Item {} is already in the watchlist",
            request.media.id
        )));
    }

    let entry = store.find(request.media.id).await?.ok_or_else(|| {
        AppError::Internal(format!("Item {} vanished after insert", request.media.id))
    })?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// Moves an entry forward to "watched"
pub async fn update_status(
    State(state): State<AppState>,
    account: Account,
    Path(id): Path<MediaId>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<Json<WatchlistEntry>> {
    if request.status != ListMembership::Watched {
        return Err(AppError::InvalidInput(
            "Entries can only move from to_watch to watched".to_string(),
        ));
    }

    let store = state.watchlists.for_account(account.id());
    if !store
        .move_to_watched(id, request.watched_at.unwrap_or_else(Utc::now))
        .await?
    {
        return Err(AppError::NotFound(format!("Item {} is not in to_watch", id)));
    }

    let entry = store
        .find(id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Item {} vanished after update", id)))?;

    Ok(Json(entry))
}

pub async fn remove_entry(
    State(state): State<AppState>,
    account: Account,
    Path(id): Path<MediaId>,
    Query(query): Query<StatusQuery>,
) -> AppResult<StatusCode> {
    let store = state.watchlists.for_account(account.id());

    let removed = match query.membership()? {
        Some(membership) => store.remove(id, membership).await?,
        None => match store.find(id).await? {
            Some(entry) => store.remove(id, entry.membership).await?,
            None => false,
        },
    };

    if !removed {
        return Err(AppError::NotFound(format!("Item {} is not in the watchlist", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Empties both lists of the account
pub async fn clear_entries(State(state): State<AppState>, account: Account) -> AppResult<StatusCode> {
    state.watchlists.for_account(account.id()).clear_all().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check_entry(
    State(state): State<AppState>,
    account: Account,
    Path(id): Path<MediaId>,
) -> AppResult<Json<CheckResponse>> {
    let entry = state.watchlists.for_account(account.id()).find(id).await?;

    Ok(Json(CheckResponse {
        in_watchlist: entry.is_some(),
        status: entry.map(|entry| entry.membership),
    }))
}

pub async fn get_statistics(
    State(state): State<AppState>,
    account: Account,
) -> AppResult<Json<WatchlistStats>> {
    let stats = state.watchlists.for_account(account.id()).statistics().await?;
    Ok(Json(stats))
}
