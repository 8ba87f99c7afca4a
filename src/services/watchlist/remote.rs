/// Watchlist kept by the cinepick REST service
///
/// Requests carry the caller's bearer token; the service scopes the lists to
/// that token. Reads go through a [`ListCache`] that every mutation clears.
use chrono::{DateTime, Utc};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ListCache, WatchlistBackend};
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{CandidateItem, ListMembership, MediaId, WatchlistEntry, WatchlistStats},
};

#[derive(Serialize)]
struct AddEntryBody<'a> {
    media: &'a CandidateItem,
    status: ListMembership,
}

#[derive(Serialize)]
struct UpdateStatusBody {
    status: ListMembership,
    watched_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct RemoteWatchlist {
    http_client: HttpClient,
    base_url: String,
    token: String,
    cache: ListCache,
}

impl RemoteWatchlist {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, cache_ttl: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            cache: ListCache::new(cache_ttl),
        }
    }

    pub fn from_config(config: &Config, token: impl Into<String>) -> Self {
        Self::new(
            config.watchlist_api_url.clone(),
            token,
            config.watchlist_cache_ttl(),
        )
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/watchlist{}", self.base_url, path)
    }

    async fn error_from(response: Response) -> AppError {
        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };

        tracing::error!(status = %status, error = %message, "Watchlist service request failed");

        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
            StatusCode::BAD_REQUEST => AppError::InvalidInput(message),
            _ => AppError::ExternalApi(format!(
                "Watchlist service returned status {}: {}",
                status, message
            )),
        }
    }
}

#[async_trait::async_trait]
impl WatchlistBackend for RemoteWatchlist {
    async fn list(&self, membership: ListMembership) -> AppResult<Vec<WatchlistEntry>> {
        if let Some(entries) = self.cache.get(membership).await {
            return Ok(entries);
        }

        let response = self
            .request(self.http_client.get(self.url("")))
            .query(&[("status", membership.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let entries: Vec<WatchlistEntry> = response.json().await?;
        self.cache.put(membership, entries.clone()).await;
        Ok(entries)
    }

    async fn insert(&self, entry: WatchlistEntry) -> AppResult<bool> {
        let response = self
            .request(self.http_client.post(self.url("")))
            .json(&AddEntryBody {
                media: &entry.item,
                status: entry.membership,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => {
                self.cache.invalidate(entry.membership).await;
                Ok(true)
            }
            StatusCode::CONFLICT => Ok(false),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn remove(&self, id: MediaId, membership: ListMembership) -> AppResult<bool> {
        let response = self
            .request(self.http_client.delete(self.url(&format!("/{}", id))))
            .query(&[("status", membership.as_str())])
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => {
                self.cache.invalidate(membership).await;
                Ok(true)
            }
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn mark_watched(&self, id: MediaId, watched_at: DateTime<Utc>) -> AppResult<bool> {
        let response = self
            .request(self.http_client.put(self.url(&format!("/{}", id))))
            .json(&UpdateStatusBody {
                status: ListMembership::Watched,
                watched_at,
            })
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                self.cache.invalidate_all().await;
                Ok(true)
            }
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(Self::error_from(response).await),
        }
    }

    async fn statistics(&self) -> AppResult<WatchlistStats> {
        let response = self
            .request(self.http_client.get(self.url("/stats")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        Ok(response.json().await?)
    }

    async fn clear(&self) -> AppResult<()> {
        let response = self
            .request(self.http_client.delete(self.url("")))
            .send()
            .await?;

        self.cache.invalidate_all().await;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_built_from_trimmed_base() {
        let remote = RemoteWatchlist::new("http://localhost:8000/api/", "token", Duration::ZERO);
        assert_eq!(remote.url(""), "http://localhost:8000/api/watchlist");
        assert_eq!(remote.url("/42"), "http://localhost:8000/api/watchlist/42");
        assert_eq!(remote.name(), "remote");
    }

    #[test]
    fn test_from_config_uses_configured_ttl() {
        let vars = vec![
            ("WATCHLIST_API_URL".to_string(), "http://example.test/api".to_string()),
            ("WATCHLIST_CACHE_TTL_SECS".to_string(), "5".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        let remote = RemoteWatchlist::from_config(&config, "abc");
        assert_eq!(remote.base_url, "http://example.test/api");
        assert_eq!(remote.token, "abc");
    }
}
