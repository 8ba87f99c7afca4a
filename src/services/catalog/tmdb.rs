/// The Movie Database (TMDb) catalog provider
///
/// API Flow:
/// 1. Discover: /discover/{movie,tv} with filter parameters → paged summaries
/// 2. Details: /{movie,tv}/{id} → full record (genres, runtime, seasons)
/// 3. Genres: /genre/{movie,tv}/list, merged
/// 4. Videos: /{movie,tv}/{id}/videos, with a fallback language
use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        media::{TmdbDiscoverResponse, TmdbGenreList, TmdbMediaDetails, TmdbVideoList},
        CandidateItem, FilterCriteria, Genre, MediaId, MediaKind, MediaSummary, Video,
    },
    services::catalog::{clamp_total_pages, CatalogProvider, DiscoverQuery},
};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::collections::HashSet;

const GENRE_CACHE_TTL: u64 = 86400; // 1 day
const DETAILS_CACHE_TTL: u64 = 21600; // 6 hours

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    fallback_language: String,
    cache: Option<Cache>,
}

impl TmdbCatalog {
    pub fn new(api_key: String, api_url: String, language: String, fallback_language: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            fallback_language,
            cache: None,
        }
    }

    /// Builds the catalog from configuration; fails when no API key is set
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let api_key = config
            .tmdb_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config("TMDB_API_KEY is not set".to_string()))?;

        Ok(Self::new(
            api_key,
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
            config.tmdb_fallback_language.clone(),
        ))
    }

    /// Serves genre lists and details through the given Redis cache
    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        language: &str,
        params: &[(String, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", language)])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path = %path, status = %status, "TMDb request failed");
            return Err(AppError::ExternalApi(format!(
                "TMDb returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn discover(&self, query: &DiscoverQuery, page: u32) -> AppResult<TmdbDiscoverResponse> {
        let path = format!("/discover/{}", query.kind.tmdb_path());
        let mut params = query.params.clone();
        params.push(("page".to_string(), page.to_string()));

        self.get_json(&path, &self.language, &params).await
    }

    async fn genre_list(&self, kind: MediaKind) -> AppResult<Vec<Genre>> {
        let path = format!("/genre/{}/list", kind.tmdb_path());
        let list: TmdbGenreList = self.get_json(&path, &self.language, &[]).await?;
        Ok(list.genres)
    }

    async fn video_list(&self, kind: MediaKind, id: MediaId, language: &str) -> AppResult<Vec<Video>> {
        let path = format!("/{}/{}/videos", kind.tmdb_path(), id);
        let list: TmdbVideoList = self.get_json(&path, language, &[]).await?;
        Ok(list.results)
    }
}

/// Concatenates genre lists keeping the first genre seen for each id
fn merge_genres(lists: impl IntoIterator<Item = Vec<Genre>>) -> Vec<Genre> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|genre| seen.insert(genre.id))
        .collect()
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn build_query(
        &self,
        kind: MediaKind,
        filters: &FilterCriteria,
    ) -> AppResult<(DiscoverQuery, u32)> {
        let query = DiscoverQuery::from_filters(kind, filters);
        let first_page = self.discover(&query, 1).await?;

        if first_page.results.is_empty() {
            tracing::info!(kind = %kind, provider = "tmdb", "Discover query matched nothing");
            return Err(AppError::NoResults);
        }

        let total_pages = clamp_total_pages(first_page.total_pages);

        tracing::debug!(
            kind = %kind,
            reported_pages = first_page.total_pages,
            total_pages,
            total_results = first_page.total_results,
            "Discover query built"
        );

        Ok((query, total_pages))
    }

    async fn fetch_page(&self, query: &DiscoverQuery, page: u32) -> AppResult<Vec<MediaSummary>> {
        let response = self.discover(query, page).await?;
        Ok(response.results.into_iter().map(MediaSummary::from).collect())
    }

    async fn fetch_detail(&self, kind: MediaKind, id: MediaId) -> AppResult<CandidateItem> {
        cached!(
            self.cache.as_ref(),
            CacheKey::MediaDetails {
                kind,
                id,
                language: self.language.clone(),
            },
            DETAILS_CACHE_TTL,
            async move {
                let path = format!("/{}/{}", kind.tmdb_path(), id);
                let details: TmdbMediaDetails = self.get_json(&path, &self.language, &[]).await?;
                Ok::<_, AppError>(details.into_candidate(kind))
            }
        )
    }

    async fn fetch_genres(&self) -> AppResult<Vec<Genre>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::GenreList(self.language.clone()),
            GENRE_CACHE_TTL,
            async move {
                let (movie, tv) = tokio::try_join!(
                    self.genre_list(MediaKind::Movie),
                    self.genre_list(MediaKind::Series)
                )?;
                let genres = merge_genres([movie, tv]);

                tracing::info!(count = genres.len(), provider = "tmdb", "Genres loaded");

                Ok::<_, AppError>(genres)
            }
        )
    }

    async fn fetch_videos(&self, kind: MediaKind, id: MediaId) -> AppResult<Vec<Video>> {
        let videos = self.video_list(kind, id, &self.language).await?;
        if !videos.is_empty() || self.fallback_language == self.language {
            return Ok(videos);
        }

        tracing::debug!(
            id,
            language = %self.language,
            fallback = %self.fallback_language,
            "No videos in primary language, retrying with fallback"
        );

        self.video_list(kind, id, &self.fallback_language).await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: u32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_merge_genres_dedupes_by_id() {
        let movie = vec![genre(28, "Azione"), genre(18, "Dramma")];
        let tv = vec![genre(18, "Dramma TV"), genre(10765, "Sci-Fi & Fantasy")];

        let merged = merge_genres([movie, tv]);
        assert_eq!(
            merged,
            vec![
                genre(28, "Azione"),
                genre(18, "Dramma"),
                genre(10765, "Sci-Fi & Fantasy")
            ]
        );
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert!(matches!(
            TmdbCatalog::from_config(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_trims_trailing_slash() {
        let vars = vec![
            ("TMDB_API_KEY".to_string(), "key".to_string()),
            ("TMDB_API_URL".to_string(), "http://localhost:9999/3/".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        let catalog = TmdbCatalog::from_config(&config).unwrap();
        assert_eq!(catalog.api_url, "http://localhost:9999/3");
        assert_eq!(catalog.name(), "tmdb");
    }
}
