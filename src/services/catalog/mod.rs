/// Media catalog abstraction
///
/// The selection engine only depends on this trait; `TmdbCatalog` is the
/// production implementation and tests substitute a mock.
use crate::{
    error::AppResult,
    models::{CandidateItem, FilterCriteria, Genre, MediaId, MediaKind, MediaSummary, Video},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

/// Upper bound on the page count used for sampling, whatever the catalog reports
pub const MAX_CATALOG_PAGES: u32 = 500;

/// A discover query bound to one media kind and filter set
///
/// Holds the query parameters (minus credentials and page number) so the same
/// query can be replayed for any page.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverQuery {
    pub kind: MediaKind,
    pub params: Vec<(String, String)>,
}

impl DiscoverQuery {
    /// Translates filter state into TMDb discover parameters
    pub fn from_filters(kind: MediaKind, filters: &FilterCriteria) -> Self {
        let mut params = vec![
            ("vote_average.gte".to_string(), filters.min_rating.to_string()),
            ("vote_average.lte".to_string(), filters.max_rating.to_string()),
            ("vote_count.gte".to_string(), filters.min_vote_count.to_string()),
        ];

        if !filters.genre_ids.is_empty() {
            let genres = filters
                .genre_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            params.push(("with_genres".to_string(), genres));
        }

        let date_param = kind.release_date_param();
        params.push((
            format!("{}.gte", date_param),
            format!("{}-01-01", filters.year_from),
        ));
        params.push((
            format!("{}.lte", date_param),
            format!("{}-12-31", filters.year_to),
        ));

        Self { kind, params }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Clamps a reported page count into `[1, MAX_CATALOG_PAGES]`
pub fn clamp_total_pages(reported: u32) -> u32 {
    reported.clamp(1, MAX_CATALOG_PAGES)
}

/// Trait for media catalogs
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Builds a discover query and returns it with its total page count
    ///
    /// The page count is already clamped to [`MAX_CATALOG_PAGES`]. Fails with
    /// `AppError::NoResults` when the first page is empty.
    async fn build_query(
        &self,
        kind: MediaKind,
        filters: &FilterCriteria,
    ) -> AppResult<(DiscoverQuery, u32)>;

    /// Fetches the summaries on one page of a discover query
    async fn fetch_page(&self, query: &DiscoverQuery, page: u32) -> AppResult<Vec<MediaSummary>>;

    /// Fetches the full record of one entry
    async fn fetch_detail(&self, kind: MediaKind, id: MediaId) -> AppResult<CandidateItem>;

    /// Lists movie and TV genres, deduplicated by id
    async fn fetch_genres(&self) -> AppResult<Vec<Genre>>;

    /// Lists trailers and clips for one entry
    async fn fetch_videos(&self, kind: MediaKind, id: MediaId) -> AppResult<Vec<Video>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
