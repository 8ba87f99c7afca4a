use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{MediaId, MediaKind};

/// Overview TMDb returns when no translation exists for the requested language
pub const PLACEHOLDER_OVERVIEW: &str = "Nessuna descrizione disponibile in italiano.";

/// A description is usable when it is present, not blank and not the placeholder
pub fn is_usable_description(overview: Option<&str>) -> bool {
    match overview {
        Some(text) => !text.trim().is_empty() && text != PLACEHOLDER_OVERVIEW,
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

/// Full catalog entry, as returned by the detail endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: MediaId,
    pub kind: MediaKind,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Movies only, in minutes
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Series only
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    /// Series only
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
}

impl CandidateItem {
    pub fn has_usable_description(&self) -> bool {
        is_usable_description(Some(&self.overview))
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }

    /// Absolute poster URL given the image base (e.g. `https://image.tmdb.org/t/p/w500`)
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        self.poster_path
            .as_ref()
            .map(|path| format!("{}{}", image_base_url.trim_end_matches('/'), path))
    }
}

/// Discover-page entry; lighter than [`CandidateItem`] and possibly with a
/// different overview than the detail record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaSummary {
    pub id: MediaId,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub genre_ids: Vec<u32>,
    pub poster_path: Option<String>,
}

impl MediaSummary {
    pub fn has_usable_description(&self) -> bool {
        is_usable_description(self.overview.as_deref())
    }
}

/// Trailer or clip attached to a catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.site.eq_ignore_ascii_case("youtube") && self.video_type == "Trailer"
    }
}

// ============================================================================
// TMDb API Types
// ============================================================================

/// TMDb sends "" for unknown dates, so anything unparsable becomes `None`
fn parse_tmdb_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// Response from /discover/{movie,tv}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbDiscoverResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<TmdbMediaResult>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

/// One discover result; movies carry `title`, series carry `name`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMediaResult {
    pub id: MediaId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl From<TmdbMediaResult> for MediaSummary {
    fn from(result: TmdbMediaResult) -> Self {
        let release_date = parse_tmdb_date(
            result
                .release_date
                .as_deref()
                .or(result.first_air_date.as_deref()),
        );

        MediaSummary {
            id: result.id,
            title: result.title.or(result.name).unwrap_or_default(),
            overview: result.overview,
            release_date,
            vote_average: result.vote_average,
            genre_ids: result.genre_ids,
            poster_path: result.poster_path,
        }
    }
}

/// Response from /movie/{id} and /tv/{id}
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMediaDetails {
    pub id: MediaId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub number_of_episodes: Option<u32>,
}

impl TmdbMediaDetails {
    pub fn into_candidate(self, kind: MediaKind) -> CandidateItem {
        let release_date = parse_tmdb_date(
            self.release_date
                .as_deref()
                .or(self.first_air_date.as_deref()),
        );

        CandidateItem {
            id: self.id,
            kind,
            title: self.title.or(self.name).unwrap_or_default(),
            original_title: self.original_title.or(self.original_name),
            overview: self.overview.unwrap_or_default(),
            release_date,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            genres: self.genres,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            runtime: self.runtime,
            number_of_seasons: self.number_of_seasons,
            number_of_episodes: self.number_of_episodes,
        }
    }
}

/// Response from /genre/{movie,tv}/list
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// Response from /{movie,tv}/{id}/videos
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideoList {
    #[serde(default)]
    pub results: Vec<Video>,
}
