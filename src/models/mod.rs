use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod filters;
pub mod media;
pub mod watchlist;

pub use filters::FilterCriteria;
pub use media::{
    is_usable_description, CandidateItem, Genre, MediaSummary, Video, PLACEHOLDER_OVERVIEW,
};
pub use watchlist::{ListMembership, WatchlistEntry, WatchlistStats};

/// TMDb identifier of a movie or series
pub type MediaId = u64;

/// Whether a catalog entry is a movie or a TV series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Movie,
    Series,
}

impl MediaKind {
    /// Path segment TMDb uses for this kind ("movie" or "tv")
    pub fn tmdb_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }

    /// Discover parameter prefix bounding the release window
    pub fn release_date_param(&self) -> &'static str {
        match self {
            MediaKind::Movie => "primary_release_date",
            MediaKind::Series => "first_air_date",
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}
