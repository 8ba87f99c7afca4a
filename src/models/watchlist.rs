use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use super::CandidateItem;
use crate::error::AppError;

/// Which named list a saved item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMembership {
    ToWatch,
    Watched,
}

impl ListMembership {
    pub const ALL: [ListMembership; 2] = [ListMembership::ToWatch, ListMembership::Watched];

    /// Key the list is stored under in key-value backends
    pub fn storage_key(&self) -> &'static str {
        match self {
            ListMembership::ToWatch => "media_to_watch",
            ListMembership::Watched => "media_watched",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ListMembership::ToWatch => "to_watch",
            ListMembership::Watched => "watched",
        }
    }

    pub fn other(&self) -> ListMembership {
        match self {
            ListMembership::ToWatch => ListMembership::Watched,
            ListMembership::Watched => ListMembership::ToWatch,
        }
    }
}

impl Display for ListMembership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ListMembership {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to_watch" => Ok(ListMembership::ToWatch),
            "watched" => Ok(ListMembership::Watched),
            other => Err(AppError::InvalidInput(format!(
                "Unknown watchlist status: {}",
                other
            ))),
        }
    }
}

/// A saved item together with the list it is on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub membership: ListMembership,
    pub item: CandidateItem,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub watched_at: Option<DateTime<Utc>>,
}

impl WatchlistEntry {
    pub fn new(item: CandidateItem, membership: ListMembership) -> Self {
        let now = Utc::now();
        Self {
            membership,
            item,
            added_at: now,
            watched_at: match membership {
                ListMembership::Watched => Some(now),
                ListMembership::ToWatch => None,
            },
        }
    }

    /// The same entry moved to the watched list
    pub fn into_watched(self, watched_at: DateTime<Utc>) -> Self {
        Self {
            membership: ListMembership::Watched,
            watched_at: Some(watched_at),
            ..self
        }
    }
}

/// Counts across both lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistStats {
    pub to_watch_count: usize,
    pub watched_count: usize,
    pub total_count: usize,
    /// Genre name -> number of saved items tagged with it
    pub genre_counts: BTreeMap<String, usize>,
}

impl WatchlistStats {
    pub fn from_lists(to_watch: &[WatchlistEntry], watched: &[WatchlistEntry]) -> Self {
        let mut genre_counts = BTreeMap::new();
        for entry in to_watch.iter().chain(watched) {
            for genre in &entry.item.genres {
                *genre_counts.entry(genre.name.clone()).or_insert(0) += 1;
            }
        }

        Self {
            to_watch_count: to_watch.len(),
            watched_count: watched.len(),
            total_count: to_watch.len() + watched.len(),
            genre_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, MediaKind};

    fn item(id: u64, genres: &[&str]) -> CandidateItem {
        CandidateItem {
            id,
            kind: MediaKind::Movie,
            title: format!("Movie {}", id),
            original_title: None,
            overview: "Something happens.".to_string(),
            release_date: None,
            vote_average: 7.0,
            vote_count: 100,
            genres: genres
                .iter()
                .enumerate()
                .map(|(i, name)| Genre {
                    id: i as u32,
                    name: name.to_string(),
                })
                .collect(),
            poster_path: None,
            backdrop_path: None,
            runtime: None,
            number_of_seasons: None,
            number_of_episodes: None,
        }
    }

    #[test]
    fn test_membership_serde_and_parse() {
        let json = serde_json::to_string(&ListMembership::ToWatch).unwrap();
        assert_eq!(json, "\"to_watch\"");
        assert_eq!(
            "watched".parse::<ListMembership>().unwrap(),
            ListMembership::Watched
        );
        assert!("seen".parse::<ListMembership>().is_err());
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(ListMembership::ToWatch.storage_key(), "media_to_watch");
        assert_eq!(ListMembership::Watched.storage_key(), "media_watched");
    }

    #[test]
    fn test_new_watched_entry_has_watched_timestamp() {
        let entry = WatchlistEntry::new(item(1, &[]), ListMembership::Watched);
        assert_eq!(entry.watched_at, Some(entry.added_at));

        let entry = WatchlistEntry::new(item(2, &[]), ListMembership::ToWatch);
        assert_eq!(entry.watched_at, None);
    }

    #[test]
    fn test_stats_count_genres_across_lists() {
        let to_watch = vec![
            WatchlistEntry::new(item(1, &["Drama", "Crime"]), ListMembership::ToWatch),
            WatchlistEntry::new(item(2, &["Drama"]), ListMembership::ToWatch),
        ];
        let watched = vec![WatchlistEntry::new(
            item(3, &["Comedy", "Drama"]),
            ListMembership::Watched,
        )];

        let stats = WatchlistStats::from_lists(&to_watch, &watched);
        assert_eq!(stats.to_watch_count, 2);
        assert_eq!(stats.watched_count, 1);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.genre_counts.get("Drama"), Some(&3));
        assert_eq!(stats.genre_counts.get("Crime"), Some(&1));
        assert_eq!(stats.genre_counts.get("Comedy"), Some(&1));
    }
}
