use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::MediaKind;

/// Query constraints chosen in the UI
///
/// Range correctness (min <= max, year_from <= year_to) is left to the caller;
/// the values are forwarded to the catalog as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterCriteria {
    pub kind: MediaKind,
    pub min_rating: f64,
    pub max_rating: f64,
    pub year_from: i32,
    pub year_to: i32,
    pub min_vote_count: u32,
    /// Genre ids, kept sorted so the generated query is stable
    pub genre_ids: BTreeSet<u32>,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            kind: MediaKind::Movie,
            min_rating: 0.0,
            max_rating: 10.0,
            year_from: 1900,
            year_to: chrono::Utc::now().year(),
            min_vote_count: 0,
            genre_ids: BTreeSet::new(),
        }
    }
}

impl FilterCriteria {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Selects the genre if it is not selected yet, deselects it otherwise
    pub fn toggle_genre(&mut self, genre_id: u32) {
        if !self.genre_ids.remove(&genre_id) {
            self.genre_ids.insert(genre_id);
        }
    }

    pub fn has_genre(&self, genre_id: u32) -> bool {
        self.genre_ids.contains(&genre_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_full_catalog() {
        let filters = FilterCriteria::default();
        assert_eq!(filters.kind, MediaKind::Movie);
        assert_eq!(filters.min_rating, 0.0);
        assert_eq!(filters.max_rating, 10.0);
        assert_eq!(filters.year_from, 1900);
        assert_eq!(filters.year_to, chrono::Utc::now().year());
        assert_eq!(filters.min_vote_count, 0);
        assert!(filters.genre_ids.is_empty());
    }

    #[test]
    fn test_toggle_genre_adds_then_removes() {
        let mut filters = FilterCriteria::new(MediaKind::Series);
        filters.toggle_genre(18);
        filters.toggle_genre(35);
        assert!(filters.has_genre(18));
        assert!(filters.has_genre(35));

        filters.toggle_genre(18);
        assert!(!filters.has_genre(18));
        assert_eq!(filters.genre_ids.len(), 1);
    }

    #[test]
    fn test_inverted_ranges_are_not_rejected() {
        let filters = FilterCriteria {
            min_rating: 9.0,
            max_rating: 2.0,
            ..FilterCriteria::default()
        };
        assert!(filters.min_rating > filters.max_rating);
    }
}
