use std::collections::HashSet;

use crate::models::{CandidateItem, MediaId};

/// Items already surfaced in this session, in discovery order
///
/// Ids are unique. The set only shrinks through [`SeenSet::clear`].
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    items: Vec<CandidateItem>,
    ids: HashSet<MediaId>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: MediaId) -> bool {
        self.ids.contains(&id)
    }

    /// Appends the item unless its id is already present; returns whether it was added
    pub fn add(&mut self, item: CandidateItem) -> bool {
        if !self.ids.insert(item.id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.ids.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateItem> {
        self.items.iter()
    }

    /// Most recently surfaced item
    pub fn last(&self) -> Option<&CandidateItem> {
        self.items.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaKind;

    fn item(id: MediaId) -> CandidateItem {
        CandidateItem {
            id,
            kind: MediaKind::Movie,
            title: format!("Movie {}", id),
            original_title: None,
            overview: "Plot.".to_string(),
            release_date: None,
            vote_average: 6.0,
            vote_count: 10,
            genres: vec![],
            poster_path: None,
            backdrop_path: None,
            runtime: None,
            number_of_seasons: None,
            number_of_episodes: None,
        }
    }

    #[test]
    fn test_add_keeps_discovery_order() {
        let mut seen = SeenSet::new();
        assert!(seen.add(item(3)));
        assert!(seen.add(item(1)));
        assert!(seen.add(item(2)));

        let ids: Vec<MediaId> = seen.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(seen.last().map(|i| i.id), Some(2));
    }

    #[test]
    fn test_add_duplicate_is_noop() {
        let mut seen = SeenSet::new();
        assert!(seen.add(item(42)));
        assert!(!seen.add(item(42)));
        assert_eq!(seen.len(), 1);
        assert!(seen.contains(42));
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut seen = SeenSet::new();
        for id in 0..10 {
            seen.add(item(id));
        }
        seen.clear();
        assert!(seen.is_empty());
        assert!(!seen.contains(5));
        assert!(seen.add(item(5)));
    }
}
