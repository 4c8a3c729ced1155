use std::collections::HashSet;

use crate::player::track::TrackId;

/// Client-side set of favorited track ids.
#[derive(Debug, Clone, Default)]
pub struct LikedSongs {
    ids: HashSet<TrackId>,
}

impl LikedSongs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids(ids: impl IntoIterator<Item = TrackId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn like(&mut self, id: impl Into<TrackId>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn unlike(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn replace_all(&mut self, ids: impl IntoIterator<Item = TrackId>) {
        self.ids = ids.into_iter().collect();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership() {
        let mut liked = LikedSongs::new();
        assert!(liked.toggle("1"));
        assert!(liked.contains("1"));
        assert!(!liked.toggle("1"));
        assert!(liked.is_empty());
    }

    #[test]
    fn replace_all_drops_previous_ids() {
        let mut liked = LikedSongs::from_ids(["a".to_string(), "b".to_string()]);
        liked.replace_all(["c".to_string()]);
        assert!(!liked.contains("a"));
        assert_eq!(liked.iter().collect::<Vec<_>>(), ["c"]);
    }

    #[test]
    fn like_is_idempotent() {
        let mut liked = LikedSongs::new();
        assert!(liked.like("x"));
        assert!(!liked.like("x"));
        assert_eq!(liked.len(), 1);
        assert!(liked.unlike("x"));
        assert!(!liked.unlike("x"));
    }
}
