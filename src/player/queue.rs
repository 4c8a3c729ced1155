use crate::player::track::Track;

/// Linear play order and the cursor into it.
///
/// Whenever `tracks` is non-empty, `current_index < tracks.len()`.
#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    tracks: Vec<Track>,
    current_index: usize,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }

    pub fn next_index(&self) -> Option<usize> {
        let next = self.current_index + 1;
        (next < self.tracks.len()).then_some(next)
    }

    pub fn previous_index(&self) -> Option<usize> {
        (!self.tracks.is_empty() && self.current_index > 0).then(|| self.current_index - 1)
    }

    /// Replaces the whole queue and rewinds the cursor to the first entry.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.current_index = 0;
    }

    /// Index of `track` in the queue, appending it first if absent.
    pub fn ensure(&mut self, track: &Track) -> usize {
        match self.position_of(&track.id) {
            Some(index) => index,
            None => {
                self.tracks.push(track.clone());
                self.tracks.len() - 1
            }
        }
    }

    /// Moves the cursor. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.tracks.len() {
            self.current_index = index;
            true
        } else {
            false
        }
    }

    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Inserts right after the cursor, or at the front of an empty queue.
    pub fn insert_next(&mut self, track: Track) {
        if self.tracks.is_empty() {
            self.tracks.push(track);
        } else {
            self.tracks.insert(self.current_index + 1, track);
        }
    }

    /// Removes the entry at `index`. The entry under the cursor stays.
    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() || index == self.current_index {
            return None;
        }
        let removed = self.tracks.remove(index);
        if index < self.current_index {
            self.current_index -= 1;
        }
        Some(removed)
    }

    /// Drops everything except the entry under the cursor.
    pub fn retain_current(&mut self) {
        if self.tracks.is_empty() {
            return;
        }
        let current = self.tracks.swap_remove(self.current_index);
        self.tracks.clear();
        self.tracks.push(current);
        self.current_index = 0;
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current_index = 0;
    }

    /// Stores a freshly resolved URL on every entry with this id so
    /// replays skip the lookup.
    pub fn upgrade_url(&mut self, id: &str, url: &str) {
        for track in self.tracks.iter_mut().filter(|t| t.id == id) {
            track.playable_url = Some(url.to_string());
        }
    }
}
