use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::player::{
    error::PlayerError,
    traits::SessionStore,
    track::{ArtistCredit, Track},
};

/// What survives a page reload: the bound track and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSnapshot {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistCredit>,
}

impl TrackSnapshot {
    /// `None` for tracks that were never resolved.
    pub fn of(track: &Track) -> Option<Self> {
        let url = track.playable_url.clone()?;
        Some(Self {
            id: track.id.clone(),
            title: track.title.clone(),
            url,
            duration: track.duration_seconds,
            thumbnail_url: track.thumbnail_url.clone(),
            artists: track.artists.clone(),
        })
    }
}

impl From<TrackSnapshot> for Track {
    fn from(snapshot: TrackSnapshot) -> Self {
        Self {
            id: snapshot.id,
            title: snapshot.title,
            duration_seconds: snapshot.duration,
            thumbnail_url: snapshot.thumbnail_url,
            artists: snapshot.artists,
            playable_url: Some(snapshot.url),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<RwLock<Option<TrackSnapshot>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, snapshot: &TrackSnapshot) -> Result<(), PlayerError> {
        let mut slot = self
            .slot
            .write()
            .map_err(|e| PlayerError::Storage(e.to_string()))?;
        *slot = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<TrackSnapshot>, PlayerError> {
        let slot = self
            .slot
            .read()
            .map_err(|e| PlayerError::Storage(e.to_string()))?;
        Ok(slot.clone())
    }

    fn clear(&self) -> Result<(), PlayerError> {
        let mut slot = self
            .slot
            .write()
            .map_err(|e| PlayerError::Storage(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}

/// JSON file store for headless hosts. Point it at a per-run location to
/// keep it session scoped.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, snapshot: &TrackSnapshot) -> Result<(), PlayerError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PlayerError::Storage(e.to_string()))?;
        }
        let body =
            serde_json::to_vec_pretty(snapshot).map_err(|e| PlayerError::Storage(e.to_string()))?;
        std::fs::write(&self.path, body).map_err(|e| PlayerError::Storage(e.to_string()))
    }

    fn load(&self) -> Result<Option<TrackSnapshot>, PlayerError> {
        let body = match std::fs::read(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PlayerError::Storage(e.to_string())),
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| PlayerError::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<(), PlayerError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PlayerError::Storage(e.to_string())),
        }
    }
}
