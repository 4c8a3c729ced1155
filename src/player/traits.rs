use crate::player::{
    error::PlayerError, media_session::MediaMetadata, snapshot::TrackSnapshot, track::SongDetails,
};
use async_trait::async_trait;
use std::time::Duration;

/// Resolves a track id into details carrying a playable URL.
#[async_trait]
pub trait SongLookup: Send + Sync {
    async fn lookup(&self, track_id: &str) -> Result<SongDetails, PlayerError>;
}

/// The single audio element the controller drives. Nothing else should
/// hold a handle to it.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    fn load(&self, url: &str) -> Result<(), PlayerError>;
    /// Completes once the output actually started producing sound.
    async fn play(&self) -> Result<(), PlayerError>;
    fn pause(&self);
    fn stop(&self);
    fn seek(&self, position: Duration);
    fn set_volume(&self, gain: f32);
}

/// Host integration for OS transport controls. Best effort.
pub trait MediaSession: Send + Sync {
    fn publish(&self, metadata: &MediaMetadata, actions: &[&str]) -> Result<(), PlayerError>;
    fn clear(&self);
}

/// Session-scoped mirror of the current track.
pub trait SessionStore: Send + Sync {
    fn save(&self, snapshot: &TrackSnapshot) -> Result<(), PlayerError>;
    fn load(&self) -> Result<Option<TrackSnapshot>, PlayerError>;
    fn clear(&self) -> Result<(), PlayerError>;
}

/// Pull-only view of the login state.
pub trait AuthSignal: Send + Sync {
    fn is_authenticated(&self) -> bool;
}
