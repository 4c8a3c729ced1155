use std::time::Duration;

use crate::player::{error::PlayerError, track::Track};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Read-only view of the controller, republished after every transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    pub status: PlaybackStatus,
    pub current_track: Option<Track>,
    pub queue: Vec<Track>,
    pub queue_index: usize,
    pub position: Duration,
    pub drag_position: Option<Duration>,
    pub duration: Option<Duration>,
    pub volume: f32,
    pub muted: bool,
    pub current_liked: bool,
    pub is_authenticated: bool,
    pub last_error: Option<PlayerError>,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn is_loading(&self) -> bool {
        self.status == PlaybackStatus::Loading
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_position.is_some()
    }

    pub fn displayed_position(&self) -> Duration {
        self.drag_position.unwrap_or(self.position)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_track.as_ref().map(|t| t.id.as_str())
    }
}
