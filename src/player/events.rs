use std::time::Duration;

use crate::player::{error::PlayerError, track::Track};

/// Published by the controller for UI layers.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TrackStarted(Track, usize),
    Paused,
    Resumed,
    TrackEnded(String),
    ResolutionFailed(String, PlayerError),
    Seeked(Duration),
    QueueChanged(usize),
    VolumeChanged { volume: f32, muted: bool },
    LikeChanged(String, bool),
    SessionReset,
}

/// Reported by whatever hosts the audio output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputEvent {
    TimeUpdate(Duration),
    DurationChange(Duration),
    Waiting,
    Playing,
    Ended,
}

/// OS-level transport keys routed back into the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransportAction {
    Play,
    Pause,
    SeekTo(Duration),
}

impl TransportAction {
    pub const SUPPORTED: [&'static str; 3] = ["play", "pause", "seekto"];
}
