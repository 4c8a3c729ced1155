use std::time::Duration;

use crate::player::track::Track;

/// Every mutation the controller accepts, for hosts that route UI input
/// through a channel instead of calling methods directly.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Play(Track),
    PlayList(Vec<Track>),
    PlayListFrom(Vec<Track>, usize),
    PlayAtIndex(usize),
    Pause,
    Resume,
    TogglePlay,
    Next,
    Previous,
    SeekTo(Duration),
    SeekForward,
    SeekBackward,
    SeekStart,
    SeekEnd,
    SetVolume(f32),
    VolumeUp,
    VolumeDown,
    Mute,
    Unmute,
    ToggleMute,
    QueueTrack(Track),
    PlayTrackNext(Track),
    RemoveFromQueue(usize),
    ClearQueue,
    ToggleLike(String),
}
