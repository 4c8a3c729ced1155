use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlayerError {
    #[error("Failed to resolve track {track_id}: {reason}")]
    Resolution { track_id: String, reason: String },

    #[error("Song lookup returned no playable url for track {0}")]
    MissingUrl(String),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("Media session unavailable")]
    CapabilityAbsent,

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl PlayerError {
    pub fn resolution(track_id: impl Into<String>, reason: impl ToString) -> Self {
        Self::Resolution {
            track_id: track_id.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this came out of resolving a playable URL.
    pub fn is_resolution(&self) -> bool {
        matches!(self, Self::Resolution { .. } | Self::MissingUrl(_))
    }
}
