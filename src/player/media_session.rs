use crate::player::{error::PlayerError, traits::MediaSession, track::Track};

pub const ARTWORK_SIZES: [u32; 6] = [96, 128, 192, 256, 384, 512];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub src: String,
    pub sizes: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub artwork: Vec<Artwork>,
}

impl MediaMetadata {
    pub fn for_track(track: &Track, placeholder: &str) -> Self {
        let src = track.thumbnail_or(placeholder).to_string();
        let artwork = ARTWORK_SIZES
            .iter()
            .map(|size| Artwork {
                src: src.clone(),
                sizes: format!("{size}x{size}"),
            })
            .collect();

        Self {
            title: track.title.clone(),
            artist: track.artist_line(),
            artwork,
        }
    }
}

/// For hosts without OS transport integration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMediaSession;

impl MediaSession for NoMediaSession {
    fn publish(&self, _metadata: &MediaMetadata, _actions: &[&str]) -> Result<(), PlayerError> {
        Err(PlayerError::CapabilityAbsent)
    }

    fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::track::PLACEHOLDER_THUMBNAIL;

    #[test]
    fn metadata_lists_every_artwork_size() {
        let track = Track::new("1", "Song")
            .with_artist("a", "First")
            .with_artist("b", "Second");
        let metadata = MediaMetadata::for_track(&track, PLACEHOLDER_THUMBNAIL);

        assert_eq!(metadata.artist, "First, Second");
        assert_eq!(metadata.artwork.len(), ARTWORK_SIZES.len());
        assert_eq!(metadata.artwork[0].sizes, "96x96");
        assert!(metadata.artwork.iter().all(|a| a.src == PLACEHOLDER_THUMBNAIL));
    }
}
