use serde::{Deserialize, Serialize};

pub type TrackId = String;

pub const PLACEHOLDER_THUMBNAIL: &str = "/images/placeholder-track.png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub id: String,
    pub name: String,
}

/// A playable item as the controller sees it.
///
/// `artists` keeps credit order. `playable_url` is filled lazily by the
/// song lookup and may expire, so it is never part of track identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistCredit>,
    #[serde(default)]
    pub playable_url: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration_seconds: None,
            thumbnail_url: None,
            artists: Vec::new(),
            playable_url: None,
        }
    }

    pub fn with_artist(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.artists.push(ArtistCredit {
            id: id.into(),
            name: name.into(),
        });
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.playable_url = Some(url.into());
        self
    }

    pub fn thumbnail_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.thumbnail_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(placeholder)
    }

    pub fn thumbnail(&self) -> &str {
        self.thumbnail_or(PLACEHOLDER_THUMBNAIL)
    }

    /// Artist names joined in credit order.
    pub fn artist_line(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Copy of this track carrying whatever the lookup knew better.
    pub(crate) fn resolved_with(&self, details: &SongDetails, url: String) -> Self {
        let mut track = self.clone();
        track.playable_url = Some(url);
        if track.duration_seconds.is_none() {
            track.duration_seconds = details.duration;
        }
        if track.thumbnail_url.is_none() {
            track.thumbnail_url = details.thumbnail_url.clone();
        }
        if track.artists.is_empty() {
            track.artists = details.artists.clone();
        }
        track
    }
}

/// Body of `GET /song/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDetails {
    pub id: TrackId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistCredit>,
}

impl From<SongDetails> for Track {
    fn from(details: SongDetails) -> Self {
        Self {
            id: details.id,
            title: details.title,
            duration_seconds: details.duration,
            thumbnail_url: details.thumbnail_url,
            artists: details.artists,
            playable_url: details.url,
        }
    }
}
