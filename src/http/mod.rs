use async_trait::async_trait;
use color_eyre::eyre::{WrapErr, eyre};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::config::PlayerConfig;
use crate::player::{error::PlayerError, traits::SongLookup, track::SongDetails};

/// Client for the backend catalog API.
pub struct ApiService {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiService {
    pub fn new(config: &PlayerConfig) -> color_eyre::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = config.api_base_url.trim_end_matches('/');
        let base_url = Url::parse(base_url)
            .wrap_err_with(|| format!("invalid API base url {base_url:?}"))?;
        if base_url.cannot_be_a_base() {
            return Err(eyre!("API base url {base_url} cannot carry a path"));
        }

        Ok(Self {
            client,
            base_url,
            token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `{base}/song/{id}` with the id as a single escaped segment.
    fn song_url(&self, track_id: &str) -> color_eyre::Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| eyre!("API base url {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .push("song")
            .push(track_id);
        Ok(url)
    }

    pub async fn fetch_song(&self, track_id: &str) -> color_eyre::Result<SongDetails> {
        let url = self.song_url(track_id)?;
        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(eyre!("Song {track_id} not found"));
        }
        let details = response.error_for_status()?.json::<SongDetails>().await?;
        debug!(id = track_id, status = status.as_u16(), "api_song_fetched");
        Ok(details)
    }
}

#[async_trait]
impl SongLookup for ApiService {
    async fn lookup(&self, track_id: &str) -> Result<SongDetails, PlayerError> {
        let details = self.fetch_song(track_id).await.map_err(|e| {
            warn!(id = track_id, error = %e, "api_song_lookup_failed");
            PlayerError::resolution(track_id, e)
        })?;

        match details.url.as_deref() {
            Some(url) if !url.is_empty() => Ok(details),
            _ => Err(PlayerError::MissingUrl(track_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> ApiService {
        let config = PlayerConfig {
            api_base_url: base.to_string(),
            ..PlayerConfig::default()
        };
        ApiService::new(&config).unwrap()
    }

    #[test]
    fn song_url_escapes_the_id() {
        let api = service("https://music.example/api/");
        assert_eq!(
            api.song_url("mix/2024?live#1").unwrap().as_str(),
            "https://music.example/api/song/mix%2F2024%3Flive%231"
        );
    }

    #[test]
    fn song_url_on_bare_host() {
        let api = service("https://music.example");
        assert_eq!(api.base_url(), "https://music.example");
        assert_eq!(
            api.song_url("42").unwrap().as_str(),
            "https://music.example/song/42"
        );
    }

    #[test]
    fn malformed_base_url_is_rejected() {
        let config = PlayerConfig {
            api_base_url: "not a url".into(),
            ..PlayerConfig::default()
        };
        assert!(ApiService::new(&config).is_err());
    }
}
