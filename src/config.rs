use color_eyre::eyre::{WrapErr, eyre};
use std::str::FromStr;
use std::time::Duration;

use crate::player::track::PLACEHOLDER_THUMBNAIL;

pub const ENV_PREFIX: &str = "TUNELANE";

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub volume: u8,
    pub volume_step: u8,
    pub seek_step_secs: u64,
    pub seek_debounce_ms: u64,
    pub auth_poll_ms: u64,
    pub auto_advance: bool,
    pub placeholder_thumbnail: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000/api".to_string(),
            api_token: None,
            volume: 100,
            volume_step: 5,
            seek_step_secs: 5,
            seek_debounce_ms: 150,
            auth_poll_ms: 1000,
            auto_advance: false,
            placeholder_thumbnail: PLACEHOLDER_THUMBNAIL.to_string(),
        }
    }
}

impl PlayerConfig {
    /// Reads `TUNELANE_*` variables, falling back to defaults for unset
    /// ones. Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> color_eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> color_eyre::Result<Self> {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}_{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let config = Self {
            api_base_url: get("API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            api_token: get("TOKEN").or(defaults.api_token),
            volume: parse_or(get("VOLUME"), "VOLUME", defaults.volume)?,
            volume_step: parse_or(get("VOLUME_STEP"), "VOLUME_STEP", defaults.volume_step)?,
            seek_step_secs: parse_or(get("SEEK_STEP_SECS"), "SEEK_STEP_SECS", defaults.seek_step_secs)?,
            seek_debounce_ms: parse_or(
                get("SEEK_DEBOUNCE_MS"),
                "SEEK_DEBOUNCE_MS",
                defaults.seek_debounce_ms,
            )?,
            auth_poll_ms: parse_or(get("AUTH_POLL_MS"), "AUTH_POLL_MS", defaults.auth_poll_ms)?,
            auto_advance: parse_or(get("AUTO_ADVANCE"), "AUTO_ADVANCE", defaults.auto_advance)?,
            placeholder_thumbnail: get("PLACEHOLDER_THUMBNAIL")
                .unwrap_or(defaults.placeholder_thumbnail),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> color_eyre::Result<()> {
        if self.volume > 100 {
            return Err(eyre!("{ENV_PREFIX}_VOLUME must be within 0..=100, got {}", self.volume));
        }
        if self.volume_step == 0 || self.volume_step > 100 {
            return Err(eyre!(
                "{ENV_PREFIX}_VOLUME_STEP must be within 1..=100, got {}",
                self.volume_step
            ));
        }
        if self.auth_poll_ms == 0 {
            return Err(eyre!("{ENV_PREFIX}_AUTH_POLL_MS must be positive"));
        }
        Ok(())
    }

    pub fn seek_step(&self) -> Duration {
        Duration::from_secs(self.seek_step_secs)
    }

    pub fn seek_debounce(&self) -> Duration {
        Duration::from_millis(self.seek_debounce_ms)
    }

    pub fn auth_poll_interval(&self) -> Duration {
        Duration::from_millis(self.auth_poll_ms)
    }

    pub fn volume_step_level(&self) -> f32 {
        f32::from(self.volume_step) / 100.0
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> color_eyre::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .parse()
            .wrap_err_with(|| format!("invalid {ENV_PREFIX}_{name}: {value:?}")),
        None => Ok(default),
    }
}
