use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::player::{error::PlayerError, events::OutputEvent, traits::AudioOutput};

#[derive(Debug, Default)]
struct OutputInner {
    loaded_url: Option<String>,
    playing: bool,
    position: Duration,
    duration: Option<Duration>,
    gain: f32,
    loads: Vec<String>,
    seeks: Vec<Duration>,
    play_calls: usize,
    fail_plays: usize,
}

/// Headless output with a virtual clock.
///
/// Records every call so hosts without a real audio device (and tests)
/// can observe what the controller asked for. `advance` moves the clock
/// and yields the event a real element would have fired.
#[derive(Debug, Clone, Default)]
pub struct SimulatedOutput {
    inner: Arc<Mutex<OutputInner>>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, OutputInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn loaded_url(&self) -> Option<String> {
        self.lock().loaded_url.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn position(&self) -> Duration {
        self.lock().position
    }

    pub fn gain(&self) -> f32 {
        self.lock().gain
    }

    pub fn loads(&self) -> Vec<String> {
        self.lock().loads.clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.lock().seeks.clone()
    }

    pub fn play_calls(&self) -> usize {
        self.lock().play_calls
    }

    pub fn set_duration(&self, duration: Duration) {
        self.lock().duration = Some(duration);
    }

    /// Makes the next `count` play attempts fail.
    pub fn fail_next_plays(&self, count: usize) {
        self.lock().fail_plays = count;
    }

    pub fn advance(&self, delta: Duration) -> Option<OutputEvent> {
        let mut inner = self.lock();
        if !inner.playing {
            return None;
        }
        inner.position += delta;
        if let Some(total) = inner.duration
            && inner.position >= total
        {
            inner.position = total;
            inner.playing = false;
            return Some(OutputEvent::Ended);
        }
        Some(OutputEvent::TimeUpdate(inner.position))
    }
}

#[async_trait]
impl AudioOutput for SimulatedOutput {
    fn load(&self, url: &str) -> Result<(), PlayerError> {
        if url.is_empty() {
            return Err(PlayerError::Output("empty source url".into()));
        }
        let mut inner = self.lock();
        inner.loaded_url = Some(url.to_string());
        inner.loads.push(url.to_string());
        inner.playing = false;
        inner.position = Duration::ZERO;
        inner.duration = None;
        Ok(())
    }

    async fn play(&self) -> Result<(), PlayerError> {
        let mut inner = self.lock();
        inner.play_calls += 1;
        if inner.fail_plays > 0 {
            inner.fail_plays -= 1;
            return Err(PlayerError::Output("playback rejected".into()));
        }
        if inner.loaded_url.is_none() {
            return Err(PlayerError::Output("no source loaded".into()));
        }
        inner.playing = true;
        Ok(())
    }

    fn pause(&self) {
        self.lock().playing = false;
    }

    fn stop(&self) {
        let mut inner = self.lock();
        inner.playing = false;
        inner.loaded_url = None;
        inner.position = Duration::ZERO;
    }

    fn seek(&self, position: Duration) {
        let mut inner = self.lock();
        inner.position = position;
        inner.seeks.push(position);
    }

    fn set_volume(&self, gain: f32) {
        self.lock().gain = gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clock_runs_only_while_playing() {
        let output = SimulatedOutput::new();
        assert_eq!(output.advance(Duration::from_secs(1)), None);

        output.load("https://cdn/a.mp3").unwrap();
        output.set_duration(Duration::from_secs(3));
        output.play().await.unwrap();

        assert_eq!(
            output.advance(Duration::from_secs(2)),
            Some(OutputEvent::TimeUpdate(Duration::from_secs(2)))
        );
        assert_eq!(
            output.advance(Duration::from_secs(2)),
            Some(OutputEvent::Ended)
        );
        assert!(!output.is_playing());
    }

    #[tokio::test]
    async fn play_without_source_fails() {
        let output = SimulatedOutput::new();
        assert!(output.play().await.is_err());
        assert_eq!(output.play_calls(), 1);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed() {
        let output = SimulatedOutput::new();
        output.load("u").unwrap();
        output.fail_next_plays(1);
        assert!(output.play().await.is_err());
        assert!(output.play().await.is_ok());
    }
}
