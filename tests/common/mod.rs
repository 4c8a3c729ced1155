#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use tunelane::config::PlayerConfig;
use tunelane::player::{
    PlaybackController, PlayerError, Track,
    auth::SessionFlag,
    events::PlayerEvent,
    media_session::MediaMetadata,
    output::SimulatedOutput,
    snapshot::MemorySessionStore,
    traits::{MediaSession, SongLookup},
    track::SongDetails,
};

pub fn url_for(id: &str) -> String {
    format!("https://cdn.test/{id}.mp3")
}

pub fn track(id: &str) -> Track {
    Track::new(id, format!("Song {id}")).with_artist(format!("artist-{id}"), format!("Artist {id}"))
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}

fn details(id: &str, url: Option<String>) -> SongDetails {
    SongDetails {
        id: id.to_string(),
        title: format!("Song {id}"),
        url,
        duration: Some(180),
        thumbnail_url: Some(format!("https://cdn.test/{id}.jpg")),
        artists: vec![],
    }
}

/// Answers immediately. Unknown ids fail, ids registered without a URL
/// come back with `url: null`.
#[derive(Default)]
pub struct StaticLookup {
    urls: HashMap<String, Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl StaticLookup {
    pub fn with(ids: &[&str]) -> Self {
        Self {
            urls: ids.iter().map(|id| (id.to_string(), Some(url_for(id)))).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_url(mut self, id: &str) -> Self {
        self.urls.insert(id.to_string(), None);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == id).count()
    }
}

#[async_trait]
impl SongLookup for StaticLookup {
    async fn lookup(&self, track_id: &str) -> Result<SongDetails, PlayerError> {
        self.calls.lock().unwrap().push(track_id.to_string());
        match self.urls.get(track_id) {
            Some(url) => Ok(details(track_id, url.clone())),
            None => Err(PlayerError::resolution(track_id, "404 Not Found")),
        }
    }
}

type Reply = Result<SongDetails, PlayerError>;

/// Holds every lookup until the test releases it, so responses can be
/// delivered in any order.
#[derive(Default)]
pub struct GatedLookup {
    senders: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
    receivers: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
    started: Mutex<Vec<String>>,
}

impl GatedLookup {
    pub fn new(ids: &[&str]) -> Self {
        let lookup = Self::default();
        for id in ids {
            let (tx, rx) = oneshot::channel();
            lookup.senders.lock().unwrap().insert(id.to_string(), tx);
            lookup.receivers.lock().unwrap().insert(id.to_string(), rx);
        }
        lookup
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn release(&self, id: &str) {
        let tx = self.senders.lock().unwrap().remove(id).expect("unknown gate");
        let _ = tx.send(Ok(details(id, Some(url_for(id)))));
    }

    pub fn fail(&self, id: &str) {
        let tx = self.senders.lock().unwrap().remove(id).expect("unknown gate");
        let _ = tx.send(Err(PlayerError::resolution(id, "connection reset")));
    }
}

#[async_trait]
impl SongLookup for GatedLookup {
    async fn lookup(&self, track_id: &str) -> Result<SongDetails, PlayerError> {
        self.started.lock().unwrap().push(track_id.to_string());
        let rx = self.receivers.lock().unwrap().remove(track_id);
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(PlayerError::resolution(track_id, "gate dropped"))),
            None => Err(PlayerError::resolution(track_id, "no gate")),
        }
    }
}

#[derive(Default)]
pub struct RecordingMediaSession {
    published: Mutex<Vec<(MediaMetadata, Vec<String>)>>,
    cleared: Mutex<usize>,
}

impl RecordingMediaSession {
    pub fn published(&self) -> Vec<(MediaMetadata, Vec<String>)> {
        self.published.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> usize {
        *self.cleared.lock().unwrap()
    }
}

impl MediaSession for RecordingMediaSession {
    fn publish(&self, metadata: &MediaMetadata, actions: &[&str]) -> Result<(), PlayerError> {
        self.published.lock().unwrap().push((
            metadata.clone(),
            actions.iter().map(|a| a.to_string()).collect(),
        ));
        Ok(())
    }

    fn clear(&self) {
        *self.cleared.lock().unwrap() += 1;
    }
}

pub struct Harness<L> {
    pub controller: PlaybackController,
    pub output: SimulatedOutput,
    pub lookup: Arc<L>,
    pub session: SessionFlag,
    pub store: MemorySessionStore,
    pub media: Arc<RecordingMediaSession>,
    pub events: flume::Receiver<PlayerEvent>,
}

impl<L: SongLookup + 'static> Harness<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_config(lookup, PlayerConfig::default())
    }

    pub fn with_config(lookup: L, config: PlayerConfig) -> Self {
        let output = SimulatedOutput::new();
        let lookup = Arc::new(lookup);
        let session = SessionFlag::new(true);
        let store = MemorySessionStore::new();
        let media = Arc::new(RecordingMediaSession::default());
        let (event_tx, events) = flume::unbounded();

        let controller = PlaybackController::builder(config, Arc::new(output.clone()), lookup.clone())
            .auth_signal(Arc::new(session.clone()))
            .session_store(Arc::new(store.clone()))
            .media_session(media.clone())
            .events(event_tx)
            .build();

        Self {
            controller,
            output,
            lookup,
            session,
            store,
            media,
            events,
        }
    }

    pub fn drain_events(&self) -> Vec<PlayerEvent> {
        self.events.try_iter().collect()
    }
}

/// Yields until `condition` holds. Spawned tasks only make progress
/// while the test task is parked.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}
