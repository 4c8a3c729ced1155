use arc_swap::ArcSwap;
use flume::Sender;
use std::sync::{
    Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError, Weak,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

use crate::config::PlayerConfig;
use crate::player::{
    commands::PlayerCommand,
    error::PlayerError,
    events::{OutputEvent, PlayerEvent, TransportAction},
    liked::LikedSongs,
    media_session::{MediaMetadata, NoMediaSession},
    progress::TrackProgress,
    queue::PlayQueue,
    snapshot::{MemorySessionStore, TrackSnapshot},
    state::{PlaybackState, PlaybackStatus},
    traits::{AudioOutput, AuthSignal, MediaSession, SessionStore, SongLookup},
    track::{Track, TrackId},
    volume::Volume,
};
use crate::util::task::TaskSlots;

const SEEK_TASK: &str = "seek";
const AUTH_TASK: &str = "auth";

/// Where a track lands in the queue once it is bound. Nothing is
/// written to the queue before that.
#[derive(Debug, Clone)]
enum QueueSlot {
    Ensure,
    At(usize),
    Replace(Vec<Track>, usize),
}

struct Core {
    status: PlaybackStatus,
    settled_status: PlaybackStatus,
    current: Option<Track>,
    queue: PlayQueue,
    progress: TrackProgress,
    volume: Volume,
    liked: LikedSongs,
    authenticated: bool,
    last_error: Option<PlayerError>,
    pending: Option<(u64, TrackId)>,
}

impl Core {
    fn to_state(&self) -> PlaybackState {
        PlaybackState {
            status: self.status,
            current_track: self.current.clone(),
            queue: self.queue.tracks().to_vec(),
            queue_index: self.queue.current_index(),
            position: self.progress.position(),
            drag_position: self.progress.drag_position(),
            duration: self.progress.duration(),
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            current_liked: self
                .current
                .as_ref()
                .is_some_and(|t| self.liked.contains(&t.id)),
            is_authenticated: self.authenticated,
            last_error: self.last_error.clone(),
        }
    }

    fn is_bound_to(&self, id: &str) -> bool {
        self.current.as_ref().is_some_and(|t| t.id == id)
    }

    /// Status to fall back to if the request about to start is dropped.
    fn settle_before_loading(&mut self) {
        if self.pending.is_none() {
            self.settled_status = match self.status {
                PlaybackStatus::Loading => PlaybackStatus::Playing,
                status => status,
            };
        }
    }

    fn fallback_status(&self) -> PlaybackStatus {
        if self.current.is_none() {
            PlaybackStatus::Idle
        } else if self.settled_status == PlaybackStatus::Idle {
            PlaybackStatus::Paused
        } else {
            self.settled_status
        }
    }
}

struct Shared {
    config: PlayerConfig,
    output: Arc<dyn AudioOutput>,
    lookup: Arc<dyn SongLookup>,
    media_session: Arc<dyn MediaSession>,
    store: Arc<dyn SessionStore>,
    auth: Option<Arc<dyn AuthSignal>>,
    event_tx: Sender<PlayerEvent>,
    core: Mutex<Core>,
    generation: AtomicU64,
    snapshot: ArcSwap<PlaybackState>,
    tasks: StdMutex<TaskSlots>,
}

pub struct PlaybackControllerBuilder {
    config: PlayerConfig,
    output: Arc<dyn AudioOutput>,
    lookup: Arc<dyn SongLookup>,
    media_session: Arc<dyn MediaSession>,
    store: Arc<dyn SessionStore>,
    auth: Option<Arc<dyn AuthSignal>>,
    authenticated: bool,
    event_tx: Option<Sender<PlayerEvent>>,
}

impl PlaybackControllerBuilder {
    pub fn media_session(mut self, media_session: Arc<dyn MediaSession>) -> Self {
        self.media_session = media_session;
        self
    }

    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Source of truth for the login state, polled before every command.
    pub fn auth_signal(mut self, auth: Arc<dyn AuthSignal>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Initial login state when no signal is attached.
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    pub fn events(mut self, event_tx: Sender<PlayerEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn build(self) -> PlaybackController {
        let authenticated = match &self.auth {
            Some(auth) => auth.is_authenticated(),
            None => self.authenticated,
        };
        let volume = Volume::from_percent(self.config.volume);
        self.output.set_volume(volume.gain());

        let core = Core {
            status: PlaybackStatus::Idle,
            settled_status: PlaybackStatus::Idle,
            current: None,
            queue: PlayQueue::new(),
            progress: TrackProgress::new(),
            volume,
            liked: LikedSongs::new(),
            authenticated,
            last_error: None,
            pending: None,
        };
        let snapshot = ArcSwap::from_pointee(core.to_state());
        let event_tx = self.event_tx.unwrap_or_else(|| flume::unbounded().0);

        PlaybackController {
            shared: Arc::new(Shared {
                config: self.config,
                output: self.output,
                lookup: self.lookup,
                media_session: self.media_session,
                store: self.store,
                auth: self.auth,
                event_tx,
                core: Mutex::new(core),
                generation: AtomicU64::new(0),
                snapshot,
                tasks: StdMutex::new(TaskSlots::new()),
            }),
        }
    }
}

/// Single authority over what is playing, what is queued and where
/// playback stands. Cheap to clone; clones drive the same player.
///
/// Every mutating command is silently ignored while unauthenticated.
/// Each request that ends in binding or resuming the output takes a new
/// generation number; a completion whose number is no longer the latest
/// is dropped, so the most recent command always wins.
#[derive(Clone)]
pub struct PlaybackController {
    shared: Arc<Shared>,
}

impl PlaybackController {
    pub fn builder(
        config: PlayerConfig,
        output: Arc<dyn AudioOutput>,
        lookup: Arc<dyn SongLookup>,
    ) -> PlaybackControllerBuilder {
        PlaybackControllerBuilder {
            config,
            output,
            lookup,
            media_session: Arc::new(NoMediaSession),
            store: Arc::new(MemorySessionStore::new()),
            auth: None,
            authenticated: true,
            event_tx: None,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.shared.config
    }

    pub fn snapshot(&self) -> Arc<PlaybackState> {
        self.shared.snapshot.load_full()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.shared.snapshot.load().current_track.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.shared.snapshot.load().is_playing()
    }

    pub fn displayed_position(&self) -> Duration {
        self.shared.snapshot.load().displayed_position()
    }

    pub async fn handle_command(&self, cmd: PlayerCommand) -> Result<(), PlayerError> {
        match cmd {
            PlayerCommand::Play(track) => self.play(track).await,
            PlayerCommand::PlayList(tracks) => self.play_list(tracks).await,
            PlayerCommand::PlayListFrom(tracks, start) => self.play_list_from(tracks, start).await,
            PlayerCommand::PlayAtIndex(index) => self.play_at_index(index).await,
            PlayerCommand::Pause => self.pause().await,
            PlayerCommand::Resume => self.resume().await,
            PlayerCommand::TogglePlay => self.toggle_play().await,
            PlayerCommand::Next => self.play_next_song().await,
            PlayerCommand::Previous => self.play_previous_song().await,
            PlayerCommand::SeekTo(position) => self.seek_to(position).await,
            PlayerCommand::SeekForward => self.seek_forward().await,
            PlayerCommand::SeekBackward => self.seek_backward().await,
            PlayerCommand::SeekStart => self.handle_seek_start().await,
            PlayerCommand::SeekEnd => self.handle_seek_end().await,
            PlayerCommand::SetVolume(volume) => self.set_volume(volume).await,
            PlayerCommand::VolumeUp => self.volume_up().await,
            PlayerCommand::VolumeDown => self.volume_down().await,
            PlayerCommand::Mute => self.mute().await,
            PlayerCommand::Unmute => self.unmute().await,
            PlayerCommand::ToggleMute => self.toggle_mute().await,
            PlayerCommand::QueueTrack(track) => self.queue_track(track).await,
            PlayerCommand::PlayTrackNext(track) => self.play_track_next(track).await,
            PlayerCommand::RemoveFromQueue(index) => self.remove_from_queue(index).await,
            PlayerCommand::ClearQueue => self.clear_queue().await,
            PlayerCommand::ToggleLike(id) => self.toggle_like(&id).await,
        }
    }

    pub async fn play(&self, track: Track) -> Result<(), PlayerError> {
        self.play_request(track, QueueSlot::Ensure).await
    }

    /// Replaces the queue with `tracks` and plays the first entry.
    pub async fn play_list(&self, tracks: Vec<Track>) -> Result<(), PlayerError> {
        self.play_list_from(tracks, 0).await
    }

    /// The queue is only replaced once `tracks[start]` is bound; a failed
    /// lookup leaves the old queue in place.
    pub async fn play_list_from(&self, tracks: Vec<Track>, start: usize) -> Result<(), PlayerError> {
        let Some(track) = tracks.get(start).cloned() else {
            debug!(len = tracks.len(), start, "player_play_list_ignored");
            return Ok(());
        };
        self.play_request(track, QueueSlot::Replace(tracks, start)).await
    }

    pub async fn play_at_index(&self, index: usize) -> Result<(), PlayerError> {
        let track = {
            let Some(core) = self.authorized().await else {
                return Ok(());
            };
            match core.queue.get(index) {
                Some(track) => track.clone(),
                None => return Ok(()),
            }
        };
        self.play_request(track, QueueSlot::At(index)).await
    }

    pub async fn play_next_song(&self) -> Result<(), PlayerError> {
        let (index, track) = {
            let Some(core) = self.authorized().await else {
                return Ok(());
            };
            match core.queue.next_index() {
                Some(index) => (index, core.queue.get(index).cloned()),
                None => return Ok(()),
            }
        };
        match track {
            Some(track) => self.play_request(track, QueueSlot::At(index)).await,
            None => Ok(()),
        }
    }

    /// Steps back one entry, or restarts the current track at the head
    /// of the queue.
    pub async fn play_previous_song(&self) -> Result<(), PlayerError> {
        let (index, track) = {
            let Some(mut core) = self.authorized().await else {
                return Ok(());
            };
            match core.queue.previous_index() {
                Some(index) => (index, core.queue.get(index).cloned()),
                None => {
                    if core.current.is_some() {
                        self.abort_task(SEEK_TASK);
                        core.progress.rewind();
                        self.shared.output.seek(Duration::ZERO);
                        self.emit(PlayerEvent::Seeked(Duration::ZERO));
                        self.publish(&core);
                    }
                    return Ok(());
                }
            }
        };
        match track {
            Some(track) => self.play_request(track, QueueSlot::At(index)).await,
            None => Ok(()),
        }
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        self.cancel_pending(&mut core);

        if core.current.is_none() {
            core.status = PlaybackStatus::Idle;
        } else if core.status != PlaybackStatus::Paused {
            self.shared.output.pause();
            core.status = PlaybackStatus::Paused;
            self.emit(PlayerEvent::Paused);
        }
        self.publish(&core);
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), PlayerError> {
        let (request, track) = {
            let Some(mut core) = self.authorized().await else {
                return Ok(());
            };
            if core.pending.is_some() || core.status == PlaybackStatus::Playing {
                return Ok(());
            }
            let Some(track) = core.current.clone() else {
                return Ok(());
            };
            let request = self.next_request();
            core.settle_before_loading();
            core.pending = Some((request, track.id.clone()));
            core.status = PlaybackStatus::Loading;
            self.publish(&core);
            (request, track)
        };

        let played = self.shared.output.play().await;

        let mut core = self.shared.core.lock().await;
        if !self.is_latest(request) {
            self.settle_stale_play(&core, played.is_ok());
            return Ok(());
        }
        core.pending = None;
        match played {
            Ok(()) => {
                core.status = PlaybackStatus::Playing;
                core.last_error = None;
                self.publish(&core);
                drop(core);
                self.publish_media_session(&track);
                self.emit(PlayerEvent::Resumed);
                Ok(())
            }
            Err(error) => {
                warn!(id = track.id.as_str(), error = %error, "player_resume_failed");
                core.status = PlaybackStatus::Paused;
                core.last_error = Some(error.clone());
                self.publish(&core);
                Err(error)
            }
        }
    }

    pub async fn toggle_play(&self) -> Result<(), PlayerError> {
        if self.is_playing() {
            self.pause().await
        } else {
            self.resume().await
        }
    }

    /// Seeks the bound track. During a drag only the shadow position moves;
    /// otherwise the committed position changes at once and the output
    /// seek is debounced.
    pub async fn seek_to(&self, position: Duration) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        if core.current.is_none() {
            return Ok(());
        }
        let position = core.progress.clamp(position);
        if core.progress.update_drag(position) {
            self.publish(&core);
            return Ok(());
        }
        core.progress.commit_deferred(position);
        self.publish(&core);
        drop(core);

        self.schedule_seek(position);
        Ok(())
    }

    pub async fn seek_forward(&self) -> Result<(), PlayerError> {
        let target = self.displayed_position() + self.shared.config.seek_step();
        self.seek_to(target).await
    }

    pub async fn seek_backward(&self) -> Result<(), PlayerError> {
        let target = self
            .displayed_position()
            .saturating_sub(self.shared.config.seek_step());
        self.seek_to(target).await
    }

    pub async fn handle_seek_start(&self) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        if core.current.is_some() {
            core.progress.begin_drag();
            self.publish(&core);
        }
        Ok(())
    }

    /// Commits the shadow position to the output and to state together.
    pub async fn handle_seek_end(&self) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        if let Some(position) = core.progress.end_drag() {
            self.abort_task(SEEK_TASK);
            self.shared.output.seek(position);
            self.publish(&core);
            self.emit(PlayerEvent::Seeked(position));
        }
        Ok(())
    }

    pub async fn set_volume(&self, volume: f32) -> Result<(), PlayerError> {
        self.update_volume(|v| v.set_level(volume)).await
    }

    pub async fn volume_up(&self) -> Result<(), PlayerError> {
        let step = self.shared.config.volume_step_level();
        self.update_volume(|v| v.step_up(step)).await
    }

    pub async fn volume_down(&self) -> Result<(), PlayerError> {
        let step = self.shared.config.volume_step_level();
        self.update_volume(|v| v.step_down(step)).await
    }

    pub async fn mute(&self) -> Result<(), PlayerError> {
        self.update_volume(|v| v.set_muted(true)).await
    }

    pub async fn unmute(&self) -> Result<(), PlayerError> {
        self.update_volume(|v| v.set_muted(false)).await
    }

    pub async fn toggle_mute(&self) -> Result<(), PlayerError> {
        self.update_volume(Volume::toggle_mute).await
    }

    /// Appends without touching playback.
    pub async fn queue_track(&self, track: Track) -> Result<(), PlayerError> {
        self.update_queue(|queue| queue.push(track)).await
    }

    pub async fn play_track_next(&self, track: Track) -> Result<(), PlayerError> {
        self.update_queue(|queue| queue.insert_next(track)).await
    }

    pub async fn remove_from_queue(&self, index: usize) -> Result<(), PlayerError> {
        self.update_queue(|queue| {
            queue.remove(index);
        })
        .await
    }

    /// Drops every queued entry except the one under the cursor.
    pub async fn clear_queue(&self) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        if core.current.is_some() {
            core.queue.retain_current();
        } else {
            core.queue.clear();
        }
        self.emit(PlayerEvent::QueueChanged(core.queue.len()));
        self.publish(&core);
        Ok(())
    }

    /// Seeds the favourites, typically from the account's liked list.
    pub async fn set_liked_songs(&self, ids: Vec<TrackId>) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        core.liked.replace_all(ids);
        debug!(count = core.liked.len(), "player_liked_songs_loaded");
        self.publish(&core);
        Ok(())
    }

    pub async fn toggle_like(&self, id: &str) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        let liked = core.liked.toggle(id);
        self.publish(&core);
        self.emit(PlayerEvent::LikeChanged(id.to_string(), liked));
        Ok(())
    }

    pub async fn is_liked(&self, id: &str) -> bool {
        self.shared.core.lock().await.liked.contains(id)
    }

    pub async fn handle_output_event(&self, event: OutputEvent) -> Result<(), PlayerError> {
        let mut core = self.shared.core.lock().await;
        if !core.authenticated || core.current.is_none() {
            return Ok(());
        }

        match event {
            OutputEvent::TimeUpdate(position) => {
                if core.progress.mirror(position) {
                    self.publish(&core);
                }
            }
            OutputEvent::DurationChange(duration) => {
                core.progress.set_duration(Some(duration));
                self.publish(&core);
            }
            OutputEvent::Waiting => {
                if core.pending.is_none() && core.status == PlaybackStatus::Playing {
                    core.status = PlaybackStatus::Loading;
                    self.publish(&core);
                }
            }
            OutputEvent::Playing => {
                if core.pending.is_none() && core.status == PlaybackStatus::Loading {
                    core.status = PlaybackStatus::Playing;
                    self.publish(&core);
                }
            }
            OutputEvent::Ended => {
                if core.pending.is_some() {
                    return Ok(());
                }
                let finished = core.current.as_ref().map(|t| t.id.clone());
                self.abort_task(SEEK_TASK);
                core.progress.rewind();
                core.status = PlaybackStatus::Paused;
                self.shared.output.seek(Duration::ZERO);
                self.publish(&core);
                if let Some(id) = finished {
                    info!(id = id.as_str(), "player_track_ended");
                    self.emit(PlayerEvent::TrackEnded(id));
                }

                let advance = self.shared.config.auto_advance && core.queue.next_index().is_some();
                drop(core);
                if advance {
                    return self.play_next_song().await;
                }
            }
        }
        Ok(())
    }

    pub async fn handle_transport_action(&self, action: TransportAction) -> Result<(), PlayerError> {
        debug!(action = ?action, "player_transport_action");
        match action {
            TransportAction::Play => self.resume().await,
            TransportAction::Pause => self.pause().await,
            TransportAction::SeekTo(position) => self.seek_to(position).await,
        }
    }

    /// Explicit login-state notification. Losing the session hard-resets
    /// the player. With an attached signal, the signal still wins on the
    /// next poll.
    pub async fn set_authenticated(&self, authenticated: bool) {
        let mut core = self.shared.core.lock().await;
        self.apply_auth(&mut core, authenticated);
        self.publish(&core);
    }

    /// Polls the attached signal once. Returns the observed state.
    pub async fn refresh_auth(&self) -> bool {
        let mut core = self.shared.core.lock().await;
        let observed = self.observed_auth(&core);
        self.apply_auth(&mut core, observed);
        self.publish(&core);
        observed
    }

    /// Polls the attached signal on the configured interval until the
    /// controller is dropped. Returns `false` when there is no signal.
    pub fn spawn_auth_monitor(&self) -> bool {
        if self.shared.auth.is_none() {
            return false;
        }
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let interval = self.shared.config.auth_poll_interval();

        self.tasks().spawn(AUTH_TASK, async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                PlaybackController { shared }.refresh_auth().await;
            }
        });
        true
    }

    /// Stops output and forgets the track, the queue, the favourites and
    /// the persisted snapshot. The volume preference survives.
    pub async fn hard_reset(&self) {
        let mut core = self.shared.core.lock().await;
        self.reset_locked(&mut core);
        self.publish(&core);
    }

    /// Rebinds the track saved by a previous run of this session, paused
    /// at zero. Returns whether anything was restored.
    pub async fn restore_snapshot(&self) -> Result<bool, PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(false);
        };
        if core.current.is_some() || core.pending.is_some() {
            return Ok(false);
        }
        let Some(snapshot) = self.shared.store.load()? else {
            return Ok(false);
        };
        self.shared.output.load(&snapshot.url)?;
        info!(id = snapshot.id.as_str(), "player_snapshot_restored");

        let track = Track::from(snapshot);
        core.queue.replace(vec![track.clone()]);
        core.progress.reset();
        core.progress
            .set_duration(track.duration_seconds.map(|s| Duration::from_secs(s.into())));
        core.current = Some(track);
        core.settled_status = PlaybackStatus::Paused;
        core.status = PlaybackStatus::Paused;
        self.publish(&core);
        Ok(true)
    }

    async fn play_request(&self, track: Track, slot: QueueSlot) -> Result<(), PlayerError> {
        let request = {
            let Some(mut core) = self.authorized().await else {
                return Ok(());
            };

            let replaces_queue = matches!(slot, QueueSlot::Replace(..));
            if !replaces_queue && core.pending.as_ref().is_some_and(|(_, id)| *id == track.id) {
                return Ok(());
            }

            if core.is_bound_to(&track.id) {
                self.cancel_pending(&mut core);
                match slot {
                    QueueSlot::Replace(tracks, start) => {
                        core.queue.replace(tracks);
                        core.queue.select(start);
                        self.emit(PlayerEvent::QueueChanged(core.queue.len()));
                    }
                    QueueSlot::At(index) if core.queue.get(index).is_some_and(|t| t.id == track.id) => {
                        core.queue.select(index);
                    }
                    _ => {}
                }
                let paused = core.status != PlaybackStatus::Playing;
                self.publish(&core);
                drop(core);
                return if paused { self.resume().await } else { Ok(()) };
            }

            let request = self.next_request();
            core.settle_before_loading();
            core.pending = Some((request, track.id.clone()));
            core.status = PlaybackStatus::Loading;
            core.last_error = None;
            self.publish(&core);
            request
        };

        let resolved = match track.playable_url.as_deref() {
            Some(url) if !url.is_empty() => Ok(track.clone()),
            _ => self.resolve(&track).await,
        };

        let (resolved, index) = {
            let mut core = self.shared.core.lock().await;
            let resolved = match resolved {
                Ok(resolved) => resolved,
                Err(error) => {
                    warn!(id = track.id.as_str(), error = %error, "player_resolution_failed");
                    self.fail_request(&mut core, request, &track.id, error.clone());
                    return Err(error);
                }
            };
            let url = resolved.playable_url.clone().unwrap_or_default();
            core.queue.upgrade_url(&resolved.id, &url);

            if !self.is_latest(request) {
                debug!(id = resolved.id.as_str(), request, "player_stale_resolution_dropped");
                self.publish(&core);
                return Ok(());
            }

            if let Err(error) = self.shared.output.load(&url) {
                warn!(id = resolved.id.as_str(), error = %error, "player_output_load_failed");
                self.fail_request(&mut core, request, &resolved.id, error.clone());
                return Err(error);
            }

            let index = match slot {
                QueueSlot::Replace(tracks, start) => {
                    core.queue.replace(tracks);
                    core.queue.upgrade_url(&resolved.id, &url);
                    self.emit(PlayerEvent::QueueChanged(core.queue.len()));
                    start
                }
                QueueSlot::At(index) if core.queue.get(index).is_some_and(|t| t.id == resolved.id) => {
                    index
                }
                _ => core.queue.ensure(&resolved),
            };
            core.queue.select(index);
            core.current = Some(resolved.clone());
            core.settled_status = PlaybackStatus::Paused;
            self.abort_task(SEEK_TASK);
            core.progress.reset();
            core.progress
                .set_duration(resolved.duration_seconds.map(|s| Duration::from_secs(s.into())));
            self.publish(&core);
            self.persist(&resolved);
            (resolved, index)
        };

        let played = self.shared.output.play().await;

        let mut core = self.shared.core.lock().await;
        if !self.is_latest(request) {
            self.settle_stale_play(&core, played.is_ok());
            return Ok(());
        }
        core.pending = None;
        match played {
            Ok(()) => {
                core.status = PlaybackStatus::Playing;
                self.publish(&core);
                drop(core);
                info!(id = resolved.id.as_str(), index, "player_track_started");
                self.publish_media_session(&resolved);
                self.emit(PlayerEvent::TrackStarted(resolved, index));
                Ok(())
            }
            Err(error) => {
                warn!(id = resolved.id.as_str(), error = %error, "player_output_play_failed");
                core.status = PlaybackStatus::Paused;
                core.last_error = Some(error.clone());
                self.publish(&core);
                Err(error)
            }
        }
    }

    async fn resolve(&self, track: &Track) -> Result<Track, PlayerError> {
        debug!(id = track.id.as_str(), "player_resolving");
        let details = self.shared.lookup.lookup(&track.id).await?;
        let url = details
            .url
            .clone()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PlayerError::MissingUrl(track.id.clone()))?;
        Ok(track.resolved_with(&details, url))
    }

    fn fail_request(&self, core: &mut Core, request: u64, track_id: &str, error: PlayerError) {
        if !self.is_latest(request) {
            return;
        }
        core.pending = None;
        core.status = core.fallback_status();
        core.last_error = Some(error.clone());
        self.publish(core);
        self.emit(PlayerEvent::ResolutionFailed(track_id.to_string(), error));
    }

    /// A superseded play finished anyway. If nothing newer wants sound,
    /// silence the output again.
    fn settle_stale_play(&self, core: &Core, started: bool) {
        if started && !matches!(core.status, PlaybackStatus::Playing | PlaybackStatus::Loading) {
            self.shared.output.pause();
        }
    }

    fn cancel_pending(&self, core: &mut Core) {
        if let Some((request, id)) = core.pending.take() {
            self.next_request();
            core.status = core.fallback_status();
            debug!(id = id.as_str(), request, "player_request_superseded");
        }
    }

    async fn authorized(&self) -> Option<MutexGuard<'_, Core>> {
        let mut core = self.shared.core.lock().await;
        let observed = self.observed_auth(&core);
        if observed != core.authenticated {
            self.apply_auth(&mut core, observed);
            self.publish(&core);
        }
        if observed {
            Some(core)
        } else {
            trace!("player_command_ignored_unauthenticated");
            None
        }
    }

    fn observed_auth(&self, core: &Core) -> bool {
        match &self.shared.auth {
            Some(auth) => auth.is_authenticated(),
            None => core.authenticated,
        }
    }

    fn apply_auth(&self, core: &mut Core, authenticated: bool) {
        if core.authenticated && !authenticated {
            self.reset_locked(core);
        }
        core.authenticated = authenticated;
    }

    fn reset_locked(&self, core: &mut Core) {
        self.next_request();
        self.abort_task(SEEK_TASK);
        self.shared.output.stop();

        core.pending = None;
        core.current = None;
        core.queue.clear();
        core.liked.clear();
        core.progress.reset();
        core.status = PlaybackStatus::Idle;
        core.settled_status = PlaybackStatus::Idle;
        core.last_error = None;

        if let Err(e) = self.shared.store.clear() {
            warn!(error = %e, "player_snapshot_clear_failed");
        }
        self.shared.media_session.clear();
        info!("player_session_reset");
        self.emit(PlayerEvent::SessionReset);
    }

    async fn update_volume(&self, change: impl FnOnce(&mut Volume)) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        change(&mut core.volume);
        self.shared.output.set_volume(core.volume.gain());
        self.emit(PlayerEvent::VolumeChanged {
            volume: core.volume.level(),
            muted: core.volume.is_muted(),
        });
        self.publish(&core);
        Ok(())
    }

    async fn update_queue(&self, change: impl FnOnce(&mut PlayQueue)) -> Result<(), PlayerError> {
        let Some(mut core) = self.authorized().await else {
            return Ok(());
        };
        change(&mut core.queue);
        self.emit(PlayerEvent::QueueChanged(core.queue.len()));
        self.publish(&core);
        Ok(())
    }

    fn schedule_seek(&self, position: Duration) {
        let this = self.clone();
        let debounce = self.shared.config.seek_debounce();
        self.tasks().spawn(SEEK_TASK, async move {
            tokio::time::sleep(debounce).await;
            this.apply_seek(position).await;
        });
    }

    async fn apply_seek(&self, position: Duration) {
        let mut core = self.shared.core.lock().await;
        if core.progress.pending_seek() != Some(position) {
            return;
        }
        self.shared.output.seek(position);
        core.progress.seek_applied(position);
        self.publish(&core);
        self.emit(PlayerEvent::Seeked(position));
    }

    fn persist(&self, track: &Track) {
        let Some(snapshot) = TrackSnapshot::of(track) else {
            return;
        };
        if let Err(e) = self.shared.store.save(&snapshot) {
            warn!(id = track.id.as_str(), error = %e, "player_snapshot_save_failed");
        }
    }

    fn publish_media_session(&self, track: &Track) {
        let metadata = MediaMetadata::for_track(track, &self.shared.config.placeholder_thumbnail);
        match self
            .shared
            .media_session
            .publish(&metadata, &TransportAction::SUPPORTED)
        {
            Ok(()) => debug!(id = track.id.as_str(), "player_media_session_published"),
            Err(PlayerError::CapabilityAbsent) => trace!("player_media_session_absent"),
            Err(e) => debug!(error = %e, "player_media_session_failed"),
        }
    }

    fn next_request(&self) -> u64 {
        self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(&self, request: u64) -> bool {
        self.shared.generation.load(Ordering::SeqCst) == request
    }

    fn publish(&self, core: &Core) {
        self.shared.snapshot.store(Arc::new(core.to_state()));
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.shared.event_tx.send(event);
    }

    fn tasks(&self) -> StdMutexGuard<'_, TaskSlots> {
        self.shared
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn abort_task(&self, key: &'static str) {
        self.tasks().abort(key);
    }
}
