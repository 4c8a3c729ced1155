use std::sync::Arc;
use std::time::Duration;

use tunelane::{
    config::PlayerConfig,
    http::ApiService,
    player::{
        PlaybackController, Track,
        auth::SessionFlag,
        events::{OutputEvent, PlayerEvent},
        output::SimulatedOutput,
        snapshot::FileSessionStore,
    },
    util::{
        hook::set_panic_hook,
        log::{get_data_dir, initialize_logging},
    },
};

const TICK: Duration = Duration::from_millis(250);

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> color_eyre::Result<()> {
    setup()?;

    let track_ids: Vec<String> = std::env::args().skip(1).collect();
    if track_ids.is_empty() {
        eprintln!("usage: {} <track-id>...", env!("CARGO_PKG_NAME"));
        return Ok(());
    }

    let config = PlayerConfig::from_env()?;
    run(config, track_ids).await
}

fn setup() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();
    set_panic_hook();
    initialize_logging()
}

async fn run(config: PlayerConfig, track_ids: Vec<String>) -> color_eyre::Result<()> {
    let api = Arc::new(ApiService::new(&config)?);
    let output = SimulatedOutput::new();
    let session = SessionFlag::new(true);
    let store = FileSessionStore::new(get_data_dir().join("now-playing.json"));
    let (event_tx, event_rx) = flume::unbounded();

    let controller = PlaybackController::builder(config.clone(), Arc::new(output.clone()), api)
        .session_store(Arc::new(store))
        .auth_signal(Arc::new(session.clone()))
        .events(event_tx)
        .build();
    controller.spawn_auth_monitor();

    let tracks: Vec<Track> = track_ids
        .into_iter()
        .map(|id| Track::new(id.clone(), id))
        .collect();
    if let Err(e) = controller.play_list(tracks).await {
        eprintln!("{e}");
    }

    let mut ticker = tokio::time::interval(TICK);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(event) = output.advance(TICK)
                    && let Err(e) = controller.handle_output_event(event).await
                {
                    eprintln!("{e}");
                }
            }
            event = event_rx.recv_async() => {
                let Ok(event) = event else { break };
                match event {
                    PlayerEvent::TrackStarted(track, index) => {
                        println!("▶ [{index}] {} - {}", track.artist_line(), track.title);
                        if let Some(seconds) = track.duration_seconds {
                            let duration = Duration::from_secs(seconds.into());
                            output.set_duration(duration);
                            controller
                                .handle_output_event(OutputEvent::DurationChange(duration))
                                .await?;
                        }
                    }
                    PlayerEvent::ResolutionFailed(id, error) => {
                        println!("✗ {id}: {error}");
                    }
                    PlayerEvent::TrackEnded(id) => {
                        println!("■ {id}");
                        let state = controller.snapshot();
                        if !config.auto_advance || state.queue_index + 1 >= state.queue.len() {
                            break;
                        }
                    }
                    _ => {}
                }
                if controller.snapshot().status == tunelane::player::PlaybackStatus::Idle {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.pause().await?;
    Ok(())
}
