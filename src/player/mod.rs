pub mod auth;
pub mod commands;
pub mod controller;
pub mod error;
pub mod events;
pub mod liked;
pub mod media_session;
pub mod output;
pub mod progress;
pub mod queue;
pub mod snapshot;
pub mod state;
pub mod track;
pub mod traits;
pub mod volume;

pub use controller::{PlaybackController, PlaybackControllerBuilder};
pub use error::PlayerError;
pub use state::{PlaybackState, PlaybackStatus};
pub use track::Track;
