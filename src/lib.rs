pub mod config;
pub mod http;
pub mod player;
pub mod util;
