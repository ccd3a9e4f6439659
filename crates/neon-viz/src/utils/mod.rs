mod audio_info;
mod config;
mod config_watch;
mod logging;

pub use audio_info::log_audio_info;
pub use config::Config;
pub use config_watch::{ConfigWatcher, LiveChange};
pub use logging::init as init_logging;
