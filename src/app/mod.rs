pub mod config;
pub mod logging;

pub use config::{AppConfig, DispatcherSettings, FlashcardDefaults, LoggingConfig};
pub use logging::init_logging;
