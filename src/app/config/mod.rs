pub mod api;
pub mod binds;
pub mod colors;
#[allow(clippy::module_inception)]
pub mod config;
pub mod downloads;
pub mod gallery;
pub mod logging;

pub use config::Config;
pub use logging::LoggingConfig;
