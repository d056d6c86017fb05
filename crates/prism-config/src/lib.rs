//! Configuration, on-disk paths and logging setup for the PRISM client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_API_URL, DEFAULT_LOG_LEVEL};
pub use error::{ConfigError, ConfigResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
