use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating, reading or validating client configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No home directory to anchor `~/.prism` under.
    #[error("no home directory; pass --base-dir")]
    NoHome,

    #[error("cannot create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
