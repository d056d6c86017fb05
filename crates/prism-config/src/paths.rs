//! On-disk layout under `~/.prism`.
//!
//! ```text
//! ~/.prism/
//! ├── config.json
//! ├── credentials.json
//! └── logs/prism.jsonl
//! ```

use crate::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

const DIR_NAME: &str = ".prism";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// The layout rooted in the user's home directory.
    pub fn new() -> ConfigResult<Self> {
        dirs::home_dir()
            .map(|home| Self::with_base_dir(home.join(DIR_NAME)))
            .ok_or(ConfigError::NoHome)
    }

    pub fn with_base_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    /// Token set and user identity, see `prism_storage::FileStorage`.
    pub fn credentials_file(&self) -> PathBuf {
        self.root.join("credentials.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("prism.jsonl")
    }

    /// Create the root and log directories if missing.
    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        for dir in [self.root.clone(), self.logs_dir()] {
            std::fs::create_dir_all(&dir)
                .map_err(|source| ConfigError::CreateDir { path: dir, source })?;
        }
        Ok(())
    }
}
