//! Structured logging for the PRISM client.
//!
//! A binary calls [`install`] once at startup and then logs with the plain
//! `tracing` macros. Each event lands as one JSON object per line in the log
//! file (`~/.prism/logs/prism.jsonl` unless overridden). A compact copy can
//! be mirrored to stderr.
//!
//! Field values whose names look like credentials are replaced with
//! [`REDACTED`] before anything is written.
//!
//! ```rust,ignore
//! observability::install(
//!     observability::LogConfig::new("prism-cli")
//!         .with_level("debug")
//!         .mirror_to_stderr(true),
//! );
//! tracing::info!("ready");
//! ```

mod json_layer;
mod sink;

use std::path::PathBuf;

pub use json_layer::{is_sensitive_field, LogEntry, REDACTED};
pub use sink::{CentralLogWriter, WriterFactory};

/// Where and how much a process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Stamped on every line as `service`.
    pub service: String,
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// `None` means the shared PRISM log file.
    pub file: Option<PathBuf>,
    pub stderr: bool,
}

impl LogConfig {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            level: "info".to_string(),
            file: None,
            stderr: false,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn mirror_to_stderr(mut self, enabled: bool) -> Self {
        self.stderr = enabled;
        self
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn install(config: LogConfig) {
    sink::init_subscriber(&config);
}
