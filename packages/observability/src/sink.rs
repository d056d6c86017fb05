//! The shared log file and subscriber assembly.
//!
//! Several `prism` processes may log at once, so the file is opened in
//! append mode and every write lands as one whole line.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn default_log_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
    [".prism", "logs", "prism.jsonl"]
        .iter()
        .fold(home, |path, part| path.join(part))
}

/// Cloneable handle to an append-only log file.
#[derive(Clone)]
pub struct CentralLogWriter {
    file: Arc<Mutex<File>>,
}

impl CentralLogWriter {
    /// Open `path` for appending, creating parent directories first.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }
}

impl Write for CentralLogWriter {
    /// Unbuffered; the lock covers the whole slice.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.lock().flush()
    }
}

/// Hands a [`CentralLogWriter`] clone to each event.
#[derive(Clone)]
pub struct WriterFactory(CentralLogWriter);

impl WriterFactory {
    pub fn new(writer: CentralLogWriter) -> Self {
        Self(writer)
    }
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = CentralLogWriter;

    fn make_writer(&'a self) -> CentralLogWriter {
        self.0.clone()
    }
}

fn level_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// JSONL to the log file, compact text to stderr when asked.
///
/// An unwritable log file downgrades to stderr-only rather than failing.
pub(crate) fn init_subscriber(config: &LogConfig) {
    let path = config.file.clone().unwrap_or_else(default_log_path);

    let file_layer = CentralLogWriter::new(&path)
        .map(|writer| {
            JsonLayer::new(config.service.clone(), WriterFactory::new(writer))
                .with_filter(level_filter(&config.level))
        })
        .map_err(|e| eprintln!("prism: logging to stderr only, cannot open {}: {e}", path.display()))
        .ok();
    let to_file = file_layer.is_some();

    let stderr_layer = (config.stderr || !to_file).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_filter(level_filter(&config.level))
    });

    // Keep whichever subscriber got there first.
    if tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok()
        && to_file
    {
        tracing::debug!(path = %path.display(), service = %config.service, "log sink ready");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("logs").join("prism.jsonl");

        CentralLogWriter::new(&path)
            .unwrap()
            .write_all(b"{\"message\":\"hello\"}\n")
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"message\":\"hello\"}\n");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prism.jsonl");

        for line in ["one\n", "two\n"] {
            CentralLogWriter::new(&path)
                .unwrap()
                .write_all(line.as_bytes())
                .unwrap();
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_factory_writers_share_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.jsonl");
        let factory = WriterFactory::new(CentralLogWriter::new(&path).unwrap());

        factory.make_writer().write_all(b"a\n").unwrap();
        factory.make_writer().write_all(b"b\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }

    #[test]
    fn test_default_path() {
        assert!(default_log_path().ends_with(".prism/logs/prism.jsonl"));
    }
}
