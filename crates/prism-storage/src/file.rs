//! JSON file storage backend.
//!
//! All keys live in one JSON object. Every mutation rewrites the whole file
//! through a temporary sibling and a rename, so readers see either the old
//! or the new map, never a torn write.

use crate::{SecureStorage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

type Entries = BTreeMap<String, String>;

/// File-backed storage at a fixed path (e.g. `~/.prism/credentials.json`).
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<Entries> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => return Err(err.into()),
        };

        if content.trim().is_empty() {
            return Ok(Entries::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Encoding(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write_entries(&self, entries: &Entries) -> StorageResult<()> {
        let content = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                StorageError::Backend(format!("invalid storage path {}", self.path.display()))
            })?;
        let tmp_path = dir.join(format!(
            ".{}.tmp.{}",
            file_name,
            std::time::SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));

        let write_result = (|| -> io::Result<()> {
            let mut options = fs::OpenOptions::new();
            options.write(true).create_new(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp_path)?;
            file.write_all(&content)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        })();

        if let Err(err) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        Ok(())
    }

    fn update<F, T>(&self, mutate: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Entries) -> T,
    {
        let _guard = self.lock.lock();
        let mut entries = self.read_entries()?;
        let result = mutate(&mut entries);
        self.write_entries(&entries)?;
        Ok(result)
    }
}

impl SecureStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_entries()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        self.update(|stored| {
            for (key, value) in entries {
                stored.insert(key.to_string(), value.to_string());
            }
        })
    }

    fn delete_many(&self, keys: &[&str]) -> StorageResult<usize> {
        self.update(|entries| keys.iter().filter(|key| entries.remove(**key).is_some()).count())
    }
}
