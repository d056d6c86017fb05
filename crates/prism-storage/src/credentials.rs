//! Whole-record access to the persisted credential set.
//!
//! The four credential keys are only ever read or written together, under
//! one lock. A reader sees either a complete set or nothing; a partially
//! persisted set (for example after a crash between writes on a backend
//! without batch writes) reads as "not logged in".

use crate::{SecureStorage, StorageKeys, StorageResult};
use parking_lot::Mutex;
use std::fmt;

/// Access/refresh token pair issued by `/auth/login` and `/auth/refresh`.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    /// Build a pair, rejecting empty tokens.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Option<Self> {
        let access_token = access_token.into();
        let refresh_token = refresh_token.into();
        if access_token.is_empty() || refresh_token.is_empty() {
            return None;
        }
        Some(Self {
            access_token,
            refresh_token,
        })
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .finish()
    }
}

/// The complete persisted credential set.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub user_email: String,
    pub user_name: String,
}

impl Credentials {
    pub fn new(tokens: TokenPair, user_email: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user_email: user_email.into(),
            user_name: user_name.into(),
        }
    }

    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[redacted]")
            .field("refresh_token", &"[redacted]")
            .field("user_email", &self.user_email)
            .field("user_name", &self.user_name)
            .finish()
    }
}

/// Credential set persisted through a [`SecureStorage`] backend.
pub struct CredentialStore {
    storage: Box<dyn SecureStorage>,
    lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Read the credential set. `None` unless all four fields are present.
    pub fn load(&self) -> StorageResult<Option<Credentials>> {
        let _guard = self.lock.lock();
        self.load_locked()
    }

    /// Replace the whole credential set.
    pub fn save(&self, credentials: &Credentials) -> StorageResult<()> {
        let _guard = self.lock.lock();
        self.storage.set_many(&[
            (StorageKeys::ACCESS_TOKEN, credentials.access_token.as_str()),
            (StorageKeys::REFRESH_TOKEN, credentials.refresh_token.as_str()),
            (StorageKeys::USER_EMAIL, credentials.user_email.as_str()),
            (StorageKeys::USER_NAME, credentials.user_name.as_str()),
        ])?;
        tracing::debug!(user_email = %credentials.user_email, "credential set saved");
        Ok(())
    }

    /// Swap in a new token pair, keeping the stored identity.
    ///
    /// Returns `false` without writing anything when no complete set is
    /// stored, e.g. the user logged out while a refresh was in flight.
    pub fn rotate_tokens(&self, tokens: &TokenPair) -> StorageResult<bool> {
        let _guard = self.lock.lock();
        if self.load_locked()?.is_none() {
            tracing::warn!("token rotation skipped: no stored identity");
            return Ok(false);
        }
        self.storage.set_many(&[
            (StorageKeys::ACCESS_TOKEN, tokens.access_token.as_str()),
            (StorageKeys::REFRESH_TOKEN, tokens.refresh_token.as_str()),
        ])?;
        Ok(true)
    }

    /// Remove every credential key.
    pub fn clear(&self) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let removed = self.storage.delete_many(&StorageKeys::CREDENTIAL_SET)?;
        tracing::debug!(removed, "credential set cleared");
        Ok(())
    }

    pub fn access_token(&self) -> StorageResult<Option<String>> {
        Ok(self.load()?.map(|c| c.access_token))
    }

    pub fn refresh_token(&self) -> StorageResult<Option<String>> {
        Ok(self.load()?.map(|c| c.refresh_token))
    }

    /// Update the display name of the stored identity.
    /// Returns `false` when nobody is logged in.
    pub fn set_user_name(&self, user_name: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock();
        if self.load_locked()?.is_none() {
            return Ok(false);
        }
        self.storage.set(StorageKeys::USER_NAME, user_name)?;
        Ok(true)
    }

    fn load_locked(&self) -> StorageResult<Option<Credentials>> {
        let mut values = Vec::with_capacity(StorageKeys::CREDENTIAL_SET.len());
        for key in StorageKeys::CREDENTIAL_SET {
            values.push(self.storage.get(key)?.filter(|v| !v.is_empty()));
        }

        let present = values.iter().filter(|v| v.is_some()).count();
        if present == 0 {
            return Ok(None);
        }
        if present < values.len() {
            tracing::warn!(present, "partial credential set found; treating as logged out");
            return Ok(None);
        }

        let mut fields = values.into_iter().flatten();
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(access_token), Some(refresh_token), Some(user_email), Some(user_name)) => {
                Ok(Some(Credentials {
                    access_token,
                    refresh_token,
                    user_email,
                    user_name,
                }))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileStorage, MemoryStorage};
    use std::sync::Arc;

    fn sample() -> Credentials {
        Credentials::new(
            TokenPair::new("A1", "R1").unwrap(),
            "mentor@prism.dev",
            "Ada Mentor",
        )
    }

    #[test]
    fn test_token_pair_rejects_empty() {
        assert!(TokenPair::new("", "R1").is_none());
        assert!(TokenPair::new("A1", "").is_none());
        assert!(TokenPair::new("A1", "R1").is_some());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("A1"));
        assert!(!rendered.contains("R1"));
        assert!(rendered.contains("mentor@prism.dev"));
    }

    #[test]
    fn test_save_and_load() {
        let store = CredentialStore::new(Box::new(MemoryStorage::new()));
        assert!(store.load().unwrap().is_none());

        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        assert_eq!(store.access_token().unwrap(), Some("A1".to_string()));
        assert_eq!(store.refresh_token().unwrap(), Some("R1".to_string()));
    }

    #[test]
    fn test_partial_set_reads_as_logged_out() {
        let storage = MemoryStorage::new();
        storage.set(StorageKeys::ACCESS_TOKEN, "A1").unwrap();
        storage.set(StorageKeys::USER_EMAIL, "mentor@prism.dev").unwrap();
        let store = CredentialStore::new(Box::new(storage));

        assert!(store.load().unwrap().is_none());
        assert!(store.access_token().unwrap().is_none());
    }

    #[test]
    fn test_rotate_tokens_keeps_identity() {
        let store = CredentialStore::new(Box::new(MemoryStorage::new()));
        store.save(&sample()).unwrap();

        let rotated = store
            .rotate_tokens(&TokenPair::new("A2", "R2").unwrap())
            .unwrap();
        assert!(rotated);

        let creds = store.load().unwrap().unwrap();
        assert_eq!(creds.access_token, "A2");
        assert_eq!(creds.refresh_token, "R2");
        assert_eq!(creds.user_email, "mentor@prism.dev");
        assert_eq!(creds.user_name, "Ada Mentor");
    }

    #[test]
    fn test_rotate_tokens_without_identity_writes_nothing() {
        let store = CredentialStore::new(Box::new(MemoryStorage::new()));

        let rotated = store
            .rotate_tokens(&TokenPair::new("A2", "R2").unwrap())
            .unwrap();
        assert!(!rotated);
        assert!(store.load().unwrap().is_none());
        assert!(store.access_token().unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = CredentialStore::new(Box::new(FileStorage::new(&path)));
        store.save(&sample()).unwrap();

        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        let raw = FileStorage::new(&path);
        for key in StorageKeys::CREDENTIAL_SET {
            assert!(!raw.has(key).unwrap(), "{} should be cleared", key);
        }
    }

    #[test]
    fn test_set_user_name() {
        let store = CredentialStore::new(Box::new(MemoryStorage::new()));
        assert!(!store.set_user_name("Nobody").unwrap());

        store.save(&sample()).unwrap();
        assert!(store.set_user_name("Ada L.").unwrap());
        assert_eq!(store.load().unwrap().unwrap().user_name, "Ada L.");
    }

    #[test]
    fn test_concurrent_rotation_never_mixes_pairs() {
        let store = Arc::new(CredentialStore::new(Box::new(MemoryStorage::new())));
        store.save(&sample()).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for n in 2..200 {
                    let pair = TokenPair::new(format!("A{}", n), format!("R{}", n)).unwrap();
                    store.rotate_tokens(&pair).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let creds = store.load().unwrap().unwrap();
                        assert_eq!(
                            creds.access_token.trim_start_matches('A'),
                            creds.refresh_token.trim_start_matches('R')
                        );
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
