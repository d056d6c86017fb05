//! Where the PRISM session lives between runs.
//!
//! [`CredentialStore`] reads and writes the access token, refresh token,
//! email and display name as one record on top of any [`SecureStorage`]
//! backend: [`FileStorage`] (one owner-only JSON file) in the CLI,
//! [`MemoryStorage`] in tests.

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::{CredentialStore, Credentials, TokenPair};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SecureStorage;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// The backend is unusable, e.g. a storage path with no parent.
    #[error("credential storage unavailable: {0}")]
    Backend(String),

    /// The stored document is not the expected JSON map.
    #[error("credential file is corrupt: {0}")]
    Encoding(String),

    #[error("credential storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;
