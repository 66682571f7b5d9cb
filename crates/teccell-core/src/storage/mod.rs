//! Key/value persistence for the credential record.
//!
//! The access controller only ever talks to a [`CredentialStore`]; which
//! backend sits behind it is decided when the application is composed:
//!
//! - `MemoryStore`: in-process map, used by tests and as a fallback
//! - `FileStore`: a JSON object file in the data directory
//! - `KeyringStore`: one OS keychain entry per key

pub mod file;
pub mod keychain;
pub mod memory;

use std::path::Path;

use tracing::debug;

use crate::config::StoreBackend;
use crate::error::StoreError;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

/// Device-local key/value persistence.
///
/// There is exactly one writer, so implementations need no locking; the last
/// write wins.
pub trait CredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Build the backend selected in the configuration.
pub fn open_store(
    backend: StoreBackend,
    data_dir: &Path,
) -> Result<Box<dyn CredentialStore>, StoreError> {
    debug!(?backend, ?data_dir, "Opening credential store");
    match backend {
        StoreBackend::File => Ok(Box::new(FileStore::open(data_dir)?)),
        StoreBackend::Keyring => Ok(Box::new(KeyringStore::new())),
        StoreBackend::Memory => Ok(Box::new(MemoryStore::new())),
    }
}
