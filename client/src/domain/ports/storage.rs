//! Driven port for the durable key/value blobs holding session and theme.
//!
//! The contract is deliberately synchronous: one small JSON blob per key,
//! read once at startup and rewritten on every change.

use std::collections::HashMap;
use std::sync::Mutex;

use super::define_port_error;

define_port_error! {
    /// Errors raised by storage adapters.
    pub enum StorageError {
        /// The backing medium could not be read or written.
        Io { message: String } =>
            "storage io failed: {message}",
        /// A stored blob could not be encoded or decoded.
        Serialization { message: String } =>
            "storage blob invalid: {message}",
        /// The key is not usable by the adapter.
        InvalidKey { key: String } =>
            "storage key rejected: {key}",
    }
}

/// Durable string storage keyed by name.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStorage: Send + Sync {
    /// Read the blob stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Process-local storage used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    /// Storage pre-populated with one entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::default();
        storage.lock().insert(key.into(), value.into());
        storage
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}
