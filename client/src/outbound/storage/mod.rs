//! File-backed key/value storage.
//!
//! Each key maps to `{key}.json` inside one directory opened through
//! `cap_std`, so the adapter cannot reach outside it. Writes go to a hidden
//! temporary file that is then renamed over the target, so readers never
//! observe a partially written blob.

mod atomic;

use std::io;
use std::path::Path;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::domain::ports::{KeyValueStorage, StorageError};

/// Storage adapter keeping one JSON file per key.
#[derive(Debug)]
pub struct JsonFileStorage {
    dir: Dir,
}

impl JsonFileStorage {
    /// Open `path`, creating it (and its parents) when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] when the directory cannot be created or
    /// opened.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(path, ambient_authority()))
            .map(|dir| Self { dir })
            .map_err(|err| {
                StorageError::io(format!("failed to open {}: {err}", path.display()))
            })
    }

    fn file_name(key: &str) -> Result<String, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(StorageError::invalid_key(key));
        }
        Ok(format!("{key}.json"))
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let name = Self::file_name(key)?;
        match self.dir.read_to_string(&name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::io(format!("failed to read {name}: {err}"))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let name = Self::file_name(key)?;
        atomic::write_atomic(&self.dir, &name, value)
            .map_err(|err| StorageError::io(format!("failed to write {name}: {err}")))?;
        debug!(key, "storage blob written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let name = Self::file_name(key)?;
        match self.dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(format!("failed to remove {name}: {err}"))),
        }
    }
}
