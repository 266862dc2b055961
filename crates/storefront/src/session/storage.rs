//! Durable key-value slots backing the session store.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Errors from a [`SessionStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access session slot {slot}: {source}")]
    Io {
        slot: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session storage lock poisoned")]
    Poisoned,
}

/// Named string slots that survive restarts.
pub trait SessionStorage: Send + Sync {
    /// Read a slot; `Ok(None)` when it was never written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, slot: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a slot. Removing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, slot: &str) -> Result<(), StorageError>;
}

// =============================================================================
// FileStorage
// =============================================================================

/// One file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, slot: &str) -> PathBuf {
        self.dir.join(slot)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(slot)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                slot: slot.to_string(),
                source,
            }),
        }
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let io = |source| StorageError::Io {
            slot: slot.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io)?;
        std::fs::write(self.path(slot), value).map_err(io)
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path(slot)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                slot: slot.to_string(),
                source,
            }),
        }
    }
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process slots for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-populated with `slots`.
    #[must_use]
    pub fn with_slots<'a>(slots: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let slots = slots
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            slots: Mutex::new(slots),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), StorageError> {
        let mut slots = self.slots.lock().map_err(|_| StorageError::Poisoned)?;
        slots.remove(slot);
        Ok(())
    }
}
