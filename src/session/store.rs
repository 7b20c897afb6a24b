use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Durable slot holding the current backend session id.
///
/// Read-then-write, last writer wins; only one recording is active per
/// client so no locking is done across calls.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, session_id: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SlotFile {
    current_session_id: Option<String>,
}

/// Session slot persisted as a small JSON file
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, slot: &SlotFile) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_vec_pretty(slot).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        std::fs::write(&self.path, json).map_err(write_err)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let slot: SlotFile = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        Ok(slot.current_session_id.filter(|id| !id.is_empty()))
    }

    fn save(&self, session_id: &str) -> Result<(), StoreError> {
        debug!("Persisting session id {} to {:?}", session_id, self.path);
        self.write(&SlotFile {
            current_session_id: Some(session_id.to_string()),
        })
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Process-local slot, for tests and when no data directory exists
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(session_id.into())),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(crate::sync::lock(&self.slot).clone())
    }

    fn save(&self, session_id: &str) -> Result<(), StoreError> {
        *crate::sync::lock(&self.slot) = Some(session_id.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *crate::sync::lock(&self.slot) = None;
        Ok(())
    }
}
