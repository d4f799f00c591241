//! Raw-bytes storage backends for the ledger slot.
//!
//! The ledger treats its persistence medium as a single opaque slot of
//! bytes. [`FileBackend`] stores the slot as one JSON file on disk;
//! [`MemoryBackend`] keeps it in memory for tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::LedgerError;

/// A single named slot of raw bytes.
///
/// `read` distinguishes "slot absent" (`Ok(None)`) from an unreadable
/// medium (`Err`); the ledger treats both, plus unparsable contents,
/// as an empty sequence.
pub trait StorageBackend: Send + Sync {
    /// Read the slot's current contents, or `None` if it was never
    /// written (or was cleared).
    fn read(&self) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Replace the slot's contents.
    fn write(&self, bytes: &[u8]) -> Result<(), LedgerError>;

    /// Remove the slot entirely. No-op if it does not exist.
    fn delete(&self) -> Result<(), LedgerError>;
}

// ---------------------------------------------------------------------------
// File backend
// ---------------------------------------------------------------------------

/// Stores the slot as a single file on disk.
///
/// Writes go through a sibling temp file followed by a rename, so a
/// crash mid-write leaves the previous contents intact.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend storing the slot at `path`. The parent
    /// directory must exist before the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StorageBackend for FileBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, LedgerError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<(), LedgerError> {
        let tmp = self.tmp_path();
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn delete(&self) -> Result<(), LedgerError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Keeps the slot in memory. Used by tests and as a scratch ledger.
#[derive(Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load the slot with arbitrary bytes (e.g. corrupt data for
    /// recovery tests).
    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            slot: Mutex::new(Some(bytes.into())),
        }
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<(), LedgerError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes.to_vec());
        Ok(())
    }

    fn delete(&self) -> Result<(), LedgerError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
