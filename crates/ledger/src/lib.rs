//! Durable, ordered store of generation records.
//!
//! [`Ledger`] keeps the newest-first sequence of
//! [`GenerationRecord`](narrate_core::types::GenerationRecord) entries
//! in a single slot of an injected [`StorageBackend`]. Corrupt or
//! absent persisted data reads as an empty ledger rather than an
//! error, so a bad slot never takes the application down.

pub mod backend;
mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use store::Ledger;

/// Errors from the persistence layer.
///
/// Only mutations surface these; reads recover silently (a corrupt
/// slot is logged and treated as empty).
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The backing medium could not be read or written.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The in-memory sequence could not be serialized for persistence.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
