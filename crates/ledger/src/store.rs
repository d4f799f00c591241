//! The ledger proper: ordered record sequence over a storage backend.

use narrate_core::types::GenerationRecord;

use crate::{LedgerError, StorageBackend};

/// Durable, newest-first sequence of generation records.
///
/// Each mutation reads the full sequence, applies the change, and
/// writes the whole sequence back. There is no isolation between
/// concurrent writers; callers that mutate from multiple tasks should
/// serialize through a single owner.
pub struct Ledger {
    backend: Box<dyn StorageBackend>,
}

impl Ledger {
    /// Create a ledger over the given backend.
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// All records, newest-first.
    ///
    /// Never fails: an absent slot, an unreadable medium, or unparsable
    /// contents all read as an empty sequence (corruption is logged,
    /// not propagated).
    pub fn list(&self) -> Vec<GenerationRecord> {
        let bytes = match self.backend.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Ledger slot unreadable; treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Ledger slot unparsable; treating as empty");
                Vec::new()
            }
        }
    }

    /// Look up a single record by task id.
    pub fn find(&self, id: &str) -> Option<GenerationRecord> {
        self.list().into_iter().find(|r| r.id == id)
    }

    /// Prepend a record (most recent submission first).
    pub fn add(&self, record: GenerationRecord) -> Result<(), LedgerError> {
        let mut records = self.list();
        records.insert(0, record);
        self.persist(&records)
    }

    /// Replace the stored record with a matching `id`, keeping its
    /// position. No-op if no record matches.
    pub fn update(&self, record: GenerationRecord) -> Result<(), LedgerError> {
        let mut records = self.list();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => *slot = record,
            None => return Ok(()),
        }
        self.persist(&records)
    }

    /// Remove the record with a matching `id`. No-op if absent.
    pub fn remove(&self, id: &str) -> Result<(), LedgerError> {
        let mut records = self.list();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Ok(());
        }
        self.persist(&records)
    }

    /// Empty the store.
    pub fn clear(&self) -> Result<(), LedgerError> {
        self.backend.delete()
    }

    fn persist(&self, records: &[GenerationRecord]) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(records)?;
        self.backend.write(&bytes)
    }
}
