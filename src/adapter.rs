// Persistence adapter contract and an in-memory implementation

use crate::codec;
use crate::models::Note;
use eyre::Result;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Durable storage for the note collection
///
/// The store hands the full collection to `save` after every mutation and
/// calls `load` once when it is constructed. Errors are reported to the
/// store, which logs them and carries on with its in-memory state.
pub trait PersistenceAdapter {
    /// Return the last saved collection, or `None` if nothing was ever saved
    fn load(&mut self) -> Result<Option<Vec<Note>>>;

    /// Persist the full collection, replacing whatever was stored before
    fn save(&mut self, notes: &[Note]) -> Result<()>;
}

impl<A: PersistenceAdapter + ?Sized> PersistenceAdapter for Box<A> {
    fn load(&mut self) -> Result<Option<Vec<Note>>> {
        (**self).load()
    }

    fn save(&mut self, notes: &[Note]) -> Result<()> {
        (**self).save(notes)
    }
}

/// A single serialized slot held in memory, like one key of a browser's local storage
///
/// Clones share the same slot, so a caller can keep a handle to seed or
/// inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an adapter whose slot already holds `data`
    pub fn with_contents(data: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(data.into()))),
        }
    }

    /// Raw serialized contents of the slot
    pub fn contents(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Overwrite the raw slot contents
    pub fn set_contents(&self, data: impl Into<String>) {
        *self.lock() = Some(data.into());
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistenceAdapter for MemoryAdapter {
    fn load(&mut self) -> Result<Option<Vec<Note>>> {
        match self.contents() {
            Some(data) => Ok(Some(codec::decode_notes(&data)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, notes: &[Note]) -> Result<()> {
        let data = codec::encode_notes(notes)?;
        debug!(count = notes.len(), bytes = data.len(), "Saving notes to memory slot");
        self.set_contents(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::note_at;

    #[test]
    fn test_empty_slot_loads_none() {
        let mut adapter = MemoryAdapter::new();
        assert!(adapter.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let mut adapter = MemoryAdapter::new();
        let notes = vec![note_at("a", "One", 1_000), note_at("b", "Two", 2_000)];

        adapter.save(&notes).unwrap();
        assert!(adapter.contents().unwrap().contains("\"title\":\"One\""));

        let loaded = adapter.load().unwrap().unwrap();
        assert_eq!(loaded, notes);
    }

    #[test]
    fn test_clones_share_slot() {
        let handle = MemoryAdapter::new();
        let mut adapter = handle.clone();

        adapter.save(&[note_at("a", "Shared", 1)]).unwrap();
        assert!(handle.contents().is_some());

        handle.clear();
        assert!(adapter.load().unwrap().is_none());
    }

    #[test]
    fn test_malformed_slot_is_an_error() {
        let mut adapter = MemoryAdapter::with_contents("invalid json data");
        assert!(adapter.load().is_err());
    }

    #[test]
    fn test_boxed_adapter_delegates() {
        let handle = MemoryAdapter::new();
        let mut boxed: Box<dyn PersistenceAdapter> = Box::new(handle.clone());

        boxed.save(&[note_at("a", "Boxed", 1)]).unwrap();
        assert_eq!(boxed.load().unwrap().unwrap().len(), 1);
        assert!(handle.contents().is_some());
    }
}
