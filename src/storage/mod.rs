//! Persistence for the note collection.
//!
//! [`NoteStore`] owns the collection and performs a full read-modify-write against a
//! [`BlobStore`] on every call. Blob stores are plain string-keyed media; the note
//! store never assumes anything about them beyond `get` and `set`.

mod file_store;
mod note_store;
mod sqlite_store;

use std::collections::HashMap;

pub use file_store::FileBlobStore;
pub use note_store::{NoteDraft, NoteStore, NoteUpdate, StoreMeta, StoreStats, META_KEY, NOTES_KEY, SCHEMA_VERSION};
pub use sqlite_store::SqliteBlobStore;

use crate::error::{NotesError, Result};

/// A durable string-keyed medium, in the manner of browser local storage.
pub trait BlobStore {
    /// Read the value under `key`, or `None` if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<B: BlobStore + ?Sized> BlobStore for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-memory blob store with an optional byte quota.
///
/// The quota counts key and value bytes across all entries, like the per-origin
/// limit of browser storage. A write that would exceed it is rejected and leaves
/// the previous value in place.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(limit),
        }
    }

    /// Total bytes currently held.
    pub fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(limit) = self.quota {
            let existing = self.entries.get(key).map_or(0, |v| key.len() + v.len());
            let needed = self.used_bytes() - existing + key.len() + value.len();
            if needed > limit {
                return Err(NotesError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
