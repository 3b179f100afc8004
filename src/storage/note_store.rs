use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::BlobStore;
use crate::entity::{generate_id, now_timestamp, Note};
use crate::error::Result;

/// Key holding the serialized `{ "notes": [...] }` collection.
pub const NOTES_KEY: &str = "notes.app.v1";
/// Key holding the [`StoreMeta`] sidecar.
pub const META_KEY: &str = "notes.app.meta";
pub const SCHEMA_VERSION: u32 = 1;

/// Fields for a new note. Missing fields start empty.
#[derive(Debug, Default, Clone)]
pub struct NoteDraft {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Partial update payload for a note. Only `Some` fields are applied.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl NoteUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }

    /// Combine with a later update; fields set in `newer` win.
    pub fn merge(self, newer: NoteUpdate) -> NoteUpdate {
        NoteUpdate {
            title: newer.title.or(self.title),
            body: newer.body.or(self.body),
        }
    }

    /// Apply the supplied fields to `note` without touching timestamps.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(ref title) = self.title {
            note.title = title.clone();
        }
        if let Some(ref body) = self.body {
            note.body = body.clone();
        }
    }
}

/// Sidecar record written next to the collection on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMeta {
    pub updated_at: String,
    pub version: u32,
}

/// Size figures used for threshold warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub note_count: usize,
    pub blob_bytes: usize,
}

#[derive(Serialize)]
struct NotesBlob<'a> {
    notes: &'a [Note],
}

/// The note collection, persisted through a [`BlobStore`].
///
/// Every operation reads the whole collection, and every mutation writes it back
/// together with a fresh [`StoreMeta`]. Nothing is cached between calls.
pub struct NoteStore<B> {
    blobs: B,
}

impl<B: BlobStore> NoteStore<B> {
    pub fn new(blobs: B) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn into_inner(self) -> B {
        self.blobs
    }

    /// All notes, most recently updated first.
    pub fn list(&self) -> Result<Vec<Note>> {
        let mut notes = self.read_all()?;
        // Stable sort: equal timestamps keep stored order.
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    /// Look up a note by exact id.
    pub fn get(&self, id: &str) -> Result<Option<Note>> {
        Ok(self.read_all()?.into_iter().find(|n| n.id == id))
    }

    /// Create and persist a note.
    pub fn create(&mut self, draft: NoteDraft) -> Result<Note> {
        let mut notes = self.read_all()?;

        let mut note = Note::new(
            draft.title.unwrap_or_default(),
            draft.body.unwrap_or_default(),
            now_timestamp(),
        );
        while notes.iter().any(|n| n.id == note.id) {
            note.id = generate_id();
        }

        notes.push(note.clone());
        self.write_all(&notes)?;

        debug!(note_id = %note.id, "created note");
        Ok(note)
    }

    /// Merge `update` into the note with `id` and persist it.
    ///
    /// Returns `None` without writing anything when the id is unknown.
    pub fn update(&mut self, id: &str, update: NoteUpdate) -> Result<Option<Note>> {
        let mut notes = self.read_all()?;
        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            return Ok(None);
        };

        update.apply_to(note);
        let now = now_timestamp();
        if now > note.updated_at {
            note.updated_at = now;
        }
        let updated = note.clone();

        self.write_all(&notes)?;

        debug!(note_id = %id, "updated note");
        Ok(Some(updated))
    }

    /// Remove the note with `id`. Returns whether a note was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut notes = self.read_all()?;
        let before = notes.len();
        notes.retain(|n| n.id != id);

        if notes.len() == before {
            return Ok(false);
        }

        self.write_all(&notes)?;
        debug!(note_id = %id, "deleted note");
        Ok(true)
    }

    /// Read the metadata sidecar, if present and well formed.
    pub fn meta(&self) -> Result<Option<StoreMeta>> {
        let raw = self.blobs.get(META_KEY)?;
        Ok(raw.and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let raw = self.blobs.get(NOTES_KEY)?;
        let blob_bytes = raw.as_ref().map_or(0, |r| r.len());
        let note_count = raw.as_deref().map_or(0, |r| decode_notes(r).len());
        Ok(StoreStats {
            note_count,
            blob_bytes,
        })
    }

    fn read_all(&self) -> Result<Vec<Note>> {
        Ok(self
            .blobs
            .get(NOTES_KEY)?
            .map(|raw| decode_notes(&raw))
            .unwrap_or_default())
    }

    fn write_all(&mut self, notes: &[Note]) -> Result<()> {
        let data = serde_json::to_string(&NotesBlob { notes })?;
        self.blobs.set(NOTES_KEY, &data)?;

        // The collection is saved at this point; the sidecar is only informational.
        let meta = StoreMeta {
            updated_at: now_timestamp(),
            version: SCHEMA_VERSION,
        };
        if let Err(e) = self.blobs.set(META_KEY, &serde_json::to_string(&meta)?) {
            warn!(error = %e, "failed to write store metadata");
        }
        Ok(())
    }
}

/// Decode a persisted collection, degrading instead of failing.
///
/// Unparseable blobs and blobs without a `notes` array decode to nothing.
/// Records that are not valid notes (including an empty id or `createdAt` after
/// `updatedAt`), and repeats of an id already seen, are skipped.
fn decode_notes(raw: &str) -> Vec<Note> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "stored notes are not valid JSON, starting empty");
            return Vec::new();
        }
    };

    let Some(items) = value.get("notes").and_then(Value::as_array) else {
        warn!("stored notes have no notes array, starting empty");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut notes = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<Note>(item.clone()) {
            Ok(note) if !is_consistent(&note) => {
                warn!(index, note_id = %note.id, "dropping malformed note record");
            }
            Ok(note) => {
                if seen.insert(note.id.clone()) {
                    notes.push(note);
                } else {
                    warn!(note_id = %note.id, "dropping note with duplicate id");
                }
            }
            Err(e) => warn!(index, error = %e, "dropping malformed note record"),
        }
    }
    notes
}

/// A note needs an id and must not have been updated before it was created.
fn is_consistent(note: &Note) -> bool {
    if note.id.is_empty() {
        return false;
    }
    match (note.created(), note.updated()) {
        (Some(created), Some(updated)) => created <= updated,
        _ => note.created_at <= note.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotesError;
    use crate::storage::{FileBlobStore, MemoryBlobStore};
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::TempDir;

    fn memory_store() -> NoteStore<MemoryBlobStore> {
        NoteStore::new(MemoryBlobStore::new())
    }

    fn draft(title: &str) -> NoteDraft {
        NoteDraft {
            title: Some(title.to_string()),
            body: None,
        }
    }

    fn raw_note(id: &str, updated_at: &str) -> String {
        format!(
            r#"{{"id":"{id}","title":"t","body":"b","createdAt":"2025-01-01T00:00:00.000Z","updatedAt":"{updated_at}"}}"#
        )
    }

    #[test]
    fn test_list_empty_store() {
        let store = memory_store();
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.meta().unwrap(), None);
    }

    #[test]
    fn test_create_sets_defaults() {
        let mut store = memory_store();
        let note = store.create(NoteDraft::default()).unwrap();

        assert_eq!(note.title, "Untitled");
        assert_eq!(note.body, "");
        assert_eq!(note.created_at, note.updated_at);
        assert!(note.id.starts_with("note_"));
        assert_eq!(store.get(&note.id).unwrap(), Some(note));
    }

    #[test]
    fn test_create_ids_are_unique() {
        let mut store = memory_store();
        let mut ids = HashSet::new();
        for i in 0..50 {
            let note = store.create(draft(&format!("n{}", i))).unwrap();
            assert!(ids.insert(note.id));
        }
        assert_eq!(store.list().unwrap().len(), 50);
    }

    #[test]
    fn test_create_writes_meta() {
        let mut store = memory_store();
        store.create(draft("X")).unwrap();

        let meta = store.meta().unwrap().unwrap();
        assert_eq!(meta.version, 1);
        assert!(!meta.updated_at.is_empty());
    }

    #[test]
    fn test_update_merges_only_supplied_fields() {
        let mut store = memory_store();
        let original = store
            .create(NoteDraft {
                title: Some("X".to_string()),
                body: Some("old".to_string()),
            })
            .unwrap();

        sleep(Duration::from_millis(5));
        let updated = store
            .update(&original.id, NoteUpdate::body("**bold**"))
            .unwrap()
            .unwrap();

        assert_eq!(updated.title, "X");
        assert_eq!(updated.body, "**bold**");
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at > original.updated_at);

        let fetched = store.get(&original.id).unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[test]
    fn test_update_does_not_default_empty_title() {
        let mut store = memory_store();
        let note = store.create(draft("X")).unwrap();
        let updated = store
            .update(&note.id, NoteUpdate::title(""))
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "");
    }

    #[test]
    fn test_update_never_moves_updated_at_backwards() {
        let future = "2999-01-01T00:00:00.000Z";
        let mut blobs = MemoryBlobStore::new();
        blobs
            .set(NOTES_KEY, &format!(r#"{{"notes":[{}]}}"#, raw_note("a", future)))
            .unwrap();
        let mut store = NoteStore::new(blobs);

        let updated = store.update("a", NoteUpdate::title("t2")).unwrap().unwrap();
        assert_eq!(updated.updated_at, future);
        assert!(updated.created_at <= updated.updated_at);
    }

    #[test]
    fn test_update_missing_is_none_and_writes_nothing() {
        let mut store = memory_store();
        assert_eq!(store.update("nope", NoteUpdate::title("t")).unwrap(), None);
        assert_eq!(store.blobs().get(NOTES_KEY).unwrap(), None);
        assert_eq!(store.meta().unwrap(), None);
    }

    #[test]
    fn test_delete_then_get_is_none() {
        let mut store = memory_store();
        let note = store.create(draft("gone")).unwrap();

        assert!(store.delete(&note.id).unwrap());
        assert_eq!(store.get(&note.id).unwrap(), None);
        assert!(!store.delete(&note.id).unwrap());
    }

    #[test]
    fn test_delete_missing_leaves_collection_untouched() {
        let mut store = memory_store();
        store.create(draft("keep")).unwrap();
        let before = store.blobs().get(NOTES_KEY).unwrap();
        let meta_before = store.meta().unwrap();

        assert!(!store.delete("note_missing").unwrap());
        assert_eq!(store.blobs().get(NOTES_KEY).unwrap(), before);
        assert_eq!(store.meta().unwrap(), meta_before);
    }

    #[test]
    fn test_list_orders_by_updated_desc() {
        let mut store = memory_store();
        let a = store.create(draft("a")).unwrap();
        sleep(Duration::from_millis(5));
        let b = store.create(draft("b")).unwrap();
        sleep(Duration::from_millis(5));
        let c = store.create(draft("c")).unwrap();
        sleep(Duration::from_millis(5));
        store.update(&a.id, NoteUpdate::body("touched")).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a.id, c.id, b.id]);
    }

    #[test]
    fn test_list_ties_keep_stored_order() {
        let ts = "2025-01-01T00:00:00.000Z";
        let mut blobs = MemoryBlobStore::new();
        blobs
            .set(
                NOTES_KEY,
                &format!(
                    r#"{{"notes":[{},{},{}]}}"#,
                    raw_note("first", ts),
                    raw_note("second", ts),
                    raw_note("third", ts)
                ),
            )
            .unwrap();
        let store = NoteStore::new(blobs);

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_corrupt_blob_degrades_to_empty() {
        let mut blobs = MemoryBlobStore::new();
        blobs.set(NOTES_KEY, "{not json").unwrap();
        let mut store = NoteStore::new(blobs);

        assert!(store.list().unwrap().is_empty());

        // The next write replaces the corrupt blob with a valid one.
        store.create(draft("fresh")).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_blob_without_notes_array_is_empty() {
        for raw in [r#"{"notes":{"a":1}}"#, "null", "[]", r#"{"other":[]}"#] {
            let mut blobs = MemoryBlobStore::new();
            blobs.set(NOTES_KEY, raw).unwrap();
            let store = NoteStore::new(blobs);
            assert!(store.list().unwrap().is_empty(), "blob {}", raw);
        }
    }

    #[test]
    fn test_malformed_records_and_duplicates_are_dropped() {
        let ts = "2025-01-01T00:00:00.000Z";
        let mut blobs = MemoryBlobStore::new();
        blobs
            .set(
                NOTES_KEY,
                &format!(
                    r#"{{"notes":[{},{{"title":"no id"}},42,{}]}}"#,
                    raw_note("a", ts),
                    raw_note("a", "2026-01-01T00:00:00.000Z")
                ),
            )
            .unwrap();
        let store = NoteStore::new(blobs);

        let notes = store.list().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].updated_at, ts);
    }

    #[test]
    fn test_inconsistent_records_are_dropped() {
        let mut blobs = MemoryBlobStore::new();
        blobs
            .set(
                NOTES_KEY,
                &format!(
                    r#"{{"notes":[{},{},{}]}}"#,
                    raw_note("", "2025-06-01T00:00:00.000Z"),
                    raw_note("backwards", "2024-01-01T00:00:00.000Z"),
                    raw_note("ok", "2025-01-01T00:00:00.000Z")
                ),
            )
            .unwrap();
        let store = NoteStore::new(blobs);

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["ok"]);
    }

    /// Accepts everything except writes to the metadata sidecar.
    struct MetaRejectingStore(MemoryBlobStore);

    impl BlobStore for MetaRejectingStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if key == META_KEY {
                return Err(NotesError::Storage("metadata unavailable".to_string()));
            }
            self.0.set(key, value)
        }
    }

    #[test]
    fn test_metadata_write_failure_does_not_fail_mutations() {
        let mut store = NoteStore::new(MetaRejectingStore(MemoryBlobStore::new()));

        let note = store.create(draft("kept")).unwrap();
        assert_eq!(store.meta().unwrap(), None);

        let updated = store
            .update(&note.id, NoteUpdate::body("changed"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.body, "changed");
        assert_eq!(store.get(&note.id).unwrap().unwrap().body, "changed");

        assert!(store.delete(&note.id).unwrap());
        assert_eq!(store.get(&note.id).unwrap(), None);
    }

    #[test]
    fn test_persisted_format_roundtrip() {
        let mut store = memory_store();
        let note = store
            .create(NoteDraft {
                title: Some("Tricky \"quotes\" & <tags>".to_string()),
                body: Some("line1\nline2 ünïcode".to_string()),
            })
            .unwrap();

        let raw = store.blobs().get(NOTES_KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["notes"][0]["createdAt"], note.created_at.as_str());
        assert_eq!(value["notes"][0]["body"], "line1\nline2 ünïcode");

        let reopened = NoteStore::new(store.into_inner());
        assert_eq!(reopened.list().unwrap(), vec![note]);
    }

    #[test]
    fn test_reads_collection_written_by_another_client() {
        let raw = r#"{"notes":[{"id":"note_abc123","title":"From browser","body":"*hi*","createdAt":"2024-05-01T08:00:00.000Z","updatedAt":"2024-05-02T08:00:00.000Z"}]}"#;
        let mut blobs = MemoryBlobStore::new();
        blobs.set(NOTES_KEY, raw).unwrap();
        let store = NoteStore::new(blobs);

        let note = store.get("note_abc123").unwrap().unwrap();
        assert_eq!(note.title, "From browser");
        assert_eq!(note.updated_at, "2024-05-02T08:00:00.000Z");
    }

    #[test]
    fn test_quota_failure_is_reported_and_not_applied() {
        let mut store = NoteStore::new(MemoryBlobStore::with_quota(400));
        let note = store.create(draft("small")).unwrap();

        let result = store.update(&note.id, NoteUpdate::body("x".repeat(1000)));
        assert!(matches!(result, Err(NotesError::QuotaExceeded { .. })));

        let stored = store.get(&note.id).unwrap().unwrap();
        assert_eq!(stored.body, "");
    }

    #[test]
    fn test_stats() {
        let mut store = memory_store();
        assert_eq!(
            store.stats().unwrap(),
            StoreStats {
                note_count: 0,
                blob_bytes: 0
            }
        );

        store.create(draft("a")).unwrap();
        store.create(draft("b")).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.note_count, 2);
        assert_eq!(
            stats.blob_bytes,
            store.blobs().get(NOTES_KEY).unwrap().unwrap().len()
        );
    }

    #[test]
    fn test_file_backed_store_reopen() {
        let tmp = TempDir::new().unwrap();
        let mut store = NoteStore::new(FileBlobStore::new(tmp.path()));
        let note = store.create(draft("on disk")).unwrap();

        let reopened = NoteStore::new(FileBlobStore::new(tmp.path()));
        assert_eq!(reopened.get(&note.id).unwrap(), Some(note));
        assert!(tmp.path().join("notes.app.meta.json").exists());
    }

    #[test]
    fn test_update_merge_prefers_newer_fields() {
        let merged = NoteUpdate::title("a")
            .merge(NoteUpdate::body("b"))
            .merge(NoteUpdate::title("c"));
        assert_eq!(
            merged,
            NoteUpdate {
                title: Some("c".to_string()),
                body: Some("b".to_string())
            }
        );
        assert!(!merged.is_empty());
        assert!(NoteUpdate::default().is_empty());
    }
}
