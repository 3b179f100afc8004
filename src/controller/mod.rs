//! Application controller: selection, list refresh and debounced autosave.
//!
//! The controller sits between a front end and the [`NoteStore`]. Edits are held
//! in a single pending autosave that is written once the user pauses for
//! [`AUTOSAVE_DELAY`], and is force-flushed before anything that changes context
//! (selecting or creating a note, deleting another note, closing).

mod debounce;

pub use debounce::Debouncer;

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::entity::Note;
use crate::error::Result;
use crate::markdown::render_markdown;
use crate::search::{search_notes, sort_notes, SortBy};
use crate::storage::{BlobStore, NoteDraft, NoteStore, NoteUpdate};

/// Quiet period before an edit is persisted.
pub const AUTOSAVE_DELAY: Duration = Duration::from_millis(400);

/// An edit waiting for the autosave quiet period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub note_id: String,
    pub update: NoteUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Editing,
    Failed,
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveStatus::Saved => write!(f, "Saved"),
            SaveStatus::Editing => write!(f, "Editing…"),
            SaveStatus::Failed => write!(f, "Not saved"),
        }
    }
}

pub struct Controller<B: BlobStore> {
    store: NoteStore<B>,
    config: BackendConfig,
    notes: Vec<Note>,
    selected: Option<String>,
    query: String,
    sort_by: SortBy,
    autosave: Debouncer<PendingEdit>,
    status: SaveStatus,
    notice: Option<String>,
}

impl<B: BlobStore> Controller<B> {
    /// Load the list and select the most recently updated note.
    pub fn new(store: NoteStore<B>, config: BackendConfig) -> Self {
        if config.using_backend() {
            debug!(
                endpoint = config.endpoint().unwrap_or_default(),
                "backend configured, notes stay in local storage"
            );
        }
        let mut controller = Self {
            store,
            config,
            notes: Vec::new(),
            selected: None,
            query: String::new(),
            sort_by: SortBy::default(),
            autosave: Debouncer::new(AUTOSAVE_DELAY),
            status: SaveStatus::Saved,
            notice: None,
        };
        controller.refresh();
        controller
    }

    pub fn store(&self) -> &NoteStore<B> {
        &self.store
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn using_backend(&self) -> bool {
        self.config.using_backend()
    }

    /// Every note, in store order (most recently updated first).
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Notes matching the current query, in the current sort order.
    pub fn visible_notes(&self) -> Vec<Note> {
        let mut visible = search_notes(&self.query, self.notes.clone());
        sort_notes(&mut visible, self.sort_by);
        visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn set_sort(&mut self, sort_by: SortBy) {
        self.sort_by = sort_by;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected note as last persisted.
    pub fn selected_note(&self) -> Option<&Note> {
        let id = self.selected.as_deref()?;
        self.notes.iter().find(|n| n.id == id)
    }

    /// The selected note with any unsaved edit applied.
    pub fn draft(&self) -> Option<Note> {
        let mut note = self.selected_note()?.clone();
        if let Some(pending) = self.autosave.pending() {
            if pending.note_id == note.id {
                pending.update.apply_to(&mut note);
            }
        }
        Some(note)
    }

    /// HTML preview of the draft body.
    pub fn preview(&self) -> String {
        render_markdown(self.draft().as_ref().map_or("", |n| n.body.as_str()))
    }

    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.autosave.pending()
    }

    /// When the pending edit becomes due, if there is one.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.status
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Take the notice so it is shown only once.
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// Select the note with `id`, saving any pending edit first.
    /// Returns false if no such note exists; the selection is then unchanged.
    pub fn select(&mut self, id: &str) -> bool {
        self.flush();
        if self.notes.iter().any(|n| n.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Create an untitled note and select it.
    pub fn new_note(&mut self) -> Option<Note> {
        self.flush();
        let draft = NoteDraft {
            title: Some(crate::entity::UNTITLED.to_string()),
            body: Some(String::new()),
        };
        match self.store.create(draft) {
            Ok(note) => {
                self.refresh();
                self.selected = Some(note.id.clone());
                Some(note)
            }
            Err(e) => {
                self.report(format!("Failed to create note: {}", e));
                None
            }
        }
    }

    /// Record an edit to the selected note and restart the autosave period.
    pub fn edit(&mut self, update: NoteUpdate, now: Instant) {
        if update.is_empty() {
            return;
        }
        let Some(id) = self.selected.clone() else {
            return;
        };

        let update = match self.autosave.flush() {
            Some(pending) if pending.note_id == id => pending.update.merge(update),
            Some(other) => {
                self.persist(other);
                update
            }
            None => update,
        };
        self.autosave.schedule(PendingEdit { note_id: id, update }, now);
        self.status = SaveStatus::Editing;
    }

    /// Persist the pending edit if its quiet period is over.
    /// Returns whether an edit was saved.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.autosave.take_due(now) {
            Some(pending) => self.persist(pending),
            None => false,
        }
    }

    /// Persist the pending edit now. Returns whether an edit was saved.
    pub fn flush(&mut self) -> bool {
        match self.autosave.flush() {
            Some(pending) => self.persist(pending),
            None => false,
        }
    }

    /// Delete a note. A pending edit to that note is discarded; any other pending
    /// edit is saved first. Returns whether a note was removed.
    pub fn delete(&mut self, id: &str) -> bool {
        match self.autosave.pending() {
            Some(pending) if pending.note_id == id => {
                self.autosave.cancel();
                self.status = SaveStatus::Saved;
            }
            Some(_) => {
                self.flush();
            }
            None => {}
        }

        match self.store.delete(id) {
            Ok(removed) => {
                self.refresh();
                removed
            }
            Err(e) => {
                self.report(format!("Failed to delete note: {}", e));
                false
            }
        }
    }

    /// Re-read the list and keep the selection pointing at an existing note.
    pub fn refresh(&mut self) {
        match self.store.list() {
            Ok(notes) => self.notes = notes,
            Err(e) => self.report(format!("Failed to load notes: {}", e)),
        }

        let selection_valid = self
            .selected
            .as_deref()
            .is_some_and(|id| self.notes.iter().any(|n| n.id == id));
        if !selection_valid {
            self.selected = self.notes.first().map(|n| n.id.clone());
        }
    }

    /// Save any pending edit and report whether that worked.
    pub fn close(mut self) -> Result<()> {
        if let Some(pending) = self.autosave.flush() {
            self.store.update(&pending.note_id, pending.update)?;
        }
        Ok(())
    }

    fn persist(&mut self, pending: PendingEdit) -> bool {
        match self.store.update(&pending.note_id, pending.update) {
            Ok(saved) => {
                if saved.is_none() {
                    debug!(note_id = %pending.note_id, "note removed before autosave");
                }
                self.status = SaveStatus::Saved;
                self.refresh();
                saved.is_some()
            }
            Err(e) => {
                self.report(format!("Failed to save note: {}", e));
                false
            }
        }
    }

    fn report(&mut self, message: String) {
        warn!("{}", message);
        self.notice = Some(message);
        self.status = SaveStatus::Failed;
    }
}

impl<B: BlobStore> Drop for Controller<B> {
    fn drop(&mut self) {
        if let Some(pending) = self.autosave.flush() {
            if let Err(e) = self.store.update(&pending.note_id, pending.update) {
                warn!(note_id = %pending.note_id, error = %e, "unsaved edit lost on close");
            }
        }
    }
}
