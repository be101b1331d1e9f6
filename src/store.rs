// Notes store: canonical collection, derived view, best-effort persistence

use crate::adapter::PersistenceAdapter;
use crate::filter::{SearchTerm, SortOrder, filter_and_sort};
use crate::models::{self, Note};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Time source used to stamp notes
pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Which persistence call last failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceOp {
    Load,
    Save,
}

impl std::fmt::Display for PersistenceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceOp::Load => write!(f, "load"),
            PersistenceOp::Save => write!(f, "save"),
        }
    }
}

/// Outcome of the most recent persistence call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PersistenceHealth {
    #[default]
    Healthy,
    Degraded { operation: PersistenceOp, message: String },
}

impl PersistenceHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, PersistenceHealth::Healthy)
    }
}

/// Owner of the note collection
///
/// Every mutation updates the in-memory collection first, then recomputes
/// the filtered/sorted view, then hands the full collection to the adapter.
/// Persistence failures are logged and recorded in [`PersistenceHealth`];
/// they never undo a mutation and never reach the caller.
pub struct NotesStore<A: PersistenceAdapter> {
    adapter: A,
    notes: Vec<Note>,
    search_term: SearchTerm,
    sort_order: SortOrder,
    view: Vec<usize>,
    health: PersistenceHealth,
    clock: Clock,
}

impl<A: PersistenceAdapter> NotesStore<A> {
    /// Create a store and load whatever the adapter has persisted
    ///
    /// Load failures leave the store empty. Construction never saves.
    pub fn open(adapter: A) -> Self {
        Self::with_clock(adapter, Box::new(models::now))
    }

    /// Like [`NotesStore::open`], stamping notes with `clock` instead of the system time
    pub fn with_clock(adapter: A, clock: Clock) -> Self {
        let mut store = Self {
            adapter,
            notes: Vec::new(),
            search_term: SearchTerm::default(),
            sort_order: SortOrder::default(),
            view: Vec::new(),
            health: PersistenceHealth::Healthy,
            clock,
        };

        store.load_initial();
        store.recompute();
        store
    }

    fn load_initial(&mut self) {
        match self.adapter.load() {
            Ok(Some(notes)) => {
                self.notes = sanitize(notes);
                info!(count = self.notes.len(), "Loaded notes");
            }
            Ok(None) => {
                debug!("No persisted notes, starting empty");
            }
            Err(e) => {
                error!(error = ?e, "Failed to load notes, starting empty");
                self.health = PersistenceHealth::Degraded {
                    operation: PersistenceOp::Load,
                    message: format!("{:#}", e),
                };
            }
        }
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Create a note and append it to the collection
    pub fn create(&mut self, title: impl Into<String>, content: impl Into<String>) -> Note {
        let note = Note::new(models::new_note_id(), title.into(), content.into(), (self.clock)());
        debug!(id = note.id(), "Creating note");

        self.notes.push(note.clone());
        self.commit();

        note
    }

    /// Replace title and content of an existing note
    ///
    /// Returns `None`, without touching the collection, when no note has `id`.
    pub fn update(&mut self, id: &str, title: impl Into<String>, content: impl Into<String>) -> Option<Note> {
        let now = (self.clock)();
        let note = self.notes.iter_mut().find(|n| n.id() == id)?;

        note.revise(title.into(), content.into(), now);
        let updated = note.clone();
        debug!(id, "Updated note");

        self.commit();
        Some(updated)
    }

    /// Remove the note with `id`, returning it if it existed
    ///
    /// Persists only when something was removed.
    pub fn delete(&mut self, id: &str) -> Option<Note> {
        let index = self.notes.iter().position(|n| n.id() == id)?;
        let removed = self.notes.remove(index);
        debug!(id, "Deleted note");

        self.commit();
        Some(removed)
    }

    /// Look up a note by id
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id() == id)
    }

    /// Canonical collection in insertion order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Number of notes in the canonical collection, regardless of the search term
    pub fn count(&self) -> usize {
        self.notes.len()
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = SearchTerm::new(term);
        self.recompute();
    }

    pub fn search_term(&self) -> &str {
        self.search_term.as_str()
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
        self.recompute();
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Notes matching the search term, in the active sort order
    pub fn filtered_and_sorted(&self) -> Vec<&Note> {
        self.view.iter().map(|&i| &self.notes[i]).collect()
    }

    /// Outcome of the last persistence call
    pub fn health(&self) -> &PersistenceHealth {
        &self.health
    }

    /// Give back the adapter, dropping the in-memory state
    pub fn into_adapter(self) -> A {
        self.adapter
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn recompute(&mut self) {
        self.view = filter_and_sort(&self.notes, &self.search_term, self.sort_order);
    }

    fn commit(&mut self) {
        self.recompute();
        self.persist();
    }

    fn persist(&mut self) {
        match self.adapter.save(&self.notes) {
            Ok(()) => {
                self.health = PersistenceHealth::Healthy;
            }
            Err(e) => {
                error!(error = ?e, count = self.notes.len(), "Failed to save notes");
                self.health = PersistenceHealth::Degraded {
                    operation: PersistenceOp::Save,
                    message: format!("{:#}", e),
                };
            }
        }
    }
}

/// Drop duplicate ids (first wins) and repair inverted timestamps
fn sanitize(notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(notes.len());

    for mut note in notes {
        if !seen.insert(note.id().to_string()) {
            warn!(id = note.id(), "Dropping note with duplicate id");
            continue;
        }
        if note.repair_timestamps() {
            warn!(id = note.id(), "Note updated before it was created, clamping updatedAt");
        }
        kept.push(note);
    }

    kept
}
