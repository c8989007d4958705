//! Journal: the ordered, durably-backed entry collection.
//!
//! # Responsibility
//! - Own the only in-memory entry collection and its cursor.
//! - Route every mutation through exactly one `EntryStore`.
//!
//! # Invariants
//! - Entries are kept in non-decreasing calendar date order; ties keep
//!   insertion order.
//! - The cursor is `Empty` iff the collection is empty, otherwise in range.
//! - All access goes through one async mutex: mutations are serialized and a
//!   reader observes either pre- or post-mutation state, never a torn one.
//! - Backend calls run on the blocking pool, never on a runtime thread.
//! - A failed backend call leaves the in-memory state untouched.

use crate::model::cursor::Cursor;
use crate::model::entry::{Entry, EntryDraft, EntryId, EntryValidationError};
use crate::repo::entry_store::{EntryStore, StoreError, StoreResult};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex as StoreLock};
use std::time::Instant;
use tokio::sync::Mutex;

pub type JournalResult<T> = Result<T, JournalError>;

/// Errors from journal operations.
#[derive(Debug)]
pub enum JournalError {
    /// Backend read/write failure.
    Storage(StoreError),
    /// Draft rejected before persistence.
    Validation(EntryValidationError),
    /// Cursor has no selection.
    NoSelection,
    /// Target entry is already gone from durable storage.
    EntryNotFound(EntryId),
    /// Mutation attempted before a successful `initialize`.
    NotInitialized,
    AlreadyInitialized,
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NoSelection => write!(f, "no entry is selected"),
            Self::EntryNotFound(id) => write!(f, "entry not found: {id}"),
            Self::NotInitialized => write!(f, "journal is not initialized"),
            Self::AlreadyInitialized => write!(f, "journal is already initialized"),
        }
    }
}

impl Error for JournalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for JournalError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::EntryNotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl From<EntryValidationError> for JournalError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Consistent read snapshot of the journal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JournalView {
    /// Entry under the cursor.
    pub current: Option<Entry>,
    pub index: Option<usize>,
    pub len: usize,
}

/// Result of a successful `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedEntry {
    pub entry: Entry,
    /// Sorted position the entry landed at; the cursor now points here.
    pub index: usize,
}

struct JournalState {
    entries: Vec<Entry>,
    cursor: Cursor,
    initialized: bool,
}

impl JournalState {
    fn view(&self) -> JournalView {
        JournalView {
            current: self.cursor.current(&self.entries).cloned(),
            index: self.cursor.index(),
            len: self.entries.len(),
        }
    }

    fn ensure_initialized(&self) -> JournalResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(JournalError::NotInitialized)
        }
    }
}

type SharedStore = Arc<StoreLock<Box<dyn EntryStore>>>;

/// Ordered, durably-backed entry collection with a cursor.
pub struct Journal {
    state: Mutex<JournalState>,
    store: SharedStore,
    backend: &'static str,
}

impl Journal {
    /// Creates an uninitialized journal over `store`.
    pub fn new<S: EntryStore + 'static>(store: S) -> Self {
        let backend = store.backend_name();
        Self {
            state: Mutex::new(JournalState {
                entries: Vec::new(),
                cursor: Cursor::Empty,
                initialized: false,
            }),
            store: Arc::new(StoreLock::new(Box::new(store))),
            backend,
        }
    }

    /// Runs one backend call on the blocking pool.
    ///
    /// Callers hold the state lock across this await, which keeps backend
    /// calls in the same order as the mutations they belong to.
    async fn call_store<T, F>(&self, call: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Box<dyn EntryStore>) -> StoreResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut store = store
                .lock()
                .map_err(|_| StoreError::Task("backend lock poisoned".to_string()))?;
            call(&mut store)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }

    async fn load(&self, state: &mut JournalState, event: &'static str) -> JournalResult<JournalView> {
        let started_at = Instant::now();

        match self.call_store(|store| store.load_all()).await {
            Ok(mut entries) => {
                entries.sort_by_key(|entry| entry.date);
                state.cursor = Cursor::last(entries.len());
                state.entries = entries;
                state.initialized = true;
                info!(
                    "event={} module=journal status=ok backend={} count={} duration_ms={}",
                    event,
                    self.backend,
                    state.entries.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(state.view())
            }
            Err(err) => {
                state.entries.clear();
                state.cursor = Cursor::Empty;
                state.initialized = false;
                error!(
                    "event={} module=journal status=error backend={} duration_ms={} error={}",
                    event,
                    self.backend,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Loads the collection, sorts it and selects the most recent entry.
    ///
    /// # Errors
    /// - `AlreadyInitialized` on a second call.
    /// - `Storage` when the backend load fails; the collection stays empty.
    pub async fn initialize(&self) -> JournalResult<JournalView> {
        let mut state = self.state.lock().await;
        if state.initialized {
            return Err(JournalError::AlreadyInitialized);
        }
        self.load(&mut state, "journal_init").await
    }

    /// Re-reads durable state, replacing the in-memory collection.
    ///
    /// Used to reconcile after a reported storage failure. Failure semantics
    /// match `initialize`.
    pub async fn reload(&self) -> JournalResult<JournalView> {
        let mut state = self.state.lock().await;
        self.load(&mut state, "journal_reload").await
    }

    /// Validates, persists and inserts a draft at its sorted position.
    ///
    /// Same-date entries keep insertion order: the new entry goes after them.
    pub async fn add(&self, draft: &EntryDraft) -> JournalResult<InsertedEntry> {
        let new_entry = draft.validate()?;

        let mut state = self.state.lock().await;
        state.ensure_initialized()?;

        let entry = self
            .call_store(move |store| store.append(&new_entry))
            .await
            .map_err(|err| {
                error!(
                    "event=entry_add module=journal status=error backend={} error={}",
                    self.backend, err
                );
                JournalError::from(err)
            })?;

        let index = state
            .entries
            .partition_point(|existing| existing.date <= entry.date);
        state.entries.insert(index, entry.clone());
        state.cursor = Cursor::At(index);

        info!(
            "event=entry_add module=journal status=ok backend={} index={} len={}",
            self.backend,
            index,
            state.entries.len()
        );
        Ok(InsertedEntry { entry, index })
    }

    /// Deletes the entry under the cursor from the backend and from memory.
    ///
    /// If the backend reports the entry as already gone, memory is brought in
    /// line with durable state and `EntryNotFound` is still returned.
    pub async fn delete_current(&self) -> JournalResult<Entry> {
        let mut state = self.state.lock().await;
        state.ensure_initialized()?;

        let index = state.cursor.index().ok_or(JournalError::NoSelection)?;
        let id = state.entries[index].id;

        match self.call_store(move |store| store.remove(id)).await {
            Ok(()) => {}
            Err(StoreError::NotFound(missing)) => {
                warn!(
                    "event=entry_delete module=journal status=error error_code=not_found backend={}",
                    self.backend
                );
                state.entries.remove(index);
                state.cursor = Cursor::after_removal(index, state.entries.len());
                return Err(JournalError::EntryNotFound(missing));
            }
            Err(err) => {
                error!(
                    "event=entry_delete module=journal status=error backend={} error={}",
                    self.backend, err
                );
                return Err(err.into());
            }
        }

        let removed = state.entries.remove(index);
        state.cursor = Cursor::after_removal(index, state.entries.len());

        info!(
            "event=entry_delete module=journal status=ok backend={} index={} len={}",
            self.backend,
            index,
            state.entries.len()
        );
        Ok(removed)
    }

    /// Empties backend and memory. Irreversible; no confirmation here.
    pub async fn clear_all(&self) -> JournalResult<()> {
        let mut state = self.state.lock().await;
        state.ensure_initialized()?;

        if let Err(err) = self.call_store(|store| store.clear()).await {
            error!(
                "event=entry_clear module=journal status=error backend={} error={}",
                self.backend, err
            );
            return Err(err.into());
        }

        let removed = state.entries.len();
        state.entries.clear();
        state.cursor = Cursor::Empty;

        info!(
            "event=entry_clear module=journal status=ok backend={} removed={}",
            self.backend, removed
        );
        Ok(())
    }

    /// Moves the cursor circularly by `delta` and returns the new view.
    pub async fn step(&self, delta: isize) -> JournalView {
        let mut state = self.state.lock().await;
        let len = state.entries.len();
        state.cursor = state.cursor.advance(delta, len);
        state.view()
    }

    pub async fn view(&self) -> JournalView {
        self.state.lock().await.view()
    }

    /// Snapshot of the ordered collection.
    pub async fn entries(&self) -> Vec<Entry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.initialized
    }
}
