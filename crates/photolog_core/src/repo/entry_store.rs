//! Persistence contract shared by all entry backends.
//!
//! # Responsibility
//! - Define the uniform durable-storage API the journal is written against.
//! - Provide the error type all backends report through.
//!
//! # Invariants
//! - A mutating call either is durable before it returns or fails with
//!   `StoreError`; there is no partially applied state.
//! - Absence of stored data is a valid state (`load_all` returns the seed),
//!   never an error.

use crate::db::DbError;
use crate::model::entry::{Entry, EntryId, NewEntry};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Io(std::io::Error),
    Serialization(serde_json::Error),
    /// Persisted state exists but violates the entry model.
    InvalidData(String),
    NotFound(EntryId),
    /// Backend call could not run to completion (worker panic or poisoned lock).
    Task(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "storage io failed: {err}"),
            Self::Serialization(err) => write!(f, "snapshot serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::Task(message) => write!(f, "storage task failed: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::NotFound(_) => None,
            Self::Task(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Durable backend for the entry collection.
///
/// Backends differ only in durability granularity (whole snapshot vs. per
/// entry transaction), not in visible contract.
pub trait EntryStore: Send {
    /// Short backend label used in log events.
    fn backend_name(&self) -> &'static str;
    /// Loads every stored entry, or the seed when nothing was ever stored.
    fn load_all(&mut self) -> StoreResult<Vec<Entry>>;
    /// Persists a new entry and returns it with its assigned id.
    fn append(&mut self, entry: &NewEntry) -> StoreResult<Entry>;
    /// Removes one entry by id.
    fn remove(&mut self, id: EntryId) -> StoreResult<()>;
    /// Removes every entry.
    fn clear(&mut self) -> StoreResult<()>;
    /// Replaces the stored collection with `entries`, keeping their order.
    fn replace_all(&mut self, entries: &[Entry]) -> StoreResult<()>;
}

impl<S: EntryStore + ?Sized> EntryStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn load_all(&mut self) -> StoreResult<Vec<Entry>> {
        (**self).load_all()
    }

    fn append(&mut self, entry: &NewEntry) -> StoreResult<Entry> {
        (**self).append(entry)
    }

    fn remove(&mut self, id: EntryId) -> StoreResult<()> {
        (**self).remove(id)
    }

    fn clear(&mut self) -> StoreResult<()> {
        (**self).clear()
    }

    fn replace_all(&mut self, entries: &[Entry]) -> StoreResult<()> {
        (**self).replace_all(entries)
    }
}
