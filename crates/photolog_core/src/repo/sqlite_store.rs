//! Transactional per-entry backend on SQLite.
//!
//! # Responsibility
//! - Persist each entry as one row keyed by a generated UUID.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate entries before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Seed rows are written once, when the database schema is first created.

use crate::db::{open_db, open_db_in_memory, OpenedDb};
use crate::model::entry::{format_entry_date, Entry, EntryId, MediaPayload, NewEntry};
use crate::repo::entry_store::{EntryStore, StoreError, StoreResult};
use chrono::NaiveDate;
use log::info;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::path::Path;
use uuid::Uuid;

const ENTRY_SELECT_SQL: &str = "SELECT
    uuid,
    entry_date,
    note,
    media
FROM entries
ORDER BY entry_date ASC, seq ASC;";

const ENTRY_INSERT_SQL: &str = "INSERT INTO entries (
    uuid,
    entry_date,
    note,
    media
) VALUES (?1, ?2, ?3, ?4);";

/// SQLite-backed entry store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_seed(path, &[])
    }

    /// Opens the database file, writing `seed` if the file is new.
    pub fn open_with_seed(path: impl AsRef<Path>, seed: &[NewEntry]) -> StoreResult<Self> {
        Self::from_opened(open_db(path)?, seed)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_in_memory_with_seed(&[])
    }

    pub fn open_in_memory_with_seed(seed: &[NewEntry]) -> StoreResult<Self> {
        Self::from_opened(open_db_in_memory()?, seed)
    }

    fn from_opened(opened: OpenedDb, seed: &[NewEntry]) -> StoreResult<Self> {
        let fresh = opened.is_fresh();
        let mut store = Self { conn: opened.conn };
        if fresh && !seed.is_empty() {
            store.write_seed(seed)?;
        }
        Ok(store)
    }

    fn write_seed(&mut self, seed: &[NewEntry]) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        for entry in seed {
            entry.validate().map_err(|err| {
                StoreError::InvalidData(format!("seed entry rejected: {err}"))
            })?;
            tx.execute(
                ENTRY_INSERT_SQL,
                params![
                    Uuid::new_v4().to_string(),
                    format_entry_date(entry.date),
                    entry.note.as_str(),
                    entry.media.as_str(),
                ],
            )?;
        }
        tx.commit()?;

        info!(
            "event=store_seed module=repo status=ok backend=sqlite count={}",
            seed.len()
        );
        Ok(())
    }
}

impl EntryStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn load_all(&mut self) -> StoreResult<Vec<Entry>> {
        let mut stmt = self.conn.prepare(ENTRY_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        Ok(entries)
    }

    fn append(&mut self, entry: &NewEntry) -> StoreResult<Entry> {
        entry
            .validate()
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        let id = Uuid::new_v4();
        self.conn.execute(
            ENTRY_INSERT_SQL,
            params![
                id.to_string(),
                format_entry_date(entry.date),
                entry.note.as_str(),
                entry.media.as_str(),
            ],
        )?;

        Ok(entry.clone().into_entry(id))
    }

    fn remove(&mut self, id: EntryId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM entries WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.conn.execute("DELETE FROM entries;", [])?;
        Ok(())
    }

    fn replace_all(&mut self, entries: &[Entry]) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM entries;", [])?;
        for entry in entries {
            tx.execute(
                ENTRY_INSERT_SQL,
                params![
                    entry.id.to_string(),
                    format_entry_date(entry.date),
                    entry.note.as_str(),
                    entry.media.as_str(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_entry_row(row: &Row<'_>) -> StoreResult<Entry> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{uuid_text}` in entries.uuid"))
    })?;

    let date_text: String = row.get("entry_date")?;
    let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid date value `{date_text}` in entries.entry_date"
        ))
    })?;

    let media: String = row.get("media")?;
    if media.trim().is_empty() {
        return Err(StoreError::InvalidData(format!(
            "empty media payload for entry {id}"
        )));
    }

    Ok(Entry {
        id,
        date,
        note: row.get("note")?,
        media: MediaPayload::from_encoded(media),
    })
}
