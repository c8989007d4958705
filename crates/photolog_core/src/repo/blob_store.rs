//! Single-snapshot backend: the whole collection as one JSON blob.
//!
//! # Responsibility
//! - Serialize the full entry sequence under one storage key.
//! - Replace the snapshot atomically on every mutation.
//!
//! # Invariants
//! - Identity is positional in the snapshot; ids are minted per session and
//!   never written to the blob.
//! - The in-store cache only changes after the new snapshot is durable.
//! - A missing key yields the seed; an unreadable snapshot is an error.

use crate::model::entry::{Entry, EntryId, NewEntry};
use crate::repo::entry_store::{EntryStore, StoreError, StoreResult};
use log::{debug, error};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const SNAPSHOT_EXTENSION: &str = "json";

/// JSON snapshot store rooted at `<dir>/<key>.json`.
pub struct BlobStore {
    path: PathBuf,
    seed: Vec<NewEntry>,
    cache: Vec<Entry>,
}

impl BlobStore {
    /// Creates a store for `key` inside `dir`. Nothing is read until `load_all`.
    pub fn new(dir: impl AsRef<Path>, key: &str) -> StoreResult<Self> {
        Self::with_seed(dir, key, Vec::new())
    }

    /// Same as `new`, returning `seed` while the key has never been written.
    pub fn with_seed(dir: impl AsRef<Path>, key: &str, seed: Vec<NewEntry>) -> StoreResult<Self> {
        let key = key.trim();
        if key.is_empty() || key.contains(['/', '\\']) {
            return Err(StoreError::InvalidData(format!(
                "invalid snapshot key `{key}`"
            )));
        }

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{key}.{SNAPSHOT_EXTENSION}")),
            seed,
            cache: Vec::new(),
        })
    }

    /// Location of the durable snapshot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_snapshot(&self) -> StoreResult<Option<Vec<NewEntry>>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let records: Vec<NewEntry> = serde_json::from_str(&raw).map_err(|err| {
            StoreError::InvalidData(format!(
                "snapshot `{}` is not a valid entry list: {err}",
                self.path.display()
            ))
        })?;
        for record in &records {
            record
                .validate()
                .map_err(|err| StoreError::InvalidData(format!("snapshot record: {err}")))?;
        }
        Ok(Some(records))
    }

    fn write_snapshot(&self, entries: &[Entry]) -> StoreResult<()> {
        let records = entries
            .iter()
            .map(|entry| NewEntry::new(entry.date, entry.note.clone(), entry.media.clone()))
            .collect::<Vec<_>>();
        let payload = serde_json::to_vec(&records)?;

        let tmp_path = self.path.with_extension(format!("{SNAPSHOT_EXTENSION}.tmp"));
        let result = (|| -> std::io::Result<()> {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&payload)?;
            file.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if let Err(err) = result {
            error!(
                "event=snapshot_write module=repo status=error backend=blob error={}",
                err
            );
            let _ = fs::remove_file(&tmp_path);
            return Err(err.into());
        }

        debug!(
            "event=snapshot_write module=repo status=ok backend=blob count={} bytes={}",
            entries.len(),
            payload.len()
        );
        Ok(())
    }

    fn commit(&mut self, next: Vec<Entry>) -> StoreResult<()> {
        self.write_snapshot(&next)?;
        self.cache = next;
        Ok(())
    }
}

impl EntryStore for BlobStore {
    fn backend_name(&self) -> &'static str {
        "blob"
    }

    fn load_all(&mut self) -> StoreResult<Vec<Entry>> {
        let records = match self.read_snapshot()? {
            Some(records) => records,
            None => self.seed.clone(),
        };

        self.cache = records
            .into_iter()
            .map(|record| record.into_entry(Uuid::new_v4()))
            .collect();
        Ok(self.cache.clone())
    }

    fn append(&mut self, entry: &NewEntry) -> StoreResult<Entry> {
        entry
            .validate()
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        let created = entry.clone().into_entry(Uuid::new_v4());
        let mut next = self.cache.clone();
        next.push(created.clone());
        self.commit(next)?;
        Ok(created)
    }

    fn remove(&mut self, id: EntryId) -> StoreResult<()> {
        let position = self
            .cache
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(StoreError::NotFound(id))?;

        let mut next = self.cache.clone();
        next.remove(position);
        self.commit(next)
    }

    fn clear(&mut self) -> StoreResult<()> {
        self.commit(Vec::new())
    }

    fn replace_all(&mut self, entries: &[Entry]) -> StoreResult<()> {
        self.commit(entries.to_vec())
    }
}
