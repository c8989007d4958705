//! Session configuration.
//!
//! # Responsibility
//! - Describe which backend a session uses and its playback/ingest defaults.
//! - Build the configured `EntryStore`.
//!
//! # Invariants
//! - Every field has a default, so `{}` is a valid configuration.
//! - Values are validated where they are used, not at parse time.

use crate::model::entry::NewEntry;
use crate::repo::{BlobStore, EntryStore, SqliteStore, StoreResult};
use crate::service::ingest_service::DatePolicy;
use crate::service::playback_service::DEFAULT_PERIOD_SECS;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Read(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Durable backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// One JSON snapshot at `<dir>/<key>.json`.
    Blob { dir: PathBuf, key: String },
    /// Versioned SQLite database file.
    Sqlite { path: PathBuf },
    /// Non-durable SQLite database, for previews and tests.
    #[default]
    SqliteInMemory,
}

/// Top-level session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Initial playback period in seconds.
    #[serde(default = "default_autoplay_period_secs")]
    pub autoplay_period_secs: f64,
    #[serde(default)]
    pub date_policy: DatePolicy,
    /// Entries returned while the backend has never been written.
    #[serde(default)]
    pub seed: Vec<NewEntry>,
}

fn default_autoplay_period_secs() -> f64 {
    DEFAULT_PERIOD_SECS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            autoplay_period_secs: default_autoplay_period_secs(),
            date_policy: DatePolicy::default(),
            seed: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(ConfigError::Parse)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Self::from_json_str(&raw)
    }

    /// Opens the configured backend, seeding it per backend rules.
    pub fn open_store(&self) -> StoreResult<Box<dyn EntryStore>> {
        let store: Box<dyn EntryStore> = match &self.backend {
            BackendConfig::Blob { dir, key } => {
                Box::new(BlobStore::with_seed(dir, key, self.seed.clone())?)
            }
            BackendConfig::Sqlite { path } => {
                Box::new(SqliteStore::open_with_seed(path, &self.seed)?)
            }
            BackendConfig::SqliteInMemory => {
                Box::new(SqliteStore::open_in_memory_with_seed(&self.seed)?)
            }
        };
        Ok(store)
    }
}
