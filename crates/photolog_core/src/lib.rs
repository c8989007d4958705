//! Core domain logic for PhotoLog, a dated media journal.
//! This crate is the single source of truth for ordering and cursor invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{BackendConfig, ConfigError, SessionConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::cursor::Cursor;
pub use model::entry::{
    parse_entry_date, Entry, EntryDraft, EntryId, EntryValidationError, MediaPayload, NewEntry,
};
pub use repo::{BlobStore, EntryStore, SqliteStore, StoreError, StoreResult};
pub use service::ingest_service::{
    DatePolicy, IngestError, IngestOutcome, IngestPipeline, IngestReport, MediaInput, MediaSource,
};
pub use service::journal_service::{
    InsertedEntry, Journal, JournalError, JournalResult, JournalView,
};
pub use service::playback_service::{
    PlaybackController, PlaybackError, PlaybackState, TickHook, DEFAULT_PERIOD_SECS,
    MIN_PERIOD_SECS,
};
pub use session::{ErrorKind, RenderFrame, RenderHook, Session, SessionError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
