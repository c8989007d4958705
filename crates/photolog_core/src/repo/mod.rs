//! Persistence backends for the entry collection.
//!
//! # Responsibility
//! - Define the backend-agnostic `EntryStore` contract.
//! - Provide the snapshot (`BlobStore`) and transactional (`SqliteStore`)
//!   implementations.
//!
//! # Invariants
//! - Backends never reorder entries for the caller beyond their documented
//!   load order; sorting is the journal's job.
//! - Backends report semantic `NotFound` in addition to transport errors.

pub mod blob_store;
pub mod entry_store;
pub mod sqlite_store;

pub use blob_store::BlobStore;
pub use entry_store::{EntryStore, StoreError, StoreResult};
pub use sqlite_store::SqliteStore;
