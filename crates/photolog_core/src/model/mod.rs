//! Domain model for dated media entries.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep positional cursor bookkeeping separate from collection mutation.
//!
//! # Invariants
//! - Every persisted entry is identified by a stable `EntryId`.
//! - Entries are ordered by calendar date, never by date text.

pub mod cursor;
pub mod entry;
