//! Core use-case services.
//!
//! # Responsibility
//! - Own the ordered journal and orchestrate backend calls into use cases.
//! - Keep presentation callers decoupled from storage details.

pub mod ingest_service;
pub mod journal_service;
pub mod playback_service;
