//! Entry domain model.
//!
//! # Responsibility
//! - Define the durable dated media record and its pre-persistence shapes.
//! - Validate user-supplied drafts before any storage write.
//!
//! # Invariants
//! - `Entry::id` is stable and never reused for another entry.
//! - `date` is a calendar value; ordering never relies on string comparison.
//! - `media` is opaque and never mutated after creation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ENTRY_DATE_FORMAT: &str = "%Y-%m-%d";
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

static DATA_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:([^;,]*)((?:;[^;,]*)*),").expect("valid data url regex"));

/// Stable identifier of a persisted entry.
pub type EntryId = Uuid;

/// Encoded media payload stored alongside an entry.
///
/// The payload is a `data:` URL. Core never inspects pixels; it only
/// carries the text between ingestion, storage and the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaPayload(String);

impl MediaPayload {
    /// Encodes raw bytes as a base64 `data:` URL, sniffing the mime type.
    pub fn encode(bytes: &[u8]) -> Self {
        let mime = infer::get(bytes)
            .map(|kind| kind.mime_type())
            .unwrap_or(FALLBACK_MIME_TYPE);
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// Wraps an already encoded payload (import and seed paths).
    pub fn from_encoded(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns the declared mime type when the payload is a `data:` URL.
    pub fn mime_type(&self) -> Option<&str> {
        DATA_URL_RE
            .captures(&self.0)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|mime| !mime.is_empty())
    }

    /// Decodes base64 `data:` URL payloads back into bytes.
    ///
    /// Returns `None` for payloads that are plain references (e.g. a file
    /// name) or not base64 encoded.
    pub fn decode(&self) -> Option<Vec<u8>> {
        let caps = DATA_URL_RE.captures(&self.0)?;
        let params = caps.get(2).map_or("", |m| m.as_str());
        if !params.split(';').any(|param| param == "base64") {
            return None;
        }
        let body_start = caps.get(0)?.end();
        STANDARD.decode(&self.0[body_start..]).ok()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Durable dated media record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Stable id assigned by the backend on first durable write.
    pub id: EntryId,
    /// Calendar date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Free text, may be empty.
    pub note: String,
    pub media: MediaPayload,
}

/// Validated entry that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub note: String,
    pub media: MediaPayload,
}

impl NewEntry {
    pub fn new(date: NaiveDate, note: impl Into<String>, media: MediaPayload) -> Self {
        Self {
            date,
            note: note.into(),
            media,
        }
    }

    /// Checks field-level invariants that the typed date cannot express.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.media.is_empty() {
            return Err(EntryValidationError::MissingMedia);
        }
        Ok(())
    }

    /// Attaches a backend-assigned identity.
    pub fn into_entry(self, id: EntryId) -> Entry {
        Entry {
            id,
            date: self.date,
            note: self.note,
            media: self.media,
        }
    }
}

/// Raw user input for one entry, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntryDraft {
    /// Date text as entered or inferred (`YYYY-MM-DD`, or an RFC 3339 stamp).
    pub date: String,
    pub note: String,
    pub media: Option<MediaPayload>,
}

impl EntryDraft {
    pub fn new(date: impl Into<String>, note: impl Into<String>, media: MediaPayload) -> Self {
        Self {
            date: date.into(),
            note: note.into(),
            media: Some(media),
        }
    }

    /// Validates the draft into a storable `NewEntry`.
    ///
    /// # Errors
    /// - `MissingDate` / `MalformedDate` when the date text is blank or unparsable.
    /// - `MissingMedia` when no payload (or an empty one) is attached.
    pub fn validate(&self) -> Result<NewEntry, EntryValidationError> {
        let date = parse_entry_date(&self.date)?;
        let media = match &self.media {
            Some(media) if !media.is_empty() => media.clone(),
            _ => return Err(EntryValidationError::MissingMedia),
        };
        Ok(NewEntry::new(date, self.note.clone(), media))
    }
}

/// Validation failures for entry drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    MissingDate,
    MalformedDate(String),
    MissingMedia,
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDate => write!(f, "entry date is required"),
            Self::MalformedDate(value) => write!(f, "entry date `{value}` is not a calendar date"),
            Self::MissingMedia => write!(f, "entry media is required"),
        }
    }
}

impl Error for EntryValidationError {}

/// Parses user or metadata date text into a calendar date.
///
/// Accepts `YYYY-MM-DD` plus timestamp forms (RFC 3339 or
/// `YYYY-MM-DDTHH:MM:SS`), whose time component is dropped.
pub fn parse_entry_date(raw: &str) -> Result<NaiveDate, EntryValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EntryValidationError::MissingDate);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, ENTRY_DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(stamp.date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Ok(stamp.date());
    }

    Err(EntryValidationError::MalformedDate(trimmed.to_string()))
}

/// Formats a calendar date the way drafts and snapshots expect it.
pub fn format_entry_date(date: NaiveDate) -> String {
    date.format(ENTRY_DATE_FORMAT).to_string()
}
