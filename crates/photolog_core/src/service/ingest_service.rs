//! Media ingestion use-case service.
//!
//! # Responsibility
//! - Encode raw media inputs into storable payloads concurrently.
//! - Resolve each draft's date according to `DatePolicy`.
//! - Hand drafts to the journal one at a time, in input order.
//!
//! # Invariants
//! - Encodes fan out and are joined before any insertion.
//! - One failed item never aborts its siblings; every input gets an outcome.
//! - A single input always uses the user-entered date.

use crate::model::entry::{format_entry_date, Entry, EntryDraft, MediaPayload};
use crate::service::journal_service::{Journal, JournalError};
use chrono::{DateTime, Local, NaiveDate};
use futures::future::join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Where the raw bytes of an input come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Bytes(Vec<u8>),
    /// Read asynchronously at encode time.
    Path(PathBuf),
}

/// One raw media item handed over by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInput {
    /// Caller-facing label used in per-item outcomes (usually a file name).
    pub label: String,
    pub source: MediaSource,
    /// Capture date from the item's own metadata, when the caller knows it.
    pub captured_on: Option<NaiveDate>,
}

impl MediaInput {
    pub fn from_bytes(label: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            source: MediaSource::Bytes(bytes),
            captured_on: None,
        }
    }

    /// Input read from disk; its modification time is the fallback
    /// intrinsic date.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            label,
            source: MediaSource::Path(path),
            captured_on: None,
        }
    }

    pub fn with_captured_on(mut self, date: NaiveDate) -> Self {
        self.captured_on = Some(date);
        self
    }
}

/// How multi-item submissions pick each entry's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePolicy {
    /// Use each item's intrinsic date, falling back to the user date.
    #[default]
    PreferIntrinsic,
    /// Always use the user date.
    AlwaysManual,
}

/// Errors from ingestion, reported per item except `NoInputs`.
#[derive(Debug)]
pub enum IngestError {
    /// Submission carried no media at all.
    NoInputs,
    Io {
        label: String,
        source: std::io::Error,
    },
    EmptyMedia(String),
    /// The blocking encode task panicked or was cancelled.
    EncodeTask {
        label: String,
        message: String,
    },
    Journal(JournalError),
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoInputs => write!(f, "at least one media input is required"),
            Self::Io { label, source } => write!(f, "failed to read media `{label}`: {source}"),
            Self::EmptyMedia(label) => write!(f, "media `{label}` is empty"),
            Self::EncodeTask { label, message } => {
                write!(f, "encoding media `{label}` failed: {message}")
            }
            Self::Journal(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Journal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<JournalError> for IngestError {
    fn from(value: JournalError) -> Self {
        Self::Journal(value)
    }
}

/// Result for one submitted input.
#[derive(Debug)]
pub struct IngestOutcome {
    pub label: String,
    pub result: Result<Entry, IngestError>,
}

/// Per-item results of one submission, in input order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<IngestOutcome>,
}

impl IngestReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &Entry> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &IngestError)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|err| (outcome.label.as_str(), err))
        })
    }

    pub fn is_complete_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }
}

struct EncodedMedia {
    payload: MediaPayload,
    intrinsic_date: Option<NaiveDate>,
}

/// Converts raw media into journal entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestPipeline {
    policy: DatePolicy,
}

impl IngestPipeline {
    pub fn new(policy: DatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DatePolicy {
        self.policy
    }

    /// Encodes `inputs` concurrently, then adds each draft to `journal`.
    ///
    /// # Errors
    /// - `NoInputs` when `inputs` is empty; nothing is written.
    ///
    /// Every other failure is reported in the matching `IngestOutcome`.
    pub async fn submit(
        &self,
        journal: &Journal,
        inputs: Vec<MediaInput>,
        date: &str,
        note: &str,
    ) -> Result<IngestReport, IngestError> {
        if inputs.is_empty() {
            return Err(IngestError::NoInputs);
        }

        let started_at = Instant::now();
        let single = inputs.len() == 1;
        let encoded = join_all(inputs.into_iter().map(|input| async move {
            let label = input.label.clone();
            (label, encode_media(input).await)
        }))
        .await;

        let mut outcomes = Vec::with_capacity(encoded.len());
        for (label, encoded) in encoded {
            let result = match encoded {
                Ok(media) => {
                    let date_text = self.resolve_date(single, media.intrinsic_date, date);
                    let draft = EntryDraft::new(date_text, note, media.payload);
                    journal
                        .add(&draft)
                        .await
                        .map(|inserted| inserted.entry)
                        .map_err(IngestError::from)
                }
                Err(err) => Err(err),
            };

            if let Err(err) = &result {
                warn!("event=ingest_item module=ingest status=error error={err}");
            }
            outcomes.push(IngestOutcome { label, result });
        }

        let report = IngestReport { outcomes };
        info!(
            "event=ingest_submit module=ingest status=ok items={} failed={} duration_ms={}",
            report.outcomes.len(),
            report.failed().count(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn resolve_date(&self, single: bool, intrinsic: Option<NaiveDate>, manual: &str) -> String {
        if single {
            return manual.to_string();
        }
        match (self.policy, intrinsic) {
            (DatePolicy::PreferIntrinsic, Some(date)) => format_entry_date(date),
            _ => manual.to_string(),
        }
    }
}

async fn encode_media(input: MediaInput) -> Result<EncodedMedia, IngestError> {
    let MediaInput {
        label,
        source,
        captured_on,
    } = input;

    let (bytes, modified_on) = match source {
        MediaSource::Bytes(bytes) => (bytes, None),
        MediaSource::Path(path) => {
            let bytes = tokio::fs::read(&path).await.map_err(|source| IngestError::Io {
                label: label.clone(),
                source,
            })?;
            let modified_on = tokio::fs::metadata(&path)
                .await
                .ok()
                .and_then(|meta| meta.modified().ok())
                .map(|modified| DateTime::<Local>::from(modified).date_naive());
            (bytes, modified_on)
        }
    };

    if bytes.is_empty() {
        return Err(IngestError::EmptyMedia(label));
    }

    let byte_len = bytes.len();
    let payload = tokio::task::spawn_blocking(move || MediaPayload::encode(&bytes))
        .await
        .map_err(|err| IngestError::EncodeTask {
            label,
            message: err.to_string(),
        })?;

    debug!("event=media_encode module=ingest status=ok bytes={byte_len}");
    Ok(EncodedMedia {
        payload,
        intrinsic_date: captured_on.or(modified_on),
    })
}
