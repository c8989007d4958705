//! Presentation-facing session API.
//!
//! # Responsibility
//! - Wire one journal, one playback controller and one ingest pipeline.
//! - Expose the use-case calls a host UI makes and report typed errors.
//! - Push a `RenderFrame` to the render hook after every call and tick.
//!
//! # Invariants
//! - The session never formats user-facing text or asks for confirmation.
//! - Delete/clear run unconditionally once called.
//! - The render hook is called after each operation, successful or not.

use crate::config::SessionConfig;
use crate::model::entry::Entry;
use crate::repo::{EntryStore, StoreError};
use crate::service::ingest_service::{IngestError, IngestPipeline, IngestReport, MediaInput};
use crate::service::journal_service::{Journal, JournalError, JournalView};
use crate::service::playback_service::{PlaybackController, PlaybackError, PlaybackState};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Everything the presentation layer needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub current: Option<Entry>,
    pub index: Option<usize>,
    pub len: usize,
    pub playback: PlaybackState,
    pub period_secs: f64,
}

impl RenderFrame {
    fn from_view(view: JournalView, playback: PlaybackState, period_secs: f64) -> Self {
        Self {
            current: view.current,
            index: view.index,
            len: view.len,
            playback,
            period_secs,
        }
    }
}

/// Render callback installed by the host.
pub type RenderHook = Arc<dyn Fn(&RenderFrame) + Send + Sync>;

/// Error category surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Storage,
    Validation,
    NotFound,
    Configuration,
}

/// Session-level error.
#[derive(Debug)]
pub enum SessionError {
    /// Backend could not be opened.
    Store(StoreError),
    Journal(JournalError),
    Ingest(IngestError),
    Playback(PlaybackError),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Storage,
            Self::Journal(err) => journal_error_kind(err),
            Self::Ingest(err) => match err {
                IngestError::NoInputs | IngestError::EmptyMedia(_) => ErrorKind::Validation,
                IngestError::Io { .. } | IngestError::EncodeTask { .. } => ErrorKind::Storage,
                IngestError::Journal(err) => journal_error_kind(err),
            },
            Self::Playback(_) => ErrorKind::Configuration,
        }
    }
}

fn journal_error_kind(err: &JournalError) -> ErrorKind {
    match err {
        JournalError::Storage(_)
        | JournalError::NotInitialized
        | JournalError::AlreadyInitialized => ErrorKind::Storage,
        JournalError::Validation(_) => ErrorKind::Validation,
        JournalError::NoSelection | JournalError::EntryNotFound(_) => ErrorKind::NotFound,
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Journal(err) => write!(f, "{err}"),
            Self::Ingest(err) => write!(f, "{err}"),
            Self::Playback(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Journal(err) => Some(err),
            Self::Ingest(err) => Some(err),
            Self::Playback(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<JournalError> for SessionError {
    fn from(value: JournalError) -> Self {
        Self::Journal(value)
    }
}

impl From<IngestError> for SessionError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<PlaybackError> for SessionError {
    fn from(value: PlaybackError) -> Self {
        Self::Playback(value)
    }
}

/// One browsing session over a journal.
pub struct Session {
    journal: Arc<Journal>,
    playback: PlaybackController,
    ingest: IngestPipeline,
    render: Option<RenderHook>,
}

impl Session {
    /// Opens the configured backend and builds an uninitialized session.
    pub fn open(config: &SessionConfig) -> Result<Self, SessionError> {
        let store = config.open_store()?;
        Ok(Self::with_store(store, config))
    }

    /// Builds a session over an already constructed backend.
    ///
    /// An invalid `autoplay_period_secs` falls back to the default period.
    pub fn with_store<S: EntryStore + 'static>(store: S, config: &SessionConfig) -> Self {
        let journal = Arc::new(Journal::new(store));
        let mut playback = PlaybackController::new(Arc::clone(&journal));
        if let Err(err) = playback.set_period(config.autoplay_period_secs) {
            warn!("event=session_open module=session status=degraded error={err}");
        }

        Self {
            journal,
            playback,
            ingest: IngestPipeline::new(config.date_policy),
            render: None,
        }
    }

    /// Installs the render hook for calls and playback ticks.
    ///
    /// Takes effect for ticks from the next playback start.
    pub fn set_render_hook(&mut self, hook: RenderHook) {
        let tick_render = Arc::clone(&hook);
        self.playback
            .set_tick_hook(Arc::new(move |view: &JournalView, period_secs: f64| {
                let frame =
                    RenderFrame::from_view(view.clone(), PlaybackState::Playing, period_secs);
                tick_render(&frame);
            }));
        self.render = Some(hook);
    }

    pub fn journal(&self) -> &Arc<Journal> {
        &self.journal
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Current frame, without notifying the render hook.
    pub async fn frame(&self) -> RenderFrame {
        RenderFrame::from_view(
            self.journal.view().await,
            self.playback.state(),
            self.playback.period_secs(),
        )
    }

    async fn render(&self) -> RenderFrame {
        let frame = self.frame().await;
        if let Some(hook) = &self.render {
            hook(&frame);
        }
        frame
    }

    /// Loads durable state and renders the most recent entry.
    pub async fn initialize(&self) -> Result<RenderFrame, SessionError> {
        let result = self.journal.initialize().await;
        let frame = self.render().await;
        result?;
        Ok(frame)
    }

    /// Ingests one or more media inputs with a shared user date and note.
    pub async fn submit_new_entry(
        &self,
        inputs: Vec<MediaInput>,
        date: &str,
        note: &str,
    ) -> Result<IngestReport, SessionError> {
        let result = self.ingest.submit(&self.journal, inputs, date, note).await;
        self.render().await;
        Ok(result?)
    }

    pub async fn step_next(&self) -> RenderFrame {
        self.journal.step(1).await;
        self.render().await
    }

    pub async fn step_previous(&self) -> RenderFrame {
        self.journal.step(-1).await;
        self.render().await
    }

    pub async fn toggle_autoplay(&mut self) -> Result<PlaybackState, SessionError> {
        let result = self.playback.toggle().await;
        self.render().await;
        Ok(result?)
    }

    /// Stops playback and adjusts its period; returns the new period.
    pub async fn adjust_period(&mut self, delta: f64) -> Result<f64, SessionError> {
        let result = self.playback.adjust_period(delta).await;
        self.render().await;
        Ok(result?)
    }

    /// Deletes the selected entry. Confirmation is the caller's concern.
    pub async fn delete_current_entry(&self) -> Result<Entry, SessionError> {
        let result = self.journal.delete_current().await;
        self.render().await;
        Ok(result?)
    }

    /// Deletes every entry. Confirmation is the caller's concern.
    pub async fn clear_all_entries(&self) -> Result<(), SessionError> {
        let result = self.journal.clear_all().await;
        self.render().await;
        Ok(result?)
    }

    /// Re-reads durable state after a reported storage failure.
    pub async fn reload(&self) -> Result<RenderFrame, SessionError> {
        let result = self.journal.reload().await;
        let frame = self.render().await;
        result?;
        Ok(frame)
    }

    /// Stops playback and releases the session.
    pub async fn teardown(mut self) {
        self.playback.stop().await;
    }
}
