//! Timed playback (slideshow) state machine.
//!
//! # Responsibility
//! - Advance the journal cursor on a fixed period while `Playing`.
//! - Validate and adjust the period.
//!
//! # Invariants
//! - `start`, `stop` and `set_period` are the only state mutators;
//!   `adjust_period` goes through `stop`.
//! - No tick fires after `stop` returns.
//! - An invalid period is replaced by `DEFAULT_PERIOD_SECS` and leaves the
//!   controller `Stopped`.
//! - While `Playing`, `period_secs` is the running ticker's period.
//! - Ticks read and move the cursor through the journal lock, so they never
//!   observe a half-applied mutation.

use crate::service::journal_service::{Journal, JournalView};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Period used initially and after an invalid period is rejected.
pub const DEFAULT_PERIOD_SECS: f64 = 3.0;
/// Smallest accepted period.
pub const MIN_PERIOD_SECS: f64 = 0.1;
const MIN_PLAYABLE_ENTRIES: usize = 2;

/// Observer invoked with the post-tick journal view and the running period.
pub type TickHook = Arc<dyn Fn(&JournalView, f64) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Rejected playback configuration. Locally recoverable.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Playback needs at least two entries.
    TooFewEntries { count: usize },
    /// Period was not a finite, representable number of at least
    /// `MIN_PERIOD_SECS`.
    InvalidPeriod { rejected: f64, reset_to: f64 },
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewEntries { count } => write!(
                f,
                "playback needs at least {MIN_PLAYABLE_ENTRIES} entries, found {count}"
            ),
            Self::InvalidPeriod { rejected, reset_to } => write!(
                f,
                "playback period {rejected} is invalid (minimum {MIN_PERIOD_SECS}s); reset to {reset_to}s"
            ),
        }
    }
}

impl Error for PlaybackError {}

/// Drives circular cursor advance on a timer.
pub struct PlaybackController {
    journal: Arc<Journal>,
    period_secs: f64,
    ticker: Option<JoinHandle<()>>,
    on_tick: Option<TickHook>,
}

impl PlaybackController {
    pub fn new(journal: Arc<Journal>) -> Self {
        Self {
            journal,
            period_secs: DEFAULT_PERIOD_SECS,
            ticker: None,
            on_tick: None,
        }
    }

    /// Installs the observer called after every tick. Applies from the next `start`.
    pub fn set_tick_hook(&mut self, hook: TickHook) {
        self.on_tick = Some(hook);
    }

    pub fn state(&self) -> PlaybackState {
        match &self.ticker {
            Some(handle) if !handle.is_finished() => PlaybackState::Playing,
            _ => PlaybackState::Stopped,
        }
    }

    pub fn period_secs(&self) -> f64 {
        self.period_secs
    }

    /// Cancels any running ticker and sets the period without starting
    /// playback.
    ///
    /// An invalid value resets the period to the default and is reported.
    pub fn set_period(&mut self, period_secs: f64) -> Result<(), PlaybackError> {
        self.cancel_ticker();
        self.period_secs = self.checked_period(period_secs)?;
        Ok(())
    }

    /// Starts (or restarts) playback with `period_secs`.
    ///
    /// # Errors
    /// - `InvalidPeriod` when the period is not finite or below the minimum;
    ///   a running ticker is stopped and the stored period is reset to the
    ///   default.
    /// - `TooFewEntries` when the journal holds fewer than two entries.
    pub async fn start(&mut self, period_secs: f64) -> Result<(), PlaybackError> {
        let period_secs = match self.checked_period(period_secs) {
            Ok(period_secs) => period_secs,
            Err(err) => {
                // The reset period must describe the ticker, so none may keep running.
                self.stop().await;
                return Err(err);
            }
        };

        let count = self.journal.len().await;
        if count < MIN_PLAYABLE_ENTRIES {
            info!("event=playback_start module=playback status=rejected reason=too_few_entries count={count}");
            return Err(PlaybackError::TooFewEntries { count });
        }

        self.stop().await;
        self.period_secs = period_secs;

        let journal = Arc::clone(&self.journal);
        let hook = self.on_tick.clone();
        let period = Duration::from_secs_f64(period_secs);
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let view = journal.step(1).await;
                if let Some(hook) = &hook {
                    hook(&view, period_secs);
                }
            }
        }));

        info!("event=playback_start module=playback status=ok period_secs={period_secs}");
        Ok(())
    }

    /// Cancels the ticker. Idempotent.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            // Awaiting the aborted task guarantees it can no longer tick.
            let _ = handle.await;
            info!("event=playback_stop module=playback status=ok");
        }
    }

    /// Stops when playing, otherwise starts with the current period.
    pub async fn toggle(&mut self) -> Result<PlaybackState, PlaybackError> {
        if self.state() == PlaybackState::Playing {
            self.stop().await;
            return Ok(PlaybackState::Stopped);
        }
        self.start(self.period_secs).await?;
        Ok(PlaybackState::Playing)
    }

    /// Stops playback and shifts the period by `delta` seconds.
    ///
    /// The result is rounded to one decimal place and floored at
    /// `MIN_PERIOD_SECS`.
    pub async fn adjust_period(&mut self, delta: f64) -> Result<f64, PlaybackError> {
        self.stop().await;

        if !delta.is_finite() {
            self.period_secs = DEFAULT_PERIOD_SECS;
            warn!("event=playback_period module=playback status=rejected reason=non_finite_delta");
            return Err(PlaybackError::InvalidPeriod {
                rejected: delta,
                reset_to: DEFAULT_PERIOD_SECS,
            });
        }

        self.period_secs = round_to_tenth(self.period_secs + delta).max(MIN_PERIOD_SECS);
        info!(
            "event=playback_period module=playback status=ok period_secs={}",
            self.period_secs
        );
        Ok(self.period_secs)
    }

    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            info!("event=playback_stop module=playback status=ok");
        }
    }

    fn checked_period(&mut self, period_secs: f64) -> Result<f64, PlaybackError> {
        if period_secs >= MIN_PERIOD_SECS && Duration::try_from_secs_f64(period_secs).is_ok() {
            return Ok(period_secs);
        }

        self.period_secs = DEFAULT_PERIOD_SECS;
        warn!("event=playback_period module=playback status=rejected reason=invalid_period");
        Err(PlaybackError::InvalidPeriod {
            rejected: period_secs,
            reset_to: DEFAULT_PERIOD_SECS,
        })
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
