use photolog_core::{
    EntryDraft, Journal, JournalView, MediaPayload, PlaybackController, PlaybackError,
    PlaybackState, SqliteStore, DEFAULT_PERIOD_SECS,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn journal_with(dates: &[&str]) -> Arc<Journal> {
    let journal = Journal::new(SqliteStore::open_in_memory().unwrap());
    journal.initialize().await.unwrap();
    for date in dates {
        journal
            .add(&EntryDraft::new(*date, *date, MediaPayload::encode(b"img")))
            .await
            .unwrap();
    }
    Arc::new(journal)
}

fn recording_hook(controller: &mut PlaybackController) -> Arc<Mutex<Vec<Option<usize>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    controller.set_tick_hook(Arc::new(move |view: &JournalView, _period: f64| {
        sink.lock().unwrap().push(view.index);
    }));
    seen
}

#[tokio::test(start_paused = true)]
async fn ticks_advance_cursor_circularly() {
    let journal = journal_with(&["2025-01-01", "2025-01-02", "2025-01-03"]).await;
    journal.step(1).await;
    let mut controller = PlaybackController::new(Arc::clone(&journal));
    let seen = recording_hook(&mut controller);

    controller.start(3.0).await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);

    tokio::time::sleep(Duration::from_millis(9_500)).await;

    assert_eq!(*seen.lock().unwrap(), vec![Some(1), Some(2), Some(0)]);
    assert_eq!(journal.view().await.index, Some(0));
    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn no_tick_after_stop() {
    let journal = journal_with(&["2025-01-01", "2025-01-02"]).await;
    let mut controller = PlaybackController::new(Arc::clone(&journal));
    let seen = recording_hook(&mut controller);

    controller.start(1.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    controller.stop().await;
    let ticks_at_stop = seen.lock().unwrap().len();
    let index_at_stop = journal.view().await.index;

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(ticks_at_stop, 1);
    assert_eq!(seen.lock().unwrap().len(), ticks_at_stop);
    assert_eq!(journal.view().await.index, index_at_stop);
    assert_eq!(controller.state(), PlaybackState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let journal = journal_with(&["2025-01-01", "2025-01-02"]).await;
    let mut controller = PlaybackController::new(journal);

    controller.stop().await;
    assert_eq!(controller.state(), PlaybackState::Stopped);

    controller.start(2.0).await.unwrap();
    controller.stop().await;
    controller.stop().await;
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.period_secs(), 2.0);
}

#[tokio::test(start_paused = true)]
async fn restart_replaces_running_ticker() {
    let journal = journal_with(&["2025-01-01", "2025-01-02", "2025-01-03"]).await;
    let mut controller = PlaybackController::new(Arc::clone(&journal));
    let seen = recording_hook(&mut controller);

    controller.start(1.0).await.unwrap();
    controller.start(5.0).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(controller.period_secs(), 5.0);
    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn single_entry_is_not_playable() {
    let journal = journal_with(&["2025-01-10"]).await;
    let mut controller = PlaybackController::new(journal);

    let err = controller.start(2.5).await.unwrap_err();

    assert_eq!(err, PlaybackError::TooFewEntries { count: 1 });
    assert_eq!(controller.state(), PlaybackState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn too_short_period_is_rejected_and_reset() {
    let journal = journal_with(&["2025-01-01", "2025-01-02"]).await;
    let mut controller = PlaybackController::new(journal);
    controller.set_period(1.5).unwrap();

    let err = controller.start(0.05).await.unwrap_err();

    assert_eq!(
        err,
        PlaybackError::InvalidPeriod {
            rejected: 0.05,
            reset_to: DEFAULT_PERIOD_SECS
        }
    );
    assert_eq!(controller.period_secs(), 3.0);
    assert_eq!(controller.state(), PlaybackState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn invalid_period_while_playing_stops_the_running_ticker() {
    let journal = journal_with(&["2025-01-01", "2025-01-02", "2025-01-03"]).await;
    let mut controller = PlaybackController::new(Arc::clone(&journal));
    let seen = recording_hook(&mut controller);
    controller.start(2.0).await.unwrap();

    let err = controller.start(0.05).await.unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidPeriod { .. }));
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.period_secs(), DEFAULT_PERIOD_SECS);

    let index_after_reject = journal.view().await.index;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(journal.view().await.index, index_after_reject);
}

#[tokio::test(start_paused = true)]
async fn set_period_cancels_running_ticker() {
    let journal = journal_with(&["2025-01-01", "2025-01-02"]).await;
    let mut controller = PlaybackController::new(Arc::clone(&journal));
    let seen = recording_hook(&mut controller);
    controller.start(2.0).await.unwrap();

    assert!(controller.set_period(0.05).is_err());
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.period_secs(), DEFAULT_PERIOD_SECS);

    controller.start(1.0).await.unwrap();
    controller.set_period(4.0).unwrap();
    assert_eq!(controller.state(), PlaybackState::Stopped);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn non_finite_period_is_rejected() {
    let journal = journal_with(&["2025-01-01", "2025-01-02"]).await;
    let mut controller = PlaybackController::new(journal);

    assert!(controller.start(f64::NAN).await.is_err());
    assert!(controller.start(f64::INFINITY).await.is_err());
    assert!(controller.start(1e300).await.is_err());
    assert_eq!(controller.period_secs(), DEFAULT_PERIOD_SECS);
}

#[tokio::test(start_paused = true)]
async fn adjust_period_stops_rounds_and_floors() {
    let journal = journal_with(&["2025-01-01", "2025-01-02"]).await;
    let mut controller = PlaybackController::new(journal);
    controller.start(3.0).await.unwrap();

    assert_eq!(controller.adjust_period(-0.1).await.unwrap(), 2.9);
    assert_eq!(controller.state(), PlaybackState::Stopped);

    assert_eq!(controller.adjust_period(0.4).await.unwrap(), 3.3);
    assert_eq!(controller.adjust_period(-10.0).await.unwrap(), 0.1);
    assert!(controller.adjust_period(f64::NAN).await.is_err());
    assert_eq!(controller.period_secs(), DEFAULT_PERIOD_SECS);
}

#[tokio::test(start_paused = true)]
async fn toggle_flips_between_states() {
    let journal = journal_with(&["2025-01-01", "2025-01-02"]).await;
    let mut controller = PlaybackController::new(journal);

    assert_eq!(controller.toggle().await.unwrap(), PlaybackState::Playing);
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert_eq!(controller.toggle().await.unwrap(), PlaybackState::Stopped);
    assert_eq!(controller.state(), PlaybackState::Stopped);
}
