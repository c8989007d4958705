use photolog_core::{
    BackendConfig, ErrorKind, MediaInput, PlaybackState, RenderFrame, Session, SessionConfig,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn image(label: &str) -> MediaInput {
    MediaInput::from_bytes(label, format!("pixels of {label}").into_bytes())
}

fn recorded_session(config: &SessionConfig) -> (Session, Arc<Mutex<Vec<RenderFrame>>>) {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&frames);
    let mut session = Session::open(config).unwrap();
    session.set_render_hook(Arc::new(move |frame: &RenderFrame| {
        sink.lock().unwrap().push(frame.clone());
    }));
    (session, frames)
}

#[tokio::test]
async fn submit_into_empty_session_renders_new_entry() {
    let (session, frames) = recorded_session(&SessionConfig::default());
    let initial = session.initialize().await.unwrap();
    assert_eq!(initial.len, 0);
    assert_eq!(initial.current, None);

    let report = session
        .submit_new_entry(vec![image("img")], "2025-01-10", "day one")
        .await
        .unwrap();
    assert!(report.is_complete_success());

    let frames = frames.lock().unwrap();
    assert_eq!(frames.len(), 2);
    let last = frames.last().unwrap();
    assert_eq!(last.len, 1);
    assert_eq!(last.index, Some(0));
    assert_eq!(last.current.as_ref().unwrap().note, "day one");
    assert_eq!(last.playback, PlaybackState::Stopped);
}

#[tokio::test]
async fn steps_wrap_and_render_each_time() {
    let (session, frames) = recorded_session(&SessionConfig::default());
    session.initialize().await.unwrap();
    session
        .submit_new_entry(
            vec![image("a"), image("b"), image("c")],
            "2025-01-10",
            "",
        )
        .await
        .unwrap();
    assert_eq!(session.frame().await.index, Some(2));

    assert_eq!(session.step_next().await.index, Some(0));
    assert_eq!(session.step_previous().await.index, Some(2));
    assert_eq!(frames.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn failures_are_classified_and_still_render() {
    let (mut session, frames) = recorded_session(&SessionConfig::default());
    session.initialize().await.unwrap();

    let err = session.delete_current_entry().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = session
        .submit_new_entry(Vec::new(), "2025-01-10", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = session.toggle_autoplay().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = session.initialize().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);

    assert_eq!(frames.lock().unwrap().len(), 5);
}

#[tokio::test]
async fn delete_and_clear_run_without_confirmation() {
    let (session, _frames) = recorded_session(&SessionConfig::default());
    session.initialize().await.unwrap();
    session
        .submit_new_entry(vec![image("a"), image("b")], "2025-01-10", "")
        .await
        .unwrap();

    let removed = session.delete_current_entry().await.unwrap();
    assert_eq!(session.frame().await.len, 1);
    assert_ne!(session.frame().await.current.unwrap().id, removed.id);

    session.clear_all_entries().await.unwrap();
    let frame = session.frame().await;
    assert_eq!(frame.len, 0);
    assert_eq!(frame.index, None);
}

#[tokio::test(start_paused = true)]
async fn autoplay_ticks_push_playing_frames() {
    let config = SessionConfig {
        autoplay_period_secs: 2.0,
        ..SessionConfig::default()
    };
    let (mut session, frames) = recorded_session(&config);
    session.initialize().await.unwrap();
    session
        .submit_new_entry(vec![image("a"), image("b")], "2025-01-10", "")
        .await
        .unwrap();

    assert_eq!(
        session.toggle_autoplay().await.unwrap(),
        PlaybackState::Playing
    );
    frames.lock().unwrap().clear();

    tokio::time::sleep(Duration::from_millis(4_500)).await;
    {
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames
            .iter()
            .all(|frame| frame.playback == PlaybackState::Playing && frame.period_secs == 2.0));
        assert_eq!(frames[0].index, Some(0));
        assert_eq!(frames[1].index, Some(1));
    }

    let period = session.adjust_period(0.5).await.unwrap();
    assert_eq!(period, 2.5);
    assert_eq!(session.playback_state(), PlaybackState::Stopped);
    session.teardown().await;
}

#[tokio::test]
async fn blob_backend_session_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::from_json_str(&format!(
        r#"{{
            "backend": {{ "kind": "blob", "dir": {:?}, "key": "records" }},
            "seed": [{{ "date": "2025-10-01", "note": "first day", "media": "image1.jpg" }}]
        }}"#,
        dir.path().to_str().unwrap()
    ))
    .unwrap();
    assert!(matches!(config.backend, BackendConfig::Blob { .. }));

    {
        let session = Session::open(&config).unwrap();
        let frame = session.initialize().await.unwrap();
        assert_eq!(frame.current.unwrap().note, "first day");
        session
            .submit_new_entry(vec![image("a")], "2025-10-02", "second day")
            .await
            .unwrap();
        session.teardown().await;
    }

    let session = Session::open(&config).unwrap();
    let frame = session.reload().await.unwrap();
    assert_eq!(frame.len, 2);
    assert_eq!(frame.current.unwrap().note, "second day");
}
