use chrono::NaiveDate;
use photolog_core::{DatePolicy, IngestError, IngestPipeline, Journal, MediaInput, SqliteStore};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

async fn empty_journal() -> Journal {
    let journal = Journal::new(SqliteStore::open_in_memory().unwrap());
    journal.initialize().await.unwrap();
    journal
}

#[tokio::test]
async fn single_input_uses_manual_date_and_note() {
    let journal = empty_journal().await;
    let pipeline = IngestPipeline::new(DatePolicy::PreferIntrinsic);
    let input =
        MediaInput::from_bytes("img.png", PNG_MAGIC.to_vec()).with_captured_on(date("2020-05-05"));

    let report = pipeline
        .submit(&journal, vec![input], "2025-01-10", "day one")
        .await
        .unwrap();

    assert!(report.is_complete_success());
    let entry = report.succeeded().next().unwrap();
    assert_eq!(entry.date, date("2025-01-10"));
    assert_eq!(entry.note, "day one");
    assert_eq!(entry.media.mime_type(), Some("image/png"));
    assert_eq!(entry.media.decode().unwrap(), PNG_MAGIC);

    let view = journal.view().await;
    assert_eq!(view.index, Some(0));
    assert_eq!(view.current.unwrap().id, entry.id);
}

#[tokio::test]
async fn multiple_inputs_prefer_intrinsic_dates() {
    let journal = empty_journal().await;
    let pipeline = IngestPipeline::new(DatePolicy::PreferIntrinsic);
    let inputs = vec![
        MediaInput::from_bytes("a.png", PNG_MAGIC.to_vec()).with_captured_on(date("2024-07-04")),
        MediaInput::from_bytes("b.bin", b"raw bytes".to_vec()),
    ];

    let report = pipeline
        .submit(&journal, inputs, "2025-01-10", "trip")
        .await
        .unwrap();

    assert!(report.is_complete_success());
    let dates = report
        .succeeded()
        .map(|entry| entry.date)
        .collect::<Vec<_>>();
    assert_eq!(dates, vec![date("2024-07-04"), date("2025-01-10")]);

    let ordered = journal
        .entries()
        .await
        .into_iter()
        .map(|entry| entry.date)
        .collect::<Vec<_>>();
    assert_eq!(ordered, vec![date("2024-07-04"), date("2025-01-10")]);
    assert!(journal.entries().await.iter().all(|entry| entry.note == "trip"));
}

#[tokio::test]
async fn always_manual_policy_ignores_intrinsic_dates() {
    let journal = empty_journal().await;
    let pipeline = IngestPipeline::new(DatePolicy::AlwaysManual);
    let inputs = vec![
        MediaInput::from_bytes("a.png", PNG_MAGIC.to_vec()).with_captured_on(date("2024-07-04")),
        MediaInput::from_bytes("b.png", PNG_MAGIC.to_vec()).with_captured_on(date("2023-01-01")),
    ];

    let report = pipeline
        .submit(&journal, inputs, "2025-01-10", "")
        .await
        .unwrap();

    assert!(report
        .succeeded()
        .all(|entry| entry.date == date("2025-01-10")));
}

#[tokio::test]
async fn failed_item_does_not_abort_siblings() {
    let journal = empty_journal().await;
    let pipeline = IngestPipeline::new(DatePolicy::PreferIntrinsic);
    let inputs = vec![
        MediaInput::from_bytes("good.png", PNG_MAGIC.to_vec()),
        MediaInput::from_bytes("empty.png", Vec::new()),
        MediaInput::from_path("/nonexistent/photolog/missing.jpg"),
    ];

    let report = pipeline
        .submit(&journal, inputs, "2025-01-10", "")
        .await
        .unwrap();

    assert!(!report.is_complete_success());
    assert_eq!(report.succeeded().count(), 1);
    let failed = report.failed().collect::<Vec<_>>();
    assert_eq!(failed.len(), 2);
    assert!(matches!(failed[0], ("empty.png", IngestError::EmptyMedia(_))));
    assert!(matches!(failed[1], ("missing.jpg", IngestError::Io { .. })));
    assert_eq!(journal.len().await, 1);
}

#[tokio::test]
async fn invalid_manual_date_is_reported_per_item() {
    let journal = empty_journal().await;
    let pipeline = IngestPipeline::default();

    let report = pipeline
        .submit(
            &journal,
            vec![MediaInput::from_bytes("img.png", PNG_MAGIC.to_vec())],
            "",
            "no date",
        )
        .await
        .unwrap();

    let (label, err) = report.failed().next().unwrap();
    assert_eq!(label, "img.png");
    assert!(matches!(err, IngestError::Journal(_)));
    assert!(journal.is_empty().await);
}

#[tokio::test]
async fn empty_submission_is_rejected() {
    let journal = empty_journal().await;
    let err = IngestPipeline::default()
        .submit(&journal, Vec::new(), "2025-01-10", "")
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::NoInputs));
    assert!(journal.is_empty().await);
}

#[tokio::test]
async fn path_input_is_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beach.png");
    std::fs::write(&path, PNG_MAGIC).unwrap();
    let journal = empty_journal().await;

    let report = IngestPipeline::default()
        .submit(
            &journal,
            vec![MediaInput::from_path(&path)],
            "2025-06-01",
            "beach",
        )
        .await
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.label, "beach.png");
    let entry = outcome.result.as_ref().unwrap();
    assert_eq!(entry.date, date("2025-06-01"));
    assert_eq!(entry.media.decode().unwrap(), PNG_MAGIC);
}
