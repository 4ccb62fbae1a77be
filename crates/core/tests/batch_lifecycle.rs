//! Batch lifecycle integration tests.
//!
//! These tests drive a whole batch through the orchestrator:
//! submit -> loading engine -> converting each item -> completed / failed -> reset

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use movshift_core::{
    testing::{fixtures, MockDownloadHost, MockEngine},
    BatchEvent, BatchOrchestrator, ItemStatus, OrchestratorConfig, OrchestratorError, Phase,
};

/// Test helper holding the orchestrator and handles to its mocks.
struct TestHarness {
    engine: MockEngine,
    host: Arc<MockDownloadHost>,
    orchestrator: Arc<BatchOrchestrator<MockEngine>>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(fixtures::fast_config())
    }

    fn with_config(config: OrchestratorConfig) -> Self {
        let engine = MockEngine::new();
        let host = Arc::new(MockDownloadHost::new());
        let orchestrator = Arc::new(fixtures::orchestrator_with(
            config,
            engine.clone(),
            host.clone(),
        ));
        Self {
            engine,
            host,
            orchestrator,
        }
    }

    async fn statuses(&self) -> Vec<ItemStatus> {
        self.orchestrator
            .snapshot()
            .await
            .items
            .iter()
            .map(|item| item.status)
            .collect()
    }
}

fn drain(rx: &mut broadcast::Receiver<BatchEvent>) -> Vec<BatchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Compact labels for the events whose order matters.
fn labels(events: &[BatchEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::PhaseChanged { phase } => Some(format!("phase:{}", phase)),
            BatchEvent::ItemStarted { index, .. } => Some(format!("start:{}", index)),
            BatchEvent::ItemCompleted { index, .. } => Some(format!("done:{}", index)),
            BatchEvent::Progress { percent } => Some(format!("progress:{}", percent)),
            BatchEvent::Completed { converted } => Some(format!("completed:{}", converted)),
            BatchEvent::Failed { .. } => Some("failed".to_string()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_batch_converts_every_file_in_order() {
    let h = TestHarness::new();

    let accepted = h
        .orchestrator
        .submit(vec![
            fixtures::mov("a.mov", b"first"),
            fixtures::mov("b.MOV", b"second"),
            fixtures::mov("c.mov", b"third"),
        ])
        .await
        .unwrap();
    assert_eq!(accepted, 3);

    let results = h.orchestrator.run_batch().await.unwrap();

    let names: Vec<&str> = results.iter().map(|r| r.target_name.as_str()).collect();
    assert_eq!(names, vec!["a.mp4", "b.mp4", "c.mp4"]);
    assert_eq!(results[1].blob.as_bytes(), b"mp4:second");
    assert_eq!(results[0].blob.media_type(), "video/mp4");

    assert_eq!(h.host.filenames(), vec!["a.mp4", "b.mp4", "c.mp4"]);
    assert_eq!(h.engine.runs().await.len(), 3);
    assert!(h.engine.entries().await.is_empty());

    let snapshot = h.orchestrator.snapshot().await;
    assert_eq!(snapshot.phase, Phase::Completed);
    assert_eq!(snapshot.progress_percent, 100);
    assert_eq!(snapshot.converted, 3);
    assert_eq!(snapshot.message.as_deref(), Some("Converted 3 of 3 files"));
    assert!(snapshot.finished_at.is_some());
    assert_eq!(h.statuses().await, vec![ItemStatus::Done; 3]);
}

#[tokio::test]
async fn test_working_names_are_indexed() {
    let h = TestHarness::new();
    h.orchestrator
        .submit(vec![
            fixtures::mov("Holiday.MOV", b"x"),
            fixtures::mov("b.mov", b"y"),
        ])
        .await
        .unwrap();
    h.orchestrator.run_batch().await.unwrap();

    assert_eq!(h.engine.written().await, vec!["input_0.mov", "input_1.mov"]);
    let runs = h.engine.runs().await;
    assert_eq!(runs[0].first().map(String::as_str), Some("-i"));
    assert_eq!(runs[0].last().map(String::as_str), Some("output_0.mp4"));
    assert_eq!(runs[1].last().map(String::as_str), Some("output_1.mp4"));
}

#[tokio::test]
async fn test_non_matching_files_are_dropped() {
    let h = TestHarness::new();

    let accepted = h
        .orchestrator
        .submit(vec![
            fixtures::mov("notes.txt", b"text"),
            fixtures::mov("clip.mov", b"video"),
            fixtures::mov("movie.mp4", b"already"),
        ])
        .await
        .unwrap();
    assert_eq!(accepted, 1);

    let snapshot = h.orchestrator.snapshot().await;
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].name, "clip.mov");
    assert_eq!(snapshot.items[0].target_name, "clip.mp4");
}

#[tokio::test]
async fn test_rejected_selection_keeps_previous_batch() {
    let h = TestHarness::new();
    let mut events = h.orchestrator.subscribe();

    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x")])
        .await
        .unwrap();
    h.orchestrator.run_batch().await.unwrap();
    let before = h.orchestrator.snapshot().await;
    drain(&mut events);

    let err = h
        .orchestrator
        .submit(vec![fixtures::mov("readme.md", b"x")])
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Intake(_)));
    assert_eq!(err.to_string(), "no .mov files were selected");

    let after = h.orchestrator.snapshot().await;
    assert_eq!(after.batch_id, before.batch_id);
    assert_eq!(after.phase, Phase::Completed);
    assert_eq!(h.orchestrator.results().await.len(), 1);

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], BatchEvent::IntakeRejected { .. }));
}

#[tokio::test]
async fn test_new_selection_replaces_batch_and_results() {
    let h = TestHarness::new();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x")])
        .await
        .unwrap();
    h.orchestrator.run_batch().await.unwrap();
    let first = h.orchestrator.snapshot().await.batch_id;

    h.orchestrator
        .submit(vec![
            fixtures::mov("b.mov", b"y"),
            fixtures::mov("c.mov", b"z"),
        ])
        .await
        .unwrap();

    let snapshot = h.orchestrator.snapshot().await;
    assert_ne!(snapshot.batch_id, first);
    assert_eq!(snapshot.phase, Phase::Idle);
    assert_eq!(snapshot.items.len(), 2);
    assert!(h.orchestrator.results().await.is_empty());
}

#[tokio::test]
async fn test_failure_stops_batch_at_failed_item() {
    let h = TestHarness::new();
    h.orchestrator
        .submit(vec![
            fixtures::mov("a.mov", b"ok"),
            fixtures::corrupt_mov("b.mov"),
            fixtures::mov("c.mov", b"never"),
        ])
        .await
        .unwrap();

    let err = h.orchestrator.run_batch().await.unwrap_err();
    match &err {
        OrchestratorError::Conversion(e) => {
            assert_eq!(e.index, 1);
            assert_eq!(e.total, 3);
            assert_eq!(e.file_name, "b.mov");
        }
        other => panic!("expected conversion error, got {:?}", other),
    }

    let results = h.orchestrator.results().await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].target_name, "a.mp4");
    assert_eq!(h.host.filenames(), vec!["a.mp4"]);
    assert_eq!(h.engine.runs().await.len(), 2);
    assert!(h.engine.entries().await.is_empty());

    assert_eq!(
        h.statuses().await,
        vec![ItemStatus::Done, ItemStatus::Failed, ItemStatus::Pending]
    );

    let snapshot = h.orchestrator.snapshot().await;
    assert_eq!(snapshot.phase, Phase::Failed);
    let message = snapshot.message.unwrap_or_default();
    assert!(message.starts_with("Error: failed to convert b.mov (file 2 of 3)"));
}

#[tokio::test]
async fn test_failed_batch_can_be_run_again() {
    let h = TestHarness::new();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"ok"), fixtures::corrupt_mov("b.mov")])
        .await
        .unwrap();

    assert!(h.orchestrator.run_batch().await.is_err());
    assert!(h.orchestrator.run_batch().await.is_err());

    // The second run starts over instead of appending.
    assert_eq!(h.orchestrator.results().await.len(), 1);
    assert_eq!(h.host.filenames(), vec!["a.mp4", "a.mp4"]);
    assert_eq!(h.engine.load_count(), 1);
}

#[tokio::test]
async fn test_engine_load_failure_attempts_no_items() {
    let h = TestHarness::new();
    h.engine.fail_next_loads(1).await;
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x"), fixtures::mov("b.mov", b"y")])
        .await
        .unwrap();

    let err = h.orchestrator.run_batch().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::EngineLoad(_)));
    assert!(h.engine.runs().await.is_empty());
    assert!(h.host.downloads().is_empty());
    assert_eq!(h.statuses().await, vec![ItemStatus::Pending; 2]);
    assert_eq!(h.orchestrator.phase().await, Phase::Failed);

    // The next run retries the load.
    let results = h.orchestrator.run_batch().await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(h.engine.load_count(), 2);
}

#[tokio::test]
async fn test_engine_loads_once_across_batches() {
    let h = TestHarness::new();
    for name in ["a.mov", "b.mov"] {
        h.orchestrator
            .submit(vec![fixtures::mov(name, b"x")])
            .await
            .unwrap();
        h.orchestrator.run_batch().await.unwrap();
    }
    assert_eq!(h.engine.load_count(), 1);
}

#[tokio::test]
async fn test_run_without_batch() {
    let h = TestHarness::new();
    let err = h.orchestrator.run_batch().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NoBatch));
    assert_eq!(h.orchestrator.phase().await, Phase::Idle);
}

#[tokio::test]
async fn test_reset_returns_to_initial_state() {
    let h = TestHarness::new();
    let mut events = h.orchestrator.subscribe();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x")])
        .await
        .unwrap();
    h.orchestrator.run_batch().await.unwrap();

    h.orchestrator.reset().await.unwrap();

    let snapshot = h.orchestrator.snapshot().await;
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.batch_id.is_none());
    assert!(snapshot.items.is_empty());
    assert_eq!(snapshot.progress_percent, 0);
    assert!(snapshot.message.is_none());
    assert!(h.orchestrator.results().await.is_empty());
    assert!(matches!(
        drain(&mut events).last(),
        Some(BatchEvent::Reset)
    ));

    let err = h.orchestrator.run_batch().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NoBatch));
}

#[tokio::test]
async fn test_reset_discards_unrun_batch() {
    let h = TestHarness::new();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x")])
        .await
        .unwrap();

    h.orchestrator.reset().await.unwrap();

    let snapshot = h.orchestrator.snapshot().await;
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.items.is_empty());
    assert!(matches!(
        h.orchestrator.run_batch().await,
        Err(OrchestratorError::NoBatch)
    ));
    assert_eq!(h.engine.load_count(), 0);
}

#[tokio::test]
async fn test_resubmit_after_reset_starts_fresh() {
    let h = TestHarness::new();
    let files = || vec![fixtures::mov("a.mov", b"x"), fixtures::corrupt_mov("b.mov")];

    h.orchestrator.submit(files()).await.unwrap();
    h.orchestrator.run_batch().await.unwrap_err();
    let first = h.orchestrator.snapshot().await.batch_id;

    h.orchestrator.reset().await.unwrap();
    h.orchestrator.submit(files()).await.unwrap();

    let snapshot = h.orchestrator.snapshot().await;
    assert_ne!(snapshot.batch_id, first);
    assert_eq!(h.statuses().await, vec![ItemStatus::Pending; 2]);
    assert!(h.orchestrator.results().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_operations_rejected_while_running() {
    let h = TestHarness::new();
    h.engine.set_run_delay(Duration::from_millis(50)).await;
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x"), fixtures::mov("b.mov", b"y")])
        .await
        .unwrap();

    let running = tokio::spawn({
        let orchestrator = Arc::clone(&h.orchestrator);
        async move { orchestrator.run_batch().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(h.orchestrator.phase().await.is_running());

    assert!(matches!(
        h.orchestrator.run_batch().await,
        Err(OrchestratorError::InvalidState { .. })
    ));
    assert!(matches!(
        h.orchestrator.reset().await,
        Err(OrchestratorError::InvalidState { .. })
    ));
    assert!(matches!(
        h.orchestrator.submit(vec![fixtures::mov("c.mov", b"z")]).await,
        Err(OrchestratorError::InvalidState { .. })
    ));

    let results = running.await.unwrap().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(h.engine.runs().await.len(), 2);
}

#[tokio::test]
async fn test_event_sequence() {
    let h = TestHarness::new();
    let mut events = h.orchestrator.subscribe();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x"), fixtures::mov("b.mov", b"y")])
        .await
        .unwrap();
    drain(&mut events);

    h.orchestrator.run_batch().await.unwrap();
    let events = drain(&mut events);

    assert_eq!(
        labels(&events),
        vec![
            "phase:loading_engine",
            "phase:converting",
            "start:0",
            "done:0",
            "progress:50",
            "start:1",
            "done:1",
            "progress:100",
            "phase:completed",
            "completed:2",
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, BatchEvent::ItemProgress { index: 1, .. })));
}

#[tokio::test]
async fn test_failure_event_sequence() {
    let h = TestHarness::new();
    let mut events = h.orchestrator.subscribe();
    h.orchestrator
        .submit(vec![fixtures::corrupt_mov("a.mov"), fixtures::mov("b.mov", b"y")])
        .await
        .unwrap();
    drain(&mut events);

    h.orchestrator.run_batch().await.unwrap_err();

    assert_eq!(
        labels(&drain(&mut events)),
        vec![
            "phase:loading_engine",
            "phase:converting",
            "start:0",
            "phase:failed",
            "failed",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_download_references_are_released() {
    let h = TestHarness::new();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x"), fixtures::mov("b.mov", b"y")])
        .await
        .unwrap();
    h.orchestrator.run_batch().await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.host.created_count(), 2);
    assert_eq!(h.host.live_references(), 0);
    assert_eq!(h.host.released().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_pause_between_items_after_download() {
    let h = TestHarness::with_config(OrchestratorConfig {
        inter_item_delay_ms: 500,
        ..OrchestratorConfig::default()
    });
    let mut events = h.orchestrator.subscribe();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x"), fixtures::mov("b.mov", b"y")])
        .await
        .unwrap();
    drain(&mut events);

    let started = tokio::time::Instant::now();
    let running = tokio::spawn({
        let orchestrator = Arc::clone(&h.orchestrator);
        async move { orchestrator.run_batch().await }
    });

    // First file is downloaded, the second has not been touched yet.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(h.host.filenames(), vec!["a.mp4"]);
    assert_eq!(h.engine.written().await.len(), 1);
    assert_eq!(h.engine.runs().await.len(), 1);
    assert_eq!(
        labels(&drain(&mut events)),
        vec!["phase:loading_engine", "phase:converting", "start:0"]
    );

    // After the pause the first item completes and the second one starts.
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(h.engine.runs().await.len(), 2);
    assert_eq!(h.host.filenames(), vec!["a.mp4", "b.mp4"]);
    assert_eq!(
        labels(&drain(&mut events)),
        vec!["done:0", "progress:50", "start:1"]
    );

    let results = running.await.unwrap().unwrap();
    assert_eq!(results.len(), 2);
    assert!(started.elapsed() >= Duration::from_millis(1000));
    assert_eq!(
        labels(&drain(&mut events)),
        vec!["done:1", "progress:100", "phase:completed", "completed:2"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_engine_load_progress_is_forwarded() {
    let h = TestHarness::new();
    h.engine.set_load_delay(Duration::from_millis(50)).await;
    let mut events = h.orchestrator.subscribe();
    h.orchestrator
        .submit(vec![fixtures::mov("a.mov", b"x"), fixtures::mov("b.mov", b"y")])
        .await
        .unwrap();
    drain(&mut events);

    h.orchestrator.run_batch().await.unwrap();
    let events = drain(&mut events);

    let position = |wanted: Phase| {
        events
            .iter()
            .position(|e| matches!(e, BatchEvent::PhaseChanged { phase } if *phase == wanted))
            .unwrap()
    };
    let loading = position(Phase::LoadingEngine);
    let converting = position(Phase::Converting);

    let load_events: Vec<(usize, f32)> = events
        .iter()
        .enumerate()
        .filter_map(|(i, e)| match e {
            BatchEvent::EngineLoadProgress { ratio } => Some((i, *ratio)),
            _ => None,
        })
        .collect();
    assert!(!load_events.is_empty());
    for (i, ratio) in &load_events {
        assert!(*i > loading && *i < converting);
        assert!((0.0..=1.0).contains(ratio));
    }

    // Aggregate progress only counts converted items.
    let percents: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![50, 100]);
}
