//! Integration tests for the bounded extraction executor and orchestration
//!
//! All tests drive the executor through fake ports, so no ffmpeg/ffprobe
//! binaries are required.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use framegrab_cli::error::{FrameGrabError, FrameGrabResult};
use framegrab_cli::events::{EventType, VideoEvent};
use framegrab_cli::extract::{
    bind_outcomes, extract_event_screenshots, run_plan, CaptureSettings, ExtractorConfig,
};
use framegrab_cli::planner::ExtractionTask;
use framegrab_cli::ports::{FrameCapturer, InspectMode, MediaInspector};

// Test utilities

/// Capturer that simulates the external tool: optional delay, per-timestamp
/// failures, and in-flight accounting for concurrency assertions.
struct FakeCapturer {
    delay: Duration,
    fail_timestamps: HashSet<u64>,
    /// Timestamps that exit zero but produce no file
    silent_timestamps: HashSet<u64>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeCapturer {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            fail_timestamps: HashSet::new(),
            silent_timestamps: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(delay: Duration, fail: &[u64]) -> Arc<Self> {
        Arc::new(Self {
            delay,
            fail_timestamps: fail.iter().copied().collect(),
            silent_timestamps: HashSet::new(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    fn silent(delay: Duration, silent: &[u64]) -> Arc<Self> {
        Arc::new(Self {
            delay,
            fail_timestamps: HashSet::new(),
            silent_timestamps: silent.iter().copied().collect(),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    /// Recover the planned timestamp from the output file name
    fn timestamp_of(dest: &Path) -> u64 {
        let name = dest.file_stem().unwrap().to_str().unwrap();
        let ms_part = name.rsplit('_').next().unwrap();
        ms_part.trim_end_matches("ms").parse().unwrap()
    }
}

#[async_trait]
impl FrameCapturer for FakeCapturer {
    async fn capture(
        &self,
        _asset: &Path,
        _target_secs: f64,
        dest: &Path,
        _settings: &CaptureSettings,
    ) -> FrameGrabResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let ts = Self::timestamp_of(dest);
        if self.fail_timestamps.contains(&ts) {
            return Err(FrameGrabError::CaptureError {
                message: "ffmpeg exited with 1".to_string(),
            });
        }
        if !self.silent_timestamps.contains(&ts) {
            std::fs::write(dest, b"jpeg").unwrap();
        }
        Ok(())
    }
}

/// Inspector with a fixed duration answer (or always failing)
struct FakeInspector {
    duration_secs: Option<f64>,
}

#[async_trait]
impl MediaInspector for FakeInspector {
    async fn inspect(&self, _asset: &Path, mode: InspectMode) -> FrameGrabResult<serde_json::Value> {
        match (self.duration_secs, mode) {
            (Some(secs), InspectMode::FormatMetadata) => {
                Ok(serde_json::json!({"format": {"duration": secs.to_string()}}))
            }
            _ => Err(FrameGrabError::ProbeError {
                message: "ffprobe exited with 1".to_string(),
            }),
        }
    }
}

fn task(dir: &Path, ts: u64, owner: usize) -> ExtractionTask {
    ExtractionTask {
        timestamp_ms: ts,
        target_secs: ts as f64 / 1000.0,
        output_path: dir.join(format!("event_{:03}_{}ms.jpg", owner + 1, ts)),
        owner_index: owner,
    }
}

fn event_at(ts: u64) -> VideoEvent {
    VideoEvent {
        timestamp_ms: Some(ts),
        event_type: Some(EventType::UserAction),
        tool: None,
        description: format!("event at {}ms", ts),
        confidence_score: None,
        audio_transcript: None,
        screenshot_path: None,
    }
}

fn config(max_concurrent: usize, timeout_secs: u64) -> ExtractorConfig {
    ExtractorConfig {
        max_concurrent,
        timeout_secs,
        ..ExtractorConfig::default()
    }
}

// Executor tests

#[tokio::test(start_paused = true)]
async fn test_concurrency_ceiling_is_never_exceeded() {
    let dir = TempDir::new().unwrap();
    let capturer = FakeCapturer::new(Duration::from_millis(50));
    let tasks: Vec<_> = (0..10u64).map(|i| task(dir.path(), i * 1000, i as usize)).collect();

    let outcomes = run_plan(capturer.clone(), Path::new("video.webm"), tasks, &config(2, 30)).await;

    assert_eq!(outcomes.len(), 10);
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 10);
    assert!(capturer.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test(start_paused = true)]
async fn test_one_failure_does_not_disturb_siblings() {
    let dir = TempDir::new().unwrap();
    let capturer = FakeCapturer::failing(Duration::from_millis(10), &[3000]);
    let tasks: Vec<_> = [1000u64, 2000, 3000, 4000, 5000]
        .iter()
        .enumerate()
        .map(|(i, &ts)| task(dir.path(), ts, i))
        .collect();

    let outcomes = run_plan(capturer.clone(), Path::new("video.webm"), tasks, &config(4, 30)).await;

    // Every invocation still ran and every task reported exactly once
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 5);
    assert_eq!(outcomes.len(), 5);
    assert!(!outcomes[&3000].success);
    for ts in [1000u64, 2000, 4000, 5000] {
        assert!(outcomes[&ts].success, "timestamp {} should succeed", ts);
        assert!(outcomes[&ts].artifact.is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn test_outcome_keys_match_the_plan() {
    let dir = TempDir::new().unwrap();
    let capturer = FakeCapturer::failing(Duration::from_millis(5), &[2000, 8000]);
    let planned: Vec<u64> = vec![1000, 2000, 5000, 8000];
    let tasks: Vec<_> = planned
        .iter()
        .enumerate()
        .map(|(i, &ts)| task(dir.path(), ts, i))
        .collect();

    let outcomes = run_plan(capturer, Path::new("video.webm"), tasks, &config(3, 30)).await;

    let keys: HashSet<u64> = outcomes.keys().copied().collect();
    let expected: HashSet<u64> = planned.into_iter().collect();
    assert_eq!(keys, expected);
}

#[tokio::test(start_paused = true)]
async fn test_zero_exit_without_output_file_is_a_failure() {
    let dir = TempDir::new().unwrap();
    let capturer = FakeCapturer::silent(Duration::from_millis(5), &[1000]);
    let tasks = vec![task(dir.path(), 1000, 0)];

    let outcomes = run_plan(capturer, Path::new("video.webm"), tasks, &config(2, 30)).await;

    assert!(!outcomes[&1000].success);
    assert!(outcomes[&1000].artifact.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_slow_capture_times_out_without_blocking_others() {
    let dir = TempDir::new().unwrap();
    // Everything sleeps 2 minutes against a 30s budget
    let slow = FakeCapturer::new(Duration::from_secs(120));
    let fast = FakeCapturer::new(Duration::from_millis(5));

    let outcomes_slow =
        run_plan(slow, Path::new("video.webm"), vec![task(dir.path(), 1000, 0)], &config(2, 30)).await;
    assert!(!outcomes_slow[&1000].success);

    let outcomes_fast =
        run_plan(fast, Path::new("video.webm"), vec![task(dir.path(), 2000, 1)], &config(2, 30)).await;
    assert!(outcomes_fast[&2000].success);
}

// Orchestration tests

#[tokio::test(start_paused = true)]
async fn test_end_to_end_shared_timestamp_binds_all_owners() {
    let video_dir = TempDir::new().unwrap();
    let video = video_dir.path().join("recording.webm");
    std::fs::write(&video, b"webm").unwrap();
    let session = TempDir::new().unwrap();

    // 3 events at exactly 2000ms plus one far away and one transcript
    let mut events = vec![event_at(2000), event_at(2000), event_at(2000), event_at(9000)];
    events.push(VideoEvent {
        event_type: Some(EventType::Transcript),
        ..event_at(2000)
    });

    let inspector = Arc::new(FakeInspector {
        duration_secs: Some(30.0),
    });
    let capturer = FakeCapturer::new(Duration::from_millis(5));

    let summary = extract_event_screenshots(
        inspector,
        capturer.clone(),
        &video,
        &mut events,
        session.path(),
        &ExtractorConfig::default(),
    )
    .await
    .unwrap();

    // One task for the shared cluster, one for 9000ms
    assert_eq!(summary.tasks_planned, 2);
    assert_eq!(summary.tasks_succeeded, 2);
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 2);

    let shared_ref = events[0].screenshot_path.as_deref().unwrap();
    assert_eq!(shared_ref, "screenshots/event_001_2000ms.jpg");
    assert_eq!(events[1].screenshot_path.as_deref(), Some(shared_ref));
    assert_eq!(events[2].screenshot_path.as_deref(), Some(shared_ref));
    assert!(events[3].screenshot_path.is_some());
    // Transcript events never receive a reference
    assert!(events[4].screenshot_path.is_none());

    assert!(session.path().join("screenshots").is_dir());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_duration_disables_clamping() {
    let video_dir = TempDir::new().unwrap();
    let video = video_dir.path().join("recording.webm");
    std::fs::write(&video, b"webm").unwrap();
    let session = TempDir::new().unwrap();

    // Inspector always errors: every strategy fails
    let inspector = Arc::new(FakeInspector {
        duration_secs: None,
    });
    let capturer = FakeCapturer::new(Duration::from_millis(5));

    // Far beyond any plausible duration; passes through unclamped
    let mut events = vec![event_at(1000), event_at(99_000_000)];
    let summary = extract_event_screenshots(
        inspector,
        capturer,
        &video,
        &mut events,
        session.path(),
        &ExtractorConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.duration_ms, None);
    assert_eq!(summary.tasks_planned, 2);
    assert_eq!(summary.tasks_succeeded, 2);
}

#[tokio::test]
async fn test_missing_video_fails_fast() {
    let session = TempDir::new().unwrap();
    let inspector = Arc::new(FakeInspector {
        duration_secs: Some(30.0),
    });
    let capturer = FakeCapturer::new(Duration::from_millis(5));

    let mut events = vec![event_at(1000)];
    let result = extract_event_screenshots(
        inspector,
        capturer.clone(),
        Path::new("/nonexistent/recording.webm"),
        &mut events,
        session.path(),
        &ExtractorConfig::default(),
    )
    .await;

    assert!(matches!(
        result,
        Err(FrameGrabError::InputFileNotFound { .. })
    ));
    // No concurrent work was ever scheduled
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_action_events_short_circuits() {
    let video_dir = TempDir::new().unwrap();
    let video = video_dir.path().join("recording.webm");
    std::fs::write(&video, b"webm").unwrap();
    let session = TempDir::new().unwrap();

    let inspector = Arc::new(FakeInspector {
        duration_secs: Some(30.0),
    });
    let capturer = FakeCapturer::new(Duration::from_millis(5));

    let mut events = vec![VideoEvent {
        event_type: Some(EventType::Transcript),
        ..event_at(1000)
    }];
    let summary = extract_event_screenshots(
        inspector,
        capturer.clone(),
        &video,
        &mut events,
        session.path(),
        &ExtractorConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(summary.action_events, 0);
    assert_eq!(summary.tasks_planned, 0);
    assert_eq!(capturer.calls.load(Ordering::SeqCst), 0);
}

// Binder determinism

#[tokio::test(start_paused = true)]
async fn test_binding_is_independent_of_completion_order() {
    let dir = TempDir::new().unwrap();
    // Mixed delays so completion order differs from plan order
    let capturer = FakeCapturer::new(Duration::from_millis(20));
    let planned: Vec<u64> = vec![5000, 1000, 3000];
    let tasks: Vec<_> = planned
        .iter()
        .enumerate()
        .map(|(i, &ts)| task(dir.path(), ts, i))
        .collect();

    let outcomes = run_plan(capturer, Path::new("video.webm"), tasks, &config(3, 30)).await;

    let mut events: Vec<_> = planned.iter().map(|&ts| event_at(ts)).collect();
    bind_outcomes(&mut events, &outcomes, "screenshots");

    for (event, &ts) in events.iter().zip(planned.iter()) {
        let expected_suffix = format!("_{}ms.jpg", ts);
        assert!(event
            .screenshot_path
            .as_deref()
            .unwrap()
            .ends_with(&expected_suffix));
    }
}
