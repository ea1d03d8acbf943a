//! Screenshot extraction: bounded executor, result binding, orchestration
//!
//! Every planned timestamp becomes one independent capture task. A counting
//! semaphore caps simultaneous capture subprocesses, each invocation carries
//! its own hard timeout, and one task's failure never touches its siblings.
//! Outcomes are collected into a map keyed by the original timestamp and the
//! caller reads per-timestamp success only from that map.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::{FrameGrabError, FrameGrabResult};
use crate::events::VideoEvent;
use crate::planner::{plan_tasks, ExtractionTask};
use crate::ports::{FrameCapturer, MediaInspector};
use crate::probe::DurationProbe;

/// Output image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpg,
    Png,
}

impl ImageFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
        }
    }

    /// Parse a format name from the CLI or config
    pub fn parse(value: &str) -> FrameGrabResult<Self> {
        match value.to_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ImageFormat::Jpg),
            "png" => Ok(ImageFormat::Png),
            _ => Err(FrameGrabError::ConfigError {
                message: format!("Invalid image format: {}. Valid formats: jpg, png", value),
            }),
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Configuration for screenshot extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Encoder quality: 1-31 for JPEG (lower is better), 0-9 for PNG
    pub image_quality: u8,
    /// Output image format
    pub image_format: ImageFormat,
    /// Concurrency ceiling for capture subprocesses
    pub max_concurrent: usize,
    /// Hard timeout per capture invocation
    pub timeout_secs: u64,
    /// Fixed-name subdirectory under the session directory
    pub screenshot_subdir: String,
    /// Minimum gap between two distinct extraction targets
    pub dedup_threshold_ms: u64,
    /// Coarse pre-input seek before the precise seek
    pub fast_seek: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            image_quality: 2,
            image_format: ImageFormat::Jpg,
            max_concurrent: 4.min(num_cpus::get().max(1)),
            timeout_secs: 30,
            screenshot_subdir: "screenshots".to_string(),
            dedup_threshold_ms: 500,
            fast_seek: true,
        }
    }
}

/// Per-invocation capture options handed to the capture adapter
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub image_format: ImageFormat,
    pub image_quality: u8,
    pub fast_seek: bool,
}

impl From<&ExtractorConfig> for CaptureSettings {
    fn from(cfg: &ExtractorConfig) -> Self {
        Self {
            image_format: cfg.image_format,
            image_quality: cfg.image_quality,
            fast_seek: cfg.fast_seek,
        }
    }
}

/// Result of one extraction task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Original timestamp this outcome belongs to
    pub timestamp_ms: u64,
    /// Whether the frame was produced
    pub success: bool,
    /// Output file name when successful
    pub artifact: Option<String>,
}

impl ExtractionOutcome {
    fn failure(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            success: false,
            artifact: None,
        }
    }
}

/// Tally of one extraction run
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionSummary {
    /// Events supplied by the caller
    pub events_total: usize,
    /// Events eligible for a screenshot
    pub action_events: usize,
    /// Tasks surviving deduplication and clamping
    pub tasks_planned: usize,
    /// Tasks that produced an image
    pub tasks_succeeded: usize,
    /// Probed media duration, if any strategy succeeded
    pub duration_ms: Option<f64>,
}

/// Run an extraction plan under the configured concurrency ceiling.
///
/// Each task acquires a semaphore permit before invoking the capture tool
/// and runs under its own timeout. A task fails on non-zero exit, timeout,
/// or a missing output file; the failure is recorded in its outcome and
/// nothing else. Every task contributes exactly one outcome.
pub async fn run_plan(
    capturer: Arc<dyn FrameCapturer>,
    asset: &Path,
    tasks: Vec<ExtractionTask>,
    config: &ExtractorConfig,
) -> HashMap<u64, ExtractionOutcome> {
    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    let settings = Arc::new(CaptureSettings::from(config));
    let timeout = Duration::from_secs(config.timeout_secs);
    let asset = asset.to_path_buf();

    let mut join_set = JoinSet::new();
    for task in tasks {
        let capturer = Arc::clone(&capturer);
        let semaphore = Arc::clone(&semaphore);
        let settings = Arc::clone(&settings);
        let asset = asset.clone();

        join_set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return ExtractionOutcome::failure(task.timestamp_ms),
            };

            let result = tokio::time::timeout(
                timeout,
                capturer.capture(&asset, task.target_secs, &task.output_path, &settings),
            )
            .await;

            match result {
                Ok(Ok(())) => {
                    // Zero exit is not enough: the file must actually exist
                    if task.output_path.exists() {
                        let artifact = task
                            .output_path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned());
                        return ExtractionOutcome {
                            timestamp_ms: task.timestamp_ms,
                            success: true,
                            artifact,
                        };
                    }
                    warn!(
                        "Capture reported success but {} is missing",
                        task.output_path.display()
                    );
                }
                Ok(Err(e)) => {
                    warn!("Capture failed at {}ms: {}", task.timestamp_ms, e);
                }
                Err(_) => {
                    warn!(
                        "Capture timed out at {}ms after {:?}",
                        task.timestamp_ms, timeout
                    );
                }
            }
            ExtractionOutcome::failure(task.timestamp_ms)
        });
    }

    let mut outcomes = HashMap::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(outcome) => {
                outcomes.insert(outcome.timestamp_ms, outcome);
            }
            Err(e) => warn!("Extraction task aborted: {}", e),
        }
    }
    outcomes
}

/// Bind successful outcomes back onto events, in place.
///
/// An event receives a reference only when its exact timestamp keys a
/// successful outcome; everything else is left untouched. Several events
/// sharing a timestamp all receive the same reference. Missing or failed
/// outcomes are an expected partial-failure state, not an error.
pub fn bind_outcomes(
    events: &mut [VideoEvent],
    outcomes: &HashMap<u64, ExtractionOutcome>,
    screenshot_subdir: &str,
) {
    for event in events.iter_mut().filter(|e| e.is_action()) {
        let Some(ts) = event.timestamp_ms else {
            continue;
        };
        if let Some(outcome) = outcomes.get(&ts) {
            if let (true, Some(artifact)) = (outcome.success, outcome.artifact.as_deref()) {
                event.screenshot_path = Some(format!("{}/{}", screenshot_subdir, artifact));
            }
        }
    }
}

/// Extract screenshots for all action events and update them in place.
///
/// Fails fast on a missing source file, before any concurrent work is
/// scheduled. Per-task failures are absorbed into the returned tally; a
/// partial extraction never aborts the surrounding run.
pub async fn extract_event_screenshots(
    inspector: Arc<dyn MediaInspector>,
    capturer: Arc<dyn FrameCapturer>,
    video_path: &Path,
    events: &mut [VideoEvent],
    session_dir: &Path,
    config: &ExtractorConfig,
) -> FrameGrabResult<ExtractionSummary> {
    if !video_path.exists() {
        return Err(FrameGrabError::InputFileNotFound {
            path: video_path.display().to_string(),
        });
    }

    let action_events: Vec<VideoEvent> =
        events.iter().filter(|e| e.is_action()).cloned().collect();

    let mut summary = ExtractionSummary {
        events_total: events.len(),
        action_events: action_events.len(),
        tasks_planned: 0,
        tasks_succeeded: 0,
        duration_ms: None,
    };

    if action_events.is_empty() {
        info!("No action events found for screenshot extraction");
        return Ok(summary);
    }

    let probe = DurationProbe::new(inspector);
    let duration_ms = probe.probe_duration_ms(video_path).await;
    if duration_ms.is_none() {
        warn!("Could not determine video duration, proceeding without clamping");
    }
    summary.duration_ms = duration_ms;

    // Created once, up front, so no task coordinates directory creation
    let screenshots_dir = session_dir.join(&config.screenshot_subdir);
    std::fs::create_dir_all(&screenshots_dir)?;

    let tasks = plan_tasks(
        &action_events,
        duration_ms,
        &screenshots_dir,
        config.dedup_threshold_ms,
        config.image_format,
    );
    summary.tasks_planned = tasks.len();

    if tasks.is_empty() {
        warn!("No valid timestamps found for extraction");
        return Ok(summary);
    }

    info!(
        "Extracting {} screenshots for {} events",
        tasks.len(),
        action_events.len()
    );

    let outcomes = run_plan(capturer, video_path, tasks, config).await;
    bind_outcomes(events, &outcomes, &config.screenshot_subdir);

    summary.tasks_succeeded = outcomes.values().filter(|o| o.success).count();
    info!(
        "Screenshot extraction complete: {}/{} successful",
        summary.tasks_succeeded, summary.tasks_planned
    );

    Ok(summary)
}
