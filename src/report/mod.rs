//! Run report serialization
//!
//! Each session directory receives a JSON report with the probed duration
//! and per-stage tallies, so partial failures are auditable after the run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::FrameGrabResult;
use crate::events::VideoEvent;
use crate::extract::ExtractionSummary;

/// File name of the report inside the session directory
const REPORT_FILE: &str = "extraction_report.json";

/// Summary report of one extraction run
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Source video
    pub video_path: String,
    /// When the report was generated
    pub generated_at: DateTime<Local>,
    /// Probed media duration in milliseconds, if known
    pub duration_ms: Option<f64>,
    /// Events supplied by the caller
    pub events_total: usize,
    /// Events eligible for a screenshot
    pub action_events: usize,
    /// Tasks surviving deduplication and clamping
    pub tasks_planned: usize,
    /// Tasks that produced an image
    pub tasks_succeeded: usize,
    /// Screenshot references bound onto events
    pub screenshots: Vec<String>,
}

impl RunReport {
    /// Build a report from an extraction summary and the updated events
    pub fn new(video_path: &Path, summary: &ExtractionSummary, events: &[VideoEvent]) -> Self {
        let mut screenshots: Vec<String> = events
            .iter()
            .filter_map(|e| e.screenshot_path.clone())
            .collect();
        screenshots.sort();
        screenshots.dedup();

        Self {
            video_path: video_path.display().to_string(),
            generated_at: Local::now(),
            duration_ms: summary.duration_ms,
            events_total: summary.events_total,
            action_events: summary.action_events,
            tasks_planned: summary.tasks_planned,
            tasks_succeeded: summary.tasks_succeeded,
            screenshots,
        }
    }

    /// Write the report into the session directory, returning its path
    pub fn write(&self, session_dir: &Path) -> FrameGrabResult<PathBuf> {
        let path = session_dir.join(REPORT_FILE);
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, data)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ExtractionSummary {
        ExtractionSummary {
            events_total: 4,
            action_events: 3,
            tasks_planned: 2,
            tasks_succeeded: 1,
            duration_ms: Some(30_000.0),
        }
    }

    #[test]
    fn test_report_collects_distinct_screenshots() {
        let shot = Some("screenshots/event_001_2000ms.jpg".to_string());
        let events = vec![
            VideoEvent {
                timestamp_ms: Some(2000),
                event_type: None,
                tool: None,
                description: String::new(),
                confidence_score: None,
                audio_transcript: None,
                screenshot_path: shot.clone(),
            },
            VideoEvent {
                timestamp_ms: Some(2000),
                event_type: None,
                tool: None,
                description: String::new(),
                confidence_score: None,
                audio_transcript: None,
                screenshot_path: shot,
            },
        ];
        let report = RunReport::new(Path::new("video.webm"), &summary(), &events);
        assert_eq!(report.screenshots.len(), 1);
        assert_eq!(report.tasks_succeeded, 1);
    }

    #[test]
    fn test_report_round_trips_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let report = RunReport::new(Path::new("video.webm"), &summary(), &[]);
        let path = report.write(dir.path()).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["tasks_planned"], 2);
        assert_eq!(value["duration_ms"], 30_000.0);
    }
}
