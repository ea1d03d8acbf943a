//! Upstream event model
//!
//! Events arrive as JSON produced by the analysis stage. Only `timestamp_ms`
//! and `screenshot_path` matter to this crate; the remaining fields are owned
//! by the upstream domain model and pass through untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FrameGrabError, FrameGrabResult};

/// Types of events detected by the analysis stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ScreenChange,
    UserAction,
    Transcript,
    ApplicationSwitch,
    WorkflowStep,
}

/// Tool or application identified for an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tool_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Single event extracted from video analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoEvent {
    /// Timestamp in milliseconds from video start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,

    /// Type of event detected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,

    /// Tool information if identified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolInfo>,

    /// What is happening at this moment
    pub description: String,

    /// Analysis confidence score
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,

    /// Audio transcription for this timeframe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_transcript: Option<String>,

    /// Screenshot reference, relative to the session directory.
    /// Written only by the result binder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
}

impl VideoEvent {
    /// True for events that should receive a screenshot
    pub fn is_action(&self) -> bool {
        self.event_type != Some(EventType::Transcript)
    }
}

/// Wire form of the analysis output file
#[derive(Debug, Deserialize)]
struct EventsFile {
    events: Vec<VideoEvent>,
}

/// Load events from an analysis JSON file (`{"events": [...]}`)
pub fn load_events(path: &Path) -> FrameGrabResult<Vec<VideoEvent>> {
    let data = std::fs::read_to_string(path).map_err(|e| FrameGrabError::InvalidEventsFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let file: EventsFile =
        serde_json::from_str(&data).map_err(|e| FrameGrabError::InvalidEventsFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(file.events)
}
