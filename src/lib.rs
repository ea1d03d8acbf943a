//! FrameGrab CLI Library
//!
//! A command-line tool for extracting event screenshots from screen
//! recordings. Given a recorded video and a set of timestamped events from
//! an upstream analysis stage, FrameGrab probes the media for its real
//! duration, plans a deduplicated and clamped set of extraction targets,
//! captures one frame per target under a bounded concurrency ceiling, and
//! binds the resulting images back onto the events.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod gate;
pub mod planner;
pub mod ports;
pub mod probe;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use error::{FrameGrabError, FrameGrabResult};
pub use events::{EventType, VideoEvent};
pub use extract::{ExtractionOutcome, ExtractionSummary, ExtractorConfig, ImageFormat};
pub use gate::{AssetReadinessGate, GateConfig};
pub use planner::ExtractionTask;
