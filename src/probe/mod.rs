//! Duration probing with an ordered fallback chain
//!
//! ffprobe's duration reporting is unreliable for browser-recorded WebM:
//! the container metadata is often missing or "N/A", and stream metadata is
//! no better. The probe therefore tries three independent strategies in
//! priority order and takes the first finite positive answer. A strategy
//! that errors, times out, or reports garbage is skipped, not retried;
//! escalation to the next strategy is the retry policy.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::ports::{InspectMode, MediaInspector};

/// Timeout for the metadata-only strategies
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the frame-counting strategy, which decodes the whole stream
const FRAME_COUNT_TIMEOUT: Duration = Duration::from_secs(30);

/// Authoritative duration probe for a media asset
pub struct DurationProbe {
    inspector: Arc<dyn MediaInspector>,
}

impl DurationProbe {
    /// Create a probe over the given inspector
    pub fn new(inspector: Arc<dyn MediaInspector>) -> Self {
        Self { inspector }
    }

    /// Determine the total duration of `asset` in milliseconds.
    ///
    /// Returns `None` when every strategy fails. Callers must treat `None`
    /// as "unbounded" and disable clamping, never as zero.
    pub async fn probe_duration_ms(&self, asset: &Path) -> Option<f64> {
        let strategies = [
            (InspectMode::FormatMetadata, METADATA_TIMEOUT),
            (InspectMode::StreamMetadata, METADATA_TIMEOUT),
            (InspectMode::FrameCount, FRAME_COUNT_TIMEOUT),
        ];

        for (mode, timeout) in strategies {
            match tokio::time::timeout(timeout, self.inspector.inspect(asset, mode)).await {
                Ok(Ok(report)) => {
                    if let Some(duration_ms) = extract_duration_ms(&report, mode) {
                        if duration_ms.is_finite() && duration_ms > 0.0 {
                            debug!("Duration {}ms via {:?}", duration_ms, mode);
                            return Some(duration_ms);
                        }
                        warn!("Strategy {:?} reported unusable duration", mode);
                    } else {
                        warn!("Strategy {:?} report carried no duration", mode);
                    }
                }
                Ok(Err(e)) => {
                    warn!("Strategy {:?} failed: {}", mode, e);
                }
                Err(_) => {
                    warn!("Strategy {:?} timed out after {:?}", mode, timeout);
                }
            }
        }

        warn!("All duration strategies failed for {}", asset.display());
        None
    }
}

/// Pull a duration in milliseconds out of an ffprobe report for `mode`
fn extract_duration_ms(report: &serde_json::Value, mode: InspectMode) -> Option<f64> {
    match mode {
        InspectMode::FormatMetadata => {
            parse_seconds(report.get("format")?.get("duration")?).map(|s| s * 1000.0)
        }
        InspectMode::StreamMetadata => {
            let stream = report.get("streams")?.as_array()?.first()?;
            parse_seconds(stream.get("duration")?).map(|s| s * 1000.0)
        }
        InspectMode::FrameCount => {
            let stream = report.get("streams")?.as_array()?.first()?;
            let frames: f64 = stream.get("nb_read_frames")?.as_str()?.parse().ok()?;
            let fps = parse_frame_rate(stream.get("r_frame_rate")?.as_str()?)?;
            if fps <= 0.0 {
                return None;
            }
            Some(frames / fps * 1000.0)
        }
    }
}

/// Parse an ffprobe duration field, which may be a string, a number, or "N/A"
fn parse_seconds(value: &serde_json::Value) -> Option<f64> {
    if let Some(s) = value.as_str() {
        if s == "N/A" {
            return None;
        }
        return s.parse().ok();
    }
    value.as_f64()
}

/// Parse an ffprobe frame rate such as "30/1" or "29.97"
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num, den)) = rate.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    rate.parse().ok()
}
