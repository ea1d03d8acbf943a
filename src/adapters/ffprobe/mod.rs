//! FFprobe adapter for media file inspection
//!
//! Invokes ffprobe as a subprocess in one of three inspection modes and
//! returns its JSON report. Timeouts are enforced by the caller, per
//! strategy, since the frame-count mode is allowed far longer than the
//! metadata reads.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{FrameGrabError, FrameGrabResult};
use crate::ports::{InspectMode, MediaInspector};

/// FFprobe-based inspector adapter
pub struct FfprobeInspector {
    /// Binary to invoke, normally "ffprobe"
    binary: String,
}

impl FfprobeInspector {
    /// Create a new inspector using `ffprobe` from PATH
    pub fn new() -> Self {
        Self {
            binary: "ffprobe".to_string(),
        }
    }

    /// Use an explicit binary path (e.g. a bundled ffprobe)
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build the ffprobe argument list for an inspection mode
    fn build_args(asset: &Path, mode: InspectMode) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
        ];

        match mode {
            InspectMode::FormatMetadata => {
                args.push("-show_format".to_string());
            }
            InspectMode::StreamMetadata => {
                args.push("-show_streams".to_string());
                args.push("-select_streams".to_string());
                args.push("v:0".to_string());
            }
            InspectMode::FrameCount => {
                args.push("-select_streams".to_string());
                args.push("v:0".to_string());
                args.push("-count_frames".to_string());
                args.push("-show_entries".to_string());
                args.push("stream=nb_read_frames,r_frame_rate".to_string());
            }
        }

        args.push(asset.display().to_string());
        args
    }
}

impl Default for FfprobeInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    async fn inspect(&self, asset: &Path, mode: InspectMode) -> FrameGrabResult<serde_json::Value> {
        let args = Self::build_args(asset, mode);
        debug!("Running {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| FrameGrabError::ProbeError {
                message: format!("failed to spawn {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            return Err(FrameGrabError::ProbeError {
                message: format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status.code().unwrap_or(-1),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| FrameGrabError::ProbeError {
            message: format!("malformed ffprobe report: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata_args() {
        let args = FfprobeInspector::build_args(Path::new("in.webm"), InspectMode::FormatMetadata);
        assert_eq!(
            args,
            vec!["-v", "quiet", "-print_format", "json", "-show_format", "in.webm"]
        );
    }

    #[test]
    fn test_stream_metadata_args_select_first_video_stream() {
        let args = FfprobeInspector::build_args(Path::new("in.webm"), InspectMode::StreamMetadata);
        assert!(args.contains(&"-show_streams".to_string()));
        assert!(args.contains(&"v:0".to_string()));
    }

    #[test]
    fn test_frame_count_args_force_full_decode() {
        let args = FfprobeInspector::build_args(Path::new("in.webm"), InspectMode::FrameCount);
        assert!(args.contains(&"-count_frames".to_string()));
        assert!(args.contains(&"stream=nb_read_frames,r_frame_rate".to_string()));
    }
}
