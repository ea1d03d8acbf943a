//! FFmpeg adapter for single-frame capture
//!
//! Builds and runs one ffmpeg invocation per screenshot. The command asks for
//! exactly one frame and carries compatibility flags for browser-recorded
//! VP8/VP9 sources, whose odd dimensions and YUV ranges the image encoders
//! cannot consume directly.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{FrameGrabError, FrameGrabResult};
use crate::extract::{CaptureSettings, ImageFormat};
use crate::ports::FrameCapturer;

/// Seek distance below which a coarse pre-input seek is not worth it
const FAST_SEEK_MIN_SECS: f64 = 10.0;

/// How far before the target the coarse seek lands
const FAST_SEEK_LEAD_SECS: f64 = 5.0;

/// FFmpeg-based capture adapter
pub struct FfmpegCapturer {
    /// Binary to invoke, normally "ffmpeg"
    binary: String,
}

impl FfmpegCapturer {
    /// Create a new capturer using `ffmpeg` from PATH
    pub fn new() -> Self {
        Self {
            binary: "ffmpeg".to_string(),
        }
    }

    /// Use an explicit binary path
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Build the ffmpeg argument list for one frame at `target_secs`
    fn build_args(
        asset: &Path,
        target_secs: f64,
        dest: &Path,
        settings: &CaptureSettings,
    ) -> Vec<String> {
        let mut args = Vec::new();

        // Coarse keyframe seek before the input, then a precise seek for the
        // remainder after it. The coarse seek is an optimization only; the
        // decoded frame must land at the requested instant either way.
        let mut remaining = target_secs;
        if settings.fast_seek && target_secs > FAST_SEEK_MIN_SECS {
            let coarse = (target_secs - FAST_SEEK_LEAD_SECS).max(0.0);
            args.push("-ss".to_string());
            args.push(format!("{:.3}", coarse));
            remaining = target_secs - coarse;
        }

        args.push("-i".to_string());
        args.push(asset.display().to_string());
        args.push("-ss".to_string());
        args.push(format!("{:.3}", remaining));
        args.push("-frames:v".to_string());
        args.push("1".to_string());

        // VP8/WebM compatibility: even dimensions, baseline pixel format,
        // tolerate the non-standard YUV range browser captures produce.
        args.push("-vf".to_string());
        args.push("scale=trunc(iw/2)*2:trunc(ih/2)*2".to_string());
        args.push("-pix_fmt".to_string());
        args.push("yuv420p".to_string());
        args.push("-strict".to_string());
        args.push("unofficial".to_string());

        match settings.image_format {
            ImageFormat::Jpg => {
                args.push("-q:v".to_string());
                args.push(settings.image_quality.to_string());
                args.push("-huffman".to_string());
                args.push("optimal".to_string());
            }
            ImageFormat::Png => {
                args.push("-compression_level".to_string());
                args.push(settings.image_quality.min(9).to_string());
            }
        }

        args.push("-y".to_string());
        args.push(dest.display().to_string());
        args
    }
}

impl Default for FfmpegCapturer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FrameCapturer for FfmpegCapturer {
    async fn capture(
        &self,
        asset: &Path,
        target_secs: f64,
        dest: &Path,
        settings: &CaptureSettings,
    ) -> FrameGrabResult<()> {
        let args = Self::build_args(asset, target_secs, dest, settings);
        debug!("Running {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| FrameGrabError::CaptureError {
                message: format!("failed to spawn {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "ffmpeg failed for {}: {}",
                dest.display(),
                stderr.lines().last().unwrap_or("").trim()
            );
            return Err(FrameGrabError::CaptureError {
                message: format!(
                    "{} exited with {}",
                    self.binary,
                    output.status.code().unwrap_or(-1)
                ),
            });
        }

        Ok(())
    }
}
