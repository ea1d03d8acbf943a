// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::error::FrameGrabResult;
use crate::extract::CaptureSettings;

/// Inspection modes supported by the media-inspection tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectMode {
    /// Container-level format metadata
    FormatMetadata,
    /// Primary video stream metadata
    StreamMetadata,
    /// Frame count via a full decode pass (slow, last resort)
    FrameCount,
}

/// Port for media file inspection
///
/// Implementations invoke an external tool and return its structured report.
/// A non-zero exit or malformed report is an error for that single call; the
/// duration probe treats it as one failed strategy, not a fatal condition.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Inspect a media file in the given mode and return the parsed JSON report
    async fn inspect(&self, asset: &Path, mode: InspectMode) -> FrameGrabResult<serde_json::Value>;
}

/// Port for single-frame capture
///
/// Success means the external process exited zero. Whether the output file
/// actually exists afterwards is checked by the extraction executor.
#[async_trait]
pub trait FrameCapturer: Send + Sync {
    /// Capture one frame at `target_secs` into `asset` and write it to `dest`
    async fn capture(
        &self,
        asset: &Path,
        target_secs: f64,
        dest: &Path,
        settings: &CaptureSettings,
    ) -> FrameGrabResult<()>;
}

/// Remote-side asset registration handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadHandle {
    /// Remote identifier for the uploaded asset
    pub id: String,
}

/// Reported state of an uploaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    /// Still processing on the remote side
    Pending,
    /// Ready for use
    Active,
    /// Remote side rejected the asset
    Failed,
}

/// Port for the remote store that receives large assets before analysis
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Submit an asset for registration
    async fn submit(&self, asset: &Path) -> FrameGrabResult<UploadHandle>;

    /// Poll the current state of a previously submitted asset
    async fn poll(&self, handle: &UploadHandle) -> FrameGrabResult<UploadState>;
}
