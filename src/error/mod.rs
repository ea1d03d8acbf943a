//! Error handling module for FrameGrab

use thiserror::Error;

/// Main error type for FrameGrab operations
#[derive(Error, Debug)]
pub enum FrameGrabError {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Events file could not be read or parsed
    #[error("Invalid events file {path}: {message}")]
    InvalidEventsFile { path: String, message: String },

    /// Media inspection error
    #[error("Failed to inspect media file: {message}")]
    ProbeError { message: String },

    /// Frame capture error
    #[error("Frame capture failed: {message}")]
    CaptureError { message: String },

    /// Remote upload never became ready
    #[error("Upload failed: {message}")]
    UploadError { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for FrameGrab operations
pub type FrameGrabResult<T> = std::result::Result<T, FrameGrabError>;
