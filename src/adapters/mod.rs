//! Adapters - External tool integrations

pub mod ffmpeg;
pub mod ffprobe;

pub use ffmpeg::FfmpegCapturer;
pub use ffprobe::FfprobeInspector;
