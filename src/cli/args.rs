//! Command-line argument definitions

use clap::Args;

/// Concurrency ceiling for capture subprocesses
fn concurrency_in_range(s: &str) -> Result<usize, String> {
    clap_num::number_range(s, 1, 64)
}

/// Encoder quality (1-31, lower is better for JPEG)
fn quality_in_range(s: &str) -> Result<u8, String> {
    clap_num::number_range(s, 1, 31)
}

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Events JSON file from the analysis stage
    #[arg(short, long)]
    pub events: String,

    /// Root directory for session output
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Maximum concurrent capture processes
    #[arg(long, value_parser = concurrency_in_range)]
    pub concurrency: Option<usize>,

    /// Per-capture timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Minimum gap between extracted timestamps in milliseconds
    #[arg(long)]
    pub dedup_threshold_ms: Option<u64>,

    /// Output image format (jpg or png)
    #[arg(long)]
    pub format: Option<String>,

    /// Image quality
    #[arg(long, value_parser = quality_in_range)]
    pub quality: Option<u8>,

    /// Disable the coarse pre-seek optimization
    #[arg(long)]
    pub no_fast_seek: bool,

    /// Configuration file path
    #[arg(long, env = "FRAMEGRAB_CONFIG")]
    pub config: Option<String>,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
