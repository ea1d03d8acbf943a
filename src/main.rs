//! FrameGrab CLI
//!
//! Extracts still images from a screen recording at the timestamps of
//! detected user-action events, tolerating a slow or flaky media toolchain.
//!
//! # Usage
//!
//! ```bash
//! framegrab extract --input recording.webm --events events.json --output-dir output
//! framegrab probe --input recording.webm --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use framegrab_cli::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the CLI flag when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    if cli.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Commands::Extract(args) => {
            info!("Executing extract command");
            commands::run_extract(args).await?;
        }
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::run_probe(args).await?;
        }
    }

    Ok(())
}
