//! Command execution

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use crate::adapters::{FfmpegCapturer, FfprobeInspector};
use crate::cli::args::{ExtractArgs, ProbeArgs};
use crate::config::AppConfig;
use crate::events;
use crate::extract::{self, ImageFormat};
use crate::probe::DurationProbe;
use crate::report::RunReport;
use crate::utils::path::sanitize_input_path;
use crate::utils::time::format_duration_ms;

/// Execute the extract command
pub async fn run_extract(args: ExtractArgs) -> Result<()> {
    let mut config = AppConfig::load(args.config.as_deref().map(Path::new))?;
    config.apply_env();
    apply_extract_overrides(&mut config, &args)?;

    let video_path = sanitize_input_path(Path::new(&args.input))?;
    let mut events = events::load_events(Path::new(&args.events))?;
    info!("Loaded {} events from {}", events.len(), args.events);

    // One session directory per run; concurrent runs never share one
    let session_name = format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"));
    let session_dir = Path::new(&args.output_dir).join(session_name);
    std::fs::create_dir_all(&session_dir)
        .with_context(|| format!("creating session directory {}", session_dir.display()))?;
    info!("Session directory: {}", session_dir.display());

    let inspector = Arc::new(FfprobeInspector::new());
    let capturer = Arc::new(FfmpegCapturer::new());

    let summary = extract::extract_event_screenshots(
        inspector,
        capturer,
        &video_path,
        &mut events,
        &session_dir,
        &config.extractor,
    )
    .await?;

    // Persist the updated events next to the screenshots
    let events_out = session_dir.join("events.json");
    let payload = serde_json::json!({ "events": events });
    std::fs::write(&events_out, serde_json::to_string_pretty(&payload)?)?;

    let report = RunReport::new(&video_path, &summary, &events);
    let report_path = report.write(&session_dir)?;
    info!("Report written to {}", report_path.display());

    println!(
        "Extracted {}/{} screenshots for {} events -> {}",
        summary.tasks_succeeded,
        summary.tasks_planned,
        summary.action_events,
        session_dir.display()
    );

    Ok(())
}

/// Execute the probe command
pub async fn run_probe(args: ProbeArgs) -> Result<()> {
    let video_path = sanitize_input_path(Path::new(&args.input))?;

    let inspector = Arc::new(FfprobeInspector::new());
    let probe = DurationProbe::new(inspector);
    let duration_ms = probe.probe_duration_ms(&video_path).await;

    if args.json {
        let payload = serde_json::json!({
            "path": video_path.display().to_string(),
            "duration_ms": duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        match duration_ms {
            Some(ms) => println!("Duration: {} ({:.0}ms)", format_duration_ms(ms), ms),
            None => println!("Duration: unknown (all probe strategies failed)"),
        }
    }

    Ok(())
}

/// Fold CLI flags into the configuration (highest precedence)
fn apply_extract_overrides(config: &mut AppConfig, args: &ExtractArgs) -> Result<()> {
    if let Some(concurrency) = args.concurrency {
        config.extractor.max_concurrent = concurrency;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.extractor.timeout_secs = timeout_secs;
    }
    if let Some(threshold) = args.dedup_threshold_ms {
        config.extractor.dedup_threshold_ms = threshold;
    }
    if let Some(format) = &args.format {
        config.extractor.image_format = ImageFormat::parse(format)?;
    }
    if let Some(quality) = args.quality {
        config.extractor.image_quality = quality;
    }
    if args.no_fast_seek {
        config.extractor.fast_seek = false;
    }
    Ok(())
}
