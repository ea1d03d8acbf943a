//! Extraction planning: deduplication, clamping, deterministic naming
//!
//! The planner turns raw event timestamps into a minimal, ordered set of
//! extraction tasks. Near-duplicate timestamps collapse via a single
//! left-to-right sweep against the last kept timestamp, and every kept
//! timestamp is clamped away from the end of the stream so the capture tool
//! never reads past the final frame.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::events::VideoEvent;
use crate::extract::ImageFormat;

/// Buffer kept before end-of-stream so the last frame read never fails
pub const EOF_EPSILON_MS: f64 = 100.0;

/// One planned screenshot extraction
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionTask {
    /// Original pre-clamp timestamp, the key for outcomes and binding
    pub timestamp_ms: u64,
    /// Clamped seek target in seconds
    pub target_secs: f64,
    /// Destination image path
    pub output_path: PathBuf,
    /// Index of the earliest event owning this timestamp
    pub owner_index: usize,
}

/// Collapse near-duplicate timestamps with a greedy left-to-right sweep.
///
/// `timestamps` must be sorted ascending and distinct. A timestamp survives
/// only if it is at least `threshold_ms` past the last *kept* timestamp, so
/// a slowly drifting cluster collapses to points spaced >= threshold apart
/// rather than to a single point.
pub fn dedup_timestamps(timestamps: &[u64], threshold_ms: u64) -> Vec<u64> {
    let mut kept: Vec<u64> = Vec::new();
    for &ts in timestamps {
        match kept.last() {
            Some(&last) if ts - last < threshold_ms => {}
            _ => kept.push(ts),
        }
    }
    kept
}

/// Clamp a timestamp into `[0, duration - epsilon]`, in seconds.
///
/// An unknown duration disables clamping entirely. Returns `None` when the
/// media is shorter than the epsilon itself, in which case the timestamp is
/// unplaceable and must be dropped rather than clamped negative.
pub fn clamp_timestamp_secs(timestamp_ms: u64, duration_ms: Option<f64>) -> Option<f64> {
    let Some(duration_ms) = duration_ms else {
        return Some(timestamp_ms as f64 / 1000.0);
    };

    let max_ms = duration_ms - EOF_EPSILON_MS;
    if max_ms < 0.0 {
        return None;
    }
    let clamped = (timestamp_ms as f64).min(max_ms).max(0.0);
    Some(clamped / 1000.0)
}

/// Build the extraction plan for a set of events.
///
/// Events without a timestamp are ignored. Several events sharing a
/// timestamp resolve to the earliest-appearing owner index, which is encoded
/// in the output file name together with the original timestamp for
/// auditability. Tasks come back in ascending timestamp order; an empty plan
/// is valid.
pub fn plan_tasks(
    events: &[VideoEvent],
    duration_ms: Option<f64>,
    screenshots_dir: &Path,
    dedup_threshold_ms: u64,
    format: ImageFormat,
) -> Vec<ExtractionTask> {
    // First owner per distinct timestamp; BTreeMap keeps keys sorted
    let mut owners: BTreeMap<u64, usize> = BTreeMap::new();
    for (index, event) in events.iter().enumerate() {
        if let Some(ts) = event.timestamp_ms {
            owners.entry(ts).or_insert(index);
        }
    }

    let distinct: Vec<u64> = owners.keys().copied().collect();
    let kept = dedup_timestamps(&distinct, dedup_threshold_ms);

    let mut tasks = Vec::with_capacity(kept.len());
    for ts in kept {
        let Some(target_secs) = clamp_timestamp_secs(ts, duration_ms) else {
            warn!("Timestamp {}ms unplaceable, media shorter than epsilon", ts);
            continue;
        };
        let owner_index = owners[&ts];
        let filename = format!(
            "event_{:03}_{}ms.{}",
            owner_index + 1,
            ts,
            format.extension()
        );
        tasks.push(ExtractionTask {
            timestamp_ms: ts,
            target_secs,
            output_path: screenshots_dir.join(filename),
            owner_index,
        });
    }

    tasks
}
