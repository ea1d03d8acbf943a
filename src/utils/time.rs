//! Time formatting utilities

/// Format a millisecond duration as `MM:SS.mmm` (or `HH:MM:SS.mmm`)
pub fn format_duration_ms(duration_ms: f64) -> String {
    let total_ms = duration_ms.max(0.0).round() as u64;
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
    } else {
        format!("{:02}:{:02}.{:03}", mins, secs, ms)
    }
}
