//! Configuration initialization and hierarchy management
//!
//! Precedence follows CLI > Env > File > Defaults. The file layer is
//! optional TOML; environment overrides use the `FRAMEGRAB_` prefix.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FrameGrabError, FrameGrabResult};
use crate::extract::{ExtractorConfig, ImageFormat};

/// Default locations searched when no config file is given
const DEFAULT_CONFIG_PATHS: &[&str] = &["framegrab.toml", "config/framegrab.toml"];

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Screenshot extraction settings
    pub extractor: ExtractorConfig,
}

impl AppConfig {
    /// Load configuration: explicit file if given, otherwise the first
    /// default path that exists, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> FrameGrabResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in DEFAULT_CONFIG_PATHS {
            let path = Path::new(candidate);
            if path.exists() {
                info!("Loading configuration from: {}", candidate);
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> FrameGrabResult<Self> {
        let data = std::fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| FrameGrabError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Apply `FRAMEGRAB_*` environment variable overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup (env in production,
    /// a map in tests)
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        let mut overrides = 0;

        if let Some(value) = get("FRAMEGRAB_CONCURRENCY") {
            match value.parse() {
                Ok(n) if n >= 1 => {
                    self.extractor.max_concurrent = n;
                    overrides += 1;
                }
                _ => warn!("Ignoring invalid FRAMEGRAB_CONCURRENCY: {}", value),
            }
        }
        if let Some(value) = get("FRAMEGRAB_TIMEOUT_SECS") {
            match value.parse() {
                Ok(n) => {
                    self.extractor.timeout_secs = n;
                    overrides += 1;
                }
                _ => warn!("Ignoring invalid FRAMEGRAB_TIMEOUT_SECS: {}", value),
            }
        }
        if let Some(value) = get("FRAMEGRAB_DEDUP_THRESHOLD_MS") {
            match value.parse() {
                Ok(n) => {
                    self.extractor.dedup_threshold_ms = n;
                    overrides += 1;
                }
                _ => warn!("Ignoring invalid FRAMEGRAB_DEDUP_THRESHOLD_MS: {}", value),
            }
        }
        if let Some(value) = get("FRAMEGRAB_IMAGE_FORMAT") {
            match ImageFormat::parse(&value) {
                Ok(format) => {
                    self.extractor.image_format = format;
                    overrides += 1;
                }
                Err(_) => warn!("Ignoring invalid FRAMEGRAB_IMAGE_FORMAT: {}", value),
            }
        }
        if let Some(value) = get("FRAMEGRAB_IMAGE_QUALITY") {
            match value.parse() {
                Ok(q) => {
                    self.extractor.image_quality = q;
                    overrides += 1;
                }
                _ => warn!("Ignoring invalid FRAMEGRAB_IMAGE_QUALITY: {}", value),
            }
        }
        if let Some(value) = get("FRAMEGRAB_FAST_SEEK") {
            match value.parse() {
                Ok(b) => {
                    self.extractor.fast_seek = b;
                    overrides += 1;
                }
                _ => warn!("Ignoring invalid FRAMEGRAB_FAST_SEEK: {}", value),
            }
        }

        if overrides > 0 {
            info!("Applied {} environment variable overrides", overrides);
        }
    }
}
