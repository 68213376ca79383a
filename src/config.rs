//! Pipeline configuration.
//!
//! Handles loading and validating `imgpress.toml`. Configuration is sparse:
//! every key has a default, user files override just the values they want,
//! and unknown keys are rejected to catch typos early.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [encoding]
//! web_quality = 75        # WebP quality for the web rendition (1-100)
//! dashboard_quality = 75  # WebP quality for the dashboard rendition (1-100)
//! thumbnail_quality = 75  # JPEG quality for the thumbnail (1-100)
//! timeout_secs = 30       # Per-file bound on the three concurrent encodes
//!
//! [processing]
//! max_processes = 4       # Max parallel batch workers (omit for auto = CPU cores)
//! ```
//!
//! The derivative bounding boxes, formats, and filename suffixes are fixed
//! (see [`STOCK_PROFILES`](crate::imaging::STOCK_PROFILES)); only encoder
//! quality and scheduling knobs are configurable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `imgpress.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Encoder quality and deadline settings.
    pub encoding: EncodingConfig,
    /// Parallel batch processing settings.
    pub processing: ProcessingConfig,
}

/// Encoder settings. Quality applies per profile; the deadline bounds one
/// whole file's worth of encodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    pub web_quality: u32,
    pub dashboard_quality: u32,
    pub thumbnail_quality: u32,
    /// Maximum seconds to wait for a single file's three encodes. Profiles
    /// that miss the deadline fail; the upload path is never stalled by one
    /// malformed image.
    pub timeout_secs: u64,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            web_quality: 75,
            dashboard_quality: 75,
            thumbnail_quality: 75,
            timeout_secs: 30,
        }
    }
}

/// Parallel batch processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel pipeline instances during batch runs.
    /// When absent, defaults to the number of CPU cores.
    pub max_processes: Option<usize>,
}

impl PipelineConfig {
    /// Load config from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, or fall back to defaults when no path is
    /// given. A missing explicit path is an error; defaults are not a silent
    /// substitute for a file the caller named.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, q) in [
            ("encoding.web_quality", self.encoding.web_quality),
            ("encoding.dashboard_quality", self.encoding.dashboard_quality),
            ("encoding.thumbnail_quality", self.encoding.thumbnail_quality),
        ] {
            if q == 0 || q > 100 {
                return Err(ConfigError::Validation(format!("{name} must be 1-100")));
            }
        }
        if self.encoding.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "encoding.timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// A documented stock `imgpress.toml` with every option at its default.
pub fn stock_config_toml() -> String {
    "\
# imgpress configuration. All options are optional; defaults shown.

[encoding]
# Lossy encoder quality per rendition (1-100).
web_quality = 75
dashboard_quality = 75
thumbnail_quality = 75
# Per-file bound in seconds on the three concurrent encodes.
timeout_secs = 30

[processing]
# Max parallel workers for batch runs. Omit for auto (CPU cores).
# max_processes = 4
"
    .to_string()
}
