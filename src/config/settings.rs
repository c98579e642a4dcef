//! Configuration sections
//!
//! Each section maps to a TOML table in `station.toml`. Every field has a
//! default, so a partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{DEFAULT_PLAYBACK_SPEED, DEFAULT_STREAM_INTERVAL_MS};

/// Connection settings for one telemetry source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Opaque endpoint identifier, typically a serial port name
    pub endpoint: String,

    /// Poll interval while streaming
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Connect and start streaming at startup
    #[serde(default = "default_true")]
    pub auto_connect: bool,
}

impl SourceSettings {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            interval_ms: DEFAULT_STREAM_INTERVAL_MS,
            auto_connect: true,
        }
    }
}

/// Playback defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Speed multiplier applied at startup
    #[serde(default = "default_speed")]
    pub default_speed: f64,

    /// Speeds the operator steps through with `faster` / `slower`
    #[serde(default = "default_speed_presets")]
    pub speed_presets: Vec<f64>,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_speed: DEFAULT_PLAYBACK_SPEED,
            speed_presets: default_speed_presets(),
        }
    }
}

/// Recording store settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Where frozen logs are written; in-memory only when unset
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Maximum records per session (0 = unlimited)
    #[serde(default)]
    pub max_records: usize,
}

/// Diagnostic log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Also write daily-rolling log files here
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            directory: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    DEFAULT_STREAM_INTERVAL_MS
}

fn default_speed() -> f64 {
    DEFAULT_PLAYBACK_SPEED
}

fn default_speed_presets() -> Vec<f64> {
    vec![0.25, 0.5, 1.0, 2.0, 4.0]
}

fn default_filter() -> String {
    "info,groundlink_rs=debug".to_string()
}
