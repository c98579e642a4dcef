//! Configuration module for the ground station
//!
//! The station reads a single TOML file:
//!
//! 1. the path given on the command line, else
//! 2. `station.toml` in the platform data directory under `dev.groundlink.station`
//!    (e.g. `~/.local/share/dev.groundlink.station/` on Linux), else
//! 3. built-in defaults.
//!
//! # Example
//!
//! ```toml
//! [attitude]
//! endpoint = "COM3"
//! interval_ms = 1000
//!
//! [position]
//! endpoint = "COM4"
//!
//! [playback]
//! default_speed = 2.0
//!
//! [recording]
//! directory = "/var/lib/groundlink/logs"
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{GroundLinkError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.groundlink.station";

/// Config filename
pub const CONFIG_FILE: &str = "station.toml";

/// Default source poll interval in milliseconds
pub const DEFAULT_STREAM_INTERVAL_MS: u64 = 1000;

/// Default playback speed multiplier
pub const DEFAULT_PLAYBACK_SPEED: f64 = 1.0;

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

/// Complete station configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Attitude (LoRa) source
    #[serde(default = "default_attitude")]
    pub attitude: SourceSettings,

    /// Position (RTK) source
    #[serde(default = "default_position")]
    pub position: SourceSettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub recording: RecordingSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_attitude() -> SourceSettings {
    SourceSettings::new("COM3")
}

fn default_position() -> SourceSettings {
    SourceSettings::new("COM4")
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            attitude: default_attitude(),
            position: default_position(),
            playback: PlaybackSettings::default(),
            recording: RecordingSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl StationConfig {
    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GroundLinkError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GroundLinkError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content).map_err(|e| e.with_context(format!("{:?}", path)))
    }

    /// Load from `path`, or the default location, falling back to defaults on any error
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(p) => p,
                None => return Self::default(),
            },
        };
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| GroundLinkError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            GroundLinkError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Reject values the station cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, source) in [("attitude", &self.attitude), ("position", &self.position)] {
            if source.interval_ms == 0 {
                return Err(GroundLinkError::Config(format!(
                    "{}.interval_ms must be greater than zero",
                    name
                )));
            }
        }
        let speed = self.playback.default_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(GroundLinkError::Config(format!(
                "playback.default_speed must be positive, got {}",
                speed
            )));
        }
        if let Some(bad) = self
            .playback
            .speed_presets
            .iter()
            .find(|s| !s.is_finite() || **s <= 0.0)
        {
            return Err(GroundLinkError::Config(format!(
                "playback.speed_presets must all be positive, got {}",
                bad
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StationConfig::default();
        assert_eq!(config.attitude.endpoint, "COM3");
        assert_eq!(config.position.endpoint, "COM4");
        assert_eq!(config.attitude.interval_ms, DEFAULT_STREAM_INTERVAL_MS);
        assert_eq!(config.playback.default_speed, 1.0);
        assert!(config.recording.directory.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = StationConfig::from_toml(
            r#"
            [position]
            endpoint = "/dev/ttyUSB1"
            interval_ms = 200

            [playback]
            default_speed = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.attitude.endpoint, "COM3");
        assert_eq!(config.position.endpoint, "/dev/ttyUSB1");
        assert_eq!(config.position.interval_ms, 200);
        assert!(config.position.auto_connect);
        assert_eq!(config.playback.default_speed, 2.0);
        assert_eq!(config.playback.speed_presets, vec![0.25, 0.5, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(StationConfig::from_toml("[playback]\ndefault_speed = 0.0").is_err());
        assert!(StationConfig::from_toml("[attitude]\nendpoint = \"COM3\"\ninterval_ms = 0").is_err());
        assert!(StationConfig::from_toml("not = [valid").is_err());
        assert!(StationConfig::from_toml("[playback]\nspeed_presets = [1.0, -2.0]").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = StationConfig::default();
        config.recording.directory = Some(dir.path().to_path_buf());
        config.recording.max_records = 500;

        config.save(&path).unwrap();
        assert_eq!(StationConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_default_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[[[").unwrap();
        assert_eq!(StationConfig::load_or_default(Some(&path)), StationConfig::default());
    }
}
