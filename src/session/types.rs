//! Session state types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::GroundLinkError;

/// State of the recording store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordingState {
    /// Not capturing
    #[default]
    Idle,
    /// Appending every live record
    Armed,
}

impl RecordingState {
    /// Check if currently recording
    pub fn is_armed(&self) -> bool {
        matches!(self, RecordingState::Armed)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordingState::Idle => "Idle",
            RecordingState::Armed => "Recording",
        }
    }
}

/// State of the playback scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No log, or an empty one. Play is disabled.
    #[default]
    Stopped,
    /// Log loaded with a valid cursor, not advancing
    Ready,
    /// Ticking through the log
    Playing,
    /// Ticking suspended mid-log
    Paused,
}

impl PlaybackState {
    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    /// Check if paused
    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackState::Paused)
    }

    /// Whether `play` would be accepted
    pub fn can_play(&self) -> bool {
        matches!(self, PlaybackState::Ready | PlaybackState::Paused)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Ready => "Ready",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }
}

/// Export format for recorded logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Full fidelity, reloadable
    Json,
    /// Fixed 25 columns; absent sources become empty cells
    Csv,
}

impl ExportFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = GroundLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(GroundLinkError::Export(format!(
                "unknown export format '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
