//! Recording store for capturing live combined records

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

use crate::error::{GroundLinkError, Result};
use crate::types::{CombinedRecord, Log};

use super::codec;
use super::types::{ExportFormat, RecordingState};

/// An armed (or just finished) capture
#[derive(Debug, Clone)]
pub struct RecordingSession {
    /// When `start_logging` armed the store
    pub started_at: DateTime<Utc>,
    /// Identifier the session's log can be reloaded by
    pub identifier: String,
    records: Vec<CombinedRecord>,
}

impl RecordingSession {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            identifier: log_identifier(started_at),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// File name for a log started at `started_at`
pub fn log_identifier(started_at: DateTime<Utc>) -> String {
    format!(
        "rocket_telemetry_{}.json",
        started_at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(':', "-")
    )
}

/// Append-only capture of live records
///
/// `Idle` → `Armed` on [`start_logging`](Self::start_logging), back on
/// [`stop_logging`](Self::stop_logging) which freezes the capture into a
/// [`Log`]. Starting again always begins a new, empty capture.
#[derive(Debug)]
pub struct RecordingStore {
    state: RecordingState,
    session: Option<RecordingSession>,
    frozen: Option<Log>,
    directory: Option<PathBuf>,
    max_records: usize,
    overflowed: bool,
}

impl Default for RecordingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingStore {
    /// Create a store that keeps logs in memory only
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            session: None,
            frozen: None,
            directory: None,
            max_records: 0,
            overflowed: false,
        }
    }

    /// Persist frozen logs into `directory`
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Cap the number of records per session (0 = unlimited)
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_logging(&self) -> bool {
        self.state.is_armed()
    }

    /// Identifier of the current or most recent session
    pub fn log_file_path(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.identifier.as_str())
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// The log frozen by the last `stop_logging`
    pub fn frozen_log(&self) -> Option<&Log> {
        self.frozen.as_ref()
    }

    /// Records captured in the current or most recent session
    pub fn record_count(&self) -> usize {
        self.session.as_ref().map_or(0, RecordingSession::len)
    }

    /// Arm the store. No-op when already armed.
    pub fn start_logging(&mut self) {
        self.start_logging_at(Utc::now());
    }

    /// Arm the store with an explicit start stamp
    pub fn start_logging_at(&mut self, started_at: DateTime<Utc>) {
        if self.is_logging() {
            return;
        }
        let session = RecordingSession::new(started_at);
        tracing::info!("Started logging to {}", session.identifier);
        self.session = Some(session);
        self.overflowed = false;
        self.state = RecordingState::Armed;
    }

    /// Append a live record. Ignored unless armed.
    pub fn append(&mut self, record: &CombinedRecord) -> bool {
        if !self.is_logging() {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if self.max_records > 0 && session.records.len() >= self.max_records {
            if !self.overflowed {
                tracing::warn!(
                    "Recording reached {} records, dropping further records",
                    self.max_records
                );
                self.overflowed = true;
            }
            return false;
        }
        session.records.push(record.clone());
        true
    }

    /// Disarm and freeze the capture. No-op when idle.
    ///
    /// With a directory configured the log is also written to disk; a write
    /// failure is logged and does not affect the frozen log.
    pub fn stop_logging(&mut self) -> Option<Log> {
        if !self.is_logging() {
            return None;
        }
        self.state = RecordingState::Idle;
        let session = self.session.as_ref()?;
        let log: Log = session.records.clone().into();
        tracing::info!(
            "Stopped logging to {} with {} entries",
            session.identifier,
            log.len()
        );

        if let Some(dir) = &self.directory {
            let path = dir.join(&session.identifier);
            match codec::save_log_file(&path, &log) {
                Ok(()) => tracing::info!("Saved log to {}", path.display()),
                Err(e) => tracing::warn!("Failed to save log to {}: {}", path.display(), e),
            }
        }

        self.frozen = Some(log.clone());
        Some(log)
    }

    /// Log that exports and self-reloads refer to
    ///
    /// While armed this is a snapshot of the capture so far.
    fn current_log(&self) -> Log {
        match (&self.session, &self.frozen) {
            (Some(session), _) if self.is_logging() => session.records.clone().into(),
            (_, Some(frozen)) => frozen.clone(),
            _ => Log::empty(),
        }
    }

    /// Serialize the current log
    pub fn export_log(&self, format: ExportFormat) -> Result<String> {
        codec::encode(&self.current_log(), format)
    }

    /// Serialize the current log to a file
    pub fn export_to_file(&self, format: ExportFormat, path: &Path) -> Result<()> {
        let content = self.export_log(format)?;
        std::fs::write(path, content)
            .map_err(|e| GroundLinkError::Export(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Load a log by identifier
    ///
    /// The identifier of the current session resolves to its own records.
    /// Anything else is read as a JSON log file, first as given and then
    /// relative to the recording directory.
    pub fn load_log_file(&self, identifier: &str) -> Result<Log> {
        tracing::info!("Loading log file: {}", identifier);

        if self.log_file_path() == Some(identifier) {
            let log = self.current_log();
            if !log.is_empty() {
                return Ok(log);
            }
        }

        let direct = PathBuf::from(identifier);
        let path = match &self.directory {
            Some(dir) if !direct.exists() && direct.is_relative() => dir.join(&direct),
            _ => direct,
        };
        if !path.exists() {
            return Err(GroundLinkError::NotFound(identifier.to_string()));
        }
        codec::read_log_file(&path)
    }
}
