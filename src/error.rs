//! Error handling for the ground station
//!
//! This module defines the error taxonomy shared by every component and a
//! Result alias for use throughout the crate.
//!
//! None of these errors is fatal to the process. Connection failures are
//! retryable, a missing log leaves the current mode and log untouched, and
//! an export failure only fails that one export call.

use thiserror::Error;

/// Main error type for ground station operations
#[derive(Error, Debug)]
pub enum GroundLinkError {
    /// A source adapter could not connect to or disconnect from its endpoint
    #[error("Connection error on {endpoint}: {message}")]
    Connection { endpoint: String, message: String },

    /// No data backs the requested log identifier
    #[error("Log not found: {0}")]
    NotFound(String),

    /// Persisted log content could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// A log could not be serialized
    #[error("Export error: {0}")]
    Export(String),

    /// An operation was requested in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<GroundLinkError>,
    },
}

impl GroundLinkError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        GroundLinkError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a connection error for an endpoint
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        GroundLinkError::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Whether the failure can be retried by re-invoking the operation
    pub fn is_retryable(&self) -> bool {
        match self {
            GroundLinkError::Connection { .. } | GroundLinkError::Io(_) => true,
            GroundLinkError::WithContext { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for GroundLinkError {
    fn from(err: serde_json::Error) -> Self {
        GroundLinkError::Parse(err.to_string())
    }
}

/// Result type alias for ground station operations
pub type Result<T> = std::result::Result<T, GroundLinkError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
