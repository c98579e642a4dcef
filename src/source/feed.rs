//! SampleFeed trait for unified source interface
//!
//! This module provides a common trait for everything that can produce
//! decoded telemetry samples, enabling both hardware links (serial radio,
//! RTK receiver) and mock feeds for testing.

use crate::error::Result;
use crate::types::{Sample, SourceKind, Timestamp};

/// Statistics for feed read operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Reads that produced a sample
    pub samples: u64,
    /// Reads that had nothing new to report
    pub empty_reads: u64,
    /// Reads that failed and were skipped
    pub failed_reads: u64,
    /// Timestamp of the last sample produced
    pub last_sample_at: Option<Timestamp>,
}

impl FeedStats {
    pub fn record_sample(&mut self, at: Timestamp) {
        self.samples += 1;
        self.last_sample_at = Some(at);
    }

    pub fn record_empty(&mut self) {
        self.empty_reads += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed_reads += 1;
    }

    /// Calculate success rate as percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.samples + self.empty_reads + self.failed_reads;
        if total == 0 {
            100.0
        } else {
            ((self.samples + self.empty_reads) as f64 / total as f64) * 100.0
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Unified interface for telemetry feeds
///
/// Implementations deliver samples that are already decoded; framing and
/// byte-level parsing happen below this trait.
#[cfg_attr(test, mockall::automock)]
pub trait SampleFeed {
    /// Which source this feed produces samples for
    fn kind(&self) -> SourceKind;

    /// Open the link to an endpoint (e.g. a serial port name)
    fn open(&mut self, endpoint: &str) -> Result<()>;

    /// Close the link
    fn close(&mut self) -> Result<()>;

    /// Read the next sample, if any, at stream time `now`
    ///
    /// An error is treated as a transient failure: the tick is skipped and
    /// the stream keeps running.
    fn read(&mut self, now: Timestamp) -> Result<Option<Sample>>;
}
