//! Mode controller
//!
//! Decides which producer feeds the single consumer-facing record feed.
//! Exactly one of live fusion or playback is active; records offered by the
//! other one are dropped. Consumers read [`ModeController::current`] or
//! subscribe to the feed and never branch on the mode to get data.

use serde::{Deserialize, Serialize};

use crate::events::{SubscriptionId, Topic};
use crate::types::CombinedRecord;

/// Which producer drives the consumer feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Real-time fused stream
    #[default]
    Live,
    /// Scheduled replay of a log
    Playback,
}

impl Mode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Live => "Live",
            Mode::Playback => "Playback",
        }
    }

    pub fn other(&self) -> Mode {
        match self {
            Mode::Live => Mode::Playback,
            Mode::Playback => Mode::Live,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Multiplexes the two producers onto one feed
#[derive(Debug)]
pub struct ModeController {
    mode: Mode,
    current: Option<CombinedRecord>,
    feed: Topic<CombinedRecord>,
    dropped: u64,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            mode: Mode::Live,
            current: None,
            feed: Topic::new("combined-record"),
            dropped: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_live(&self) -> bool {
        self.mode == Mode::Live
    }

    /// The record consumers should be showing
    pub fn current(&self) -> Option<&CombinedRecord> {
        self.current.as_ref()
    }

    /// Records offered by the inactive producer and dropped
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Switch mode, clearing the current record
    ///
    /// Returns false when already in `mode`.
    pub fn switch_to(&mut self, mode: Mode) -> bool {
        if self.mode == mode {
            return false;
        }
        tracing::info!("Switching mode {} -> {}", self.mode, mode);
        self.mode = mode;
        self.current = None;
        true
    }

    /// Offer a record from `origin`; published only if `origin` is active
    pub fn offer(&mut self, origin: Mode, record: &CombinedRecord) -> bool {
        if origin != self.mode {
            self.dropped += 1;
            tracing::trace!("Dropped {} record while in {} mode", origin, self.mode);
            return false;
        }
        self.current = Some(record.clone());
        self.feed.publish(record);
        true
    }

    /// Register a consumer of the combined record feed
    pub fn on_combined_record(&mut self, callback: impl FnMut(&CombinedRecord) + 'static) -> SubscriptionId {
        self.feed.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.feed.unsubscribe(id)
    }
}
