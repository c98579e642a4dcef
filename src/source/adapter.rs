//! Source adapter: one feed, normalized into a sample stream

use crate::error::{GroundLinkError, Result, ResultExt};
use crate::events::{SubscriptionId, Topic};
use crate::timer::{TimerId, TimerQueue, TimerTask};
use crate::types::{Sample, SourceKind, Timestamp};

use super::feed::{FeedStats, SampleFeed};

/// Wraps a [`SampleFeed`] with connection state, a stream timer and listeners
///
/// Listeners see every accepted sample once, in arrival order, on the thread
/// that delivered it. The adapter keeps only the latest sample.
pub struct SourceAdapter {
    kind: SourceKind,
    feed: Box<dyn SampleFeed>,
    endpoint: Option<String>,
    interval_ms: u64,
    stream_timer: Option<TimerId>,
    latest: Option<Sample>,
    listeners: Topic<Sample>,
    stats: FeedStats,
}

impl std::fmt::Debug for SourceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAdapter")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("interval_ms", &self.interval_ms)
            .field("streaming", &self.stream_timer.is_some())
            .field("stats", &self.stats)
            .finish()
    }
}

impl SourceAdapter {
    /// Create an adapter polling `feed` every `interval_ms` while streaming
    pub fn new(feed: Box<dyn SampleFeed>, interval_ms: u64) -> Self {
        let kind = feed.kind();
        Self {
            kind,
            feed,
            endpoint: None,
            interval_ms: interval_ms.max(1),
            stream_timer: None,
            latest: None,
            listeners: Topic::new(kind.display_name()),
            stats: FeedStats::default(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn stats(&self) -> &FeedStats {
        &self.stats
    }

    /// Connect to an endpoint
    ///
    /// Failure leaves the adapter disconnected and can be retried.
    pub fn connect(&mut self, endpoint: &str) -> Result<()> {
        if self.endpoint.as_deref() == Some(endpoint) {
            return Ok(());
        }
        if self.endpoint.is_some() {
            self.feed.close()?;
            self.endpoint = None;
        }
        self.feed
            .open(endpoint)
            .with_context(|| format!("Failed to connect {} source", self.kind))?;
        tracing::info!("{} source connected on {}", self.kind, endpoint);
        self.endpoint = Some(endpoint.to_string());
        Ok(())
    }

    /// Disconnect, stopping the stream first
    pub fn disconnect(&mut self, timers: &mut TimerQueue) -> Result<()> {
        self.stop_stream(timers);
        let Some(endpoint) = self.endpoint.take() else {
            return Ok(());
        };
        self.feed
            .close()
            .with_context(|| format!("Failed to disconnect {} source", self.kind))?;
        tracing::info!("{} source disconnected from {}", self.kind, endpoint);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.stream_timer.is_some()
    }

    /// Begin polling the feed. Idempotent.
    pub fn start_stream(&mut self, timers: &mut TimerQueue, now: Timestamp) -> Result<()> {
        if self.stream_timer.is_some() {
            return Ok(());
        }
        if !self.is_connected() {
            return Err(GroundLinkError::InvalidState(format!(
                "{} source is not connected",
                self.kind
            )));
        }
        self.stream_timer = Some(timers.schedule_repeating(
            now,
            self.interval_ms,
            TimerTask::Stream(self.kind),
        ));
        tracing::debug!("{} stream started ({} ms)", self.kind, self.interval_ms);
        Ok(())
    }

    /// Stop polling. The pending tick is cancelled before this returns. Idempotent.
    pub fn stop_stream(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.stream_timer.take() {
            timers.cancel(id);
            tracing::debug!("{} stream stopped", self.kind);
        }
    }

    /// Handle a stream tick: read the feed and accept whatever it produced
    ///
    /// A failed read only skips this tick.
    pub fn poll(&mut self, now: Timestamp) -> Option<Sample> {
        match self.feed.read(now) {
            Ok(Some(sample)) => self.accept(sample),
            Ok(None) => {
                self.stats.record_empty();
                None
            }
            Err(e) => {
                self.stats.record_failure();
                tracing::warn!("{} read failed, skipping tick: {}", self.kind, e);
                None
            }
        }
    }

    /// Accept a decoded sample pushed from outside the stream timer
    ///
    /// Samples for the other source are rejected.
    pub fn accept(&mut self, sample: Sample) -> Option<Sample> {
        if sample.source() != self.kind {
            tracing::warn!(
                "{} adapter rejected a {} sample",
                self.kind,
                sample.source()
            );
            return None;
        }
        self.stats.record_sample(sample.timestamp());
        self.listeners.publish(&sample);
        self.latest = Some(sample.clone());
        Some(sample)
    }

    /// Register a listener for every new sample
    pub fn subscribe(&mut self, on_sample: impl FnMut(&Sample) + 'static) -> SubscriptionId {
        self.listeners.subscribe(on_sample)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.latest.as_ref()
    }
}
