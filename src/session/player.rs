//! Playback scheduler for replaying logs on a virtual clock

use crate::events::{SubscriptionId, Topic};
use crate::timer::{period_for_speed, TimerId, TimerQueue, TimerTask};
use crate::types::{CombinedRecord, Log, Timestamp};

use super::types::PlaybackState;

/// Replays a [`Log`] one record per tick
///
/// The tick period is `1000 ms / speed`. Records are replayed exactly as
/// captured; nothing is synthesized between them, so irregular capture
/// spacing shows up as uniform tick spacing. Playback stops at the last
/// record instead of looping.
#[derive(Debug)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    log: Log,
    cursor: usize,
    /// Whether the record at `cursor` has already been published
    shown: bool,
    speed: f64,
    timer: Option<TimerId>,
    listeners: Topic<CombinedRecord>,
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackScheduler {
    /// Create a scheduler with no log at 1x speed
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            log: Log::empty(),
            cursor: 0,
            shown: false,
            speed: 1.0,
            timer: None,
            listeners: Topic::new("playback"),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Cursor into the log; `None` when there is nothing to point at
    pub fn cursor(&self) -> Option<usize> {
        (!self.log.is_empty()).then_some(self.cursor)
    }

    /// Record under the cursor
    pub fn current(&self) -> Option<&CombinedRecord> {
        self.log.get(self.cursor)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current tick period in milliseconds
    pub fn period_ms(&self) -> u64 {
        period_for_speed(self.speed)
    }

    /// Position through the log (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        match self.log.len() {
            0 | 1 => 0.0,
            n => self.cursor as f64 / (n - 1) as f64,
        }
    }

    /// Whether a playback tick is pending
    pub fn has_pending_tick(&self) -> bool {
        self.timer.is_some()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CombinedRecord) + 'static) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Replace the log and rewind
    ///
    /// An empty log leaves the scheduler `Stopped`.
    pub fn load(&mut self, log: Log, timers: &mut TimerQueue) {
        self.cancel_tick(timers);
        self.log = log;
        self.cursor = 0;
        self.shown = false;
        self.state = if self.log.is_empty() {
            PlaybackState::Stopped
        } else {
            PlaybackState::Ready
        };
        tracing::info!("Loaded log with {} records", self.log.len());
    }

    /// Drop the log
    pub fn unload(&mut self, timers: &mut TimerQueue) {
        self.load(Log::empty(), timers);
    }

    /// Start or resume playback
    ///
    /// Publishes the record under the cursor if it has not been shown yet,
    /// then ticks forward. At the last record there is nothing left to play
    /// and the scheduler settles in `Ready`; seek back to replay.
    /// Returns the record published immediately, if any.
    pub fn play(&mut self, timers: &mut TimerQueue, now: Timestamp) -> Option<CombinedRecord> {
        if !self.state.can_play() || self.log.is_empty() {
            tracing::debug!("Ignoring play in state {}", self.state.display_name());
            return None;
        }

        let last = self.log.len() - 1;
        let published = if self.shown {
            None
        } else {
            self.publish_current()
        };

        if self.cursor >= last {
            self.state = PlaybackState::Ready;
            return published;
        }

        self.state = PlaybackState::Playing;
        self.cancel_tick(timers);
        self.timer = Some(timers.schedule_repeating(
            now,
            self.period_ms(),
            TimerTask::PlaybackTick,
        ));
        tracing::debug!(
            "Playback started at {} / {} ({}x)",
            self.cursor,
            self.log.len(),
            self.speed
        );
        published
    }

    /// Pause playback, cancelling the pending tick. Idempotent.
    pub fn pause(&mut self, timers: &mut TimerQueue) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.cancel_tick(timers);
        self.state = PlaybackState::Paused;
        tracing::debug!("Playback paused at {}", self.cursor);
    }

    /// Handle a playback tick: advance by one and publish
    ///
    /// Reaching the last record returns the scheduler to `Ready`.
    pub fn tick(&mut self, timers: &mut TimerQueue) -> Option<CombinedRecord> {
        if self.state != PlaybackState::Playing {
            self.cancel_tick(timers);
            return None;
        }
        let last = self.log.len().saturating_sub(1);
        if self.cursor >= last {
            self.finish(timers);
            return None;
        }

        self.cursor += 1;
        let published = self.publish_current();
        if self.cursor >= last {
            self.finish(timers);
        }
        published
    }

    /// Jump to `index`, clamped into the log, and publish that record
    ///
    /// Playing/paused state is left as is.
    pub fn seek(&mut self, index: i64) -> Option<CombinedRecord> {
        if self.log.is_empty() {
            tracing::debug!("Ignoring seek with no log loaded");
            return None;
        }
        let last = self.log.len() - 1;
        self.cursor = usize::try_from(index.max(0)).unwrap_or(usize::MAX).min(last);
        self.publish_current()
    }

    /// Change the speed multiplier
    ///
    /// The pending tick keeps its deadline; the new period applies from the
    /// tick after. Non-positive or non-finite multipliers are ignored.
    pub fn set_speed(&mut self, multiplier: f64, timers: &mut TimerQueue) -> bool {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            tracing::debug!("Ignoring invalid playback speed {}", multiplier);
            return false;
        }
        self.speed = multiplier;
        if let Some(id) = self.timer {
            timers.set_period(id, self.period_ms());
        }
        true
    }

    fn finish(&mut self, timers: &mut TimerQueue) {
        self.cancel_tick(timers);
        self.state = PlaybackState::Ready;
        tracing::debug!("Playback reached the end of the log");
    }

    fn cancel_tick(&mut self, timers: &mut TimerQueue) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
    }

    fn publish_current(&mut self) -> Option<CombinedRecord> {
        let record = self.log.get(self.cursor)?.clone();
        self.shown = true;
        self.listeners.publish(&record);
        Some(record)
    }
}
