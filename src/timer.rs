//! Clocks and cancellable periodic timers
//!
//! The station is driven by a single [`TimerQueue`]. Owners schedule a
//! repeating [`TimerTask`] and keep the returned [`TimerId`]; cancelling the
//! id removes the pending tick immediately, so nothing fires for it after
//! [`TimerQueue::cancel`] returns.
//!
//! Time is plain milliseconds supplied by a [`Clock`]. The binary uses
//! [`SystemClock`]; tests drive a [`ManualClock`] so replay is deterministic.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{SourceKind, Timestamp};

/// Source of the current time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> Timestamp;
}

/// Wall clock, milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis().max(0) as Timestamp
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: Timestamp) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) -> Timestamp {
        self.now.fetch_add(delta_ms, Ordering::SeqCst) + delta_ms
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Work a timer triggers when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Poll a source adapter's feed
    Stream(SourceKind),
    /// Advance the playback cursor
    PlaybackTick,
}

/// Handle to a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Timer {
    task: TimerTask,
    period_ms: u64,
    deadline: Timestamp,
}

/// Single-threaded queue of repeating timers
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    timers: BTreeMap<TimerId, Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` every `period_ms`, first firing one period after `now`
    pub fn schedule_repeating(&mut self, now: Timestamp, period_ms: u64, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let period_ms = period_ms.max(1);
        self.timers.insert(
            id,
            Timer {
                task,
                period_ms,
                deadline: now.saturating_add(period_ms),
            },
        );
        tracing::trace!("Scheduled {:?} as {:?} every {} ms", task, id, period_ms);
        id
    }

    /// Remove a timer. Returns false if it was not scheduled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Change the period used when the timer is next re-armed
    ///
    /// The already pending deadline is left alone.
    pub fn set_period(&mut self, id: TimerId, period_ms: u64) -> bool {
        match self.timers.get_mut(&id) {
            Some(timer) => {
                timer.period_ms = period_ms.max(1);
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Take the earliest timer due at `now`, re-arming it for its next period
    ///
    /// Ties are broken by scheduling order. Call repeatedly until `None` to
    /// catch up on every tick that elapsed.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TimerId, TimerTask)> {
        let (id, _) = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(id, t)| (t.deadline, **id))?;
        let id = *id;
        let timer = self.timers.get_mut(&id)?;
        timer.deadline = timer.deadline.saturating_add(timer.period_ms);
        Some((id, timer.task))
    }
}

/// Tick period for a playback speed multiplier, at one record per second at 1x
pub fn period_for_speed(speed: f64) -> u64 {
    (1000.0 / speed).round().max(1.0) as u64
}
