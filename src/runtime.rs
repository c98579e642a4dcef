//! Main loop
//!
//! The station is single-threaded. [`Runtime::run`] alternates between
//! firing due timers and waiting for operator commands, sleeping on the
//! command channel until the next timer deadline. Other threads only talk to
//! it through the channel and the shared `running` flag.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::control::{execute, CommandOutcome, ControlCommand};
use crate::station::GroundStation;
use crate::timer::Clock;

/// Longest the loop blocks when no timer is pending
pub const IDLE_WAIT_MS: u64 = 250;

/// Drives a [`GroundStation`] from a clock and a command channel
pub struct Runtime<C: Clock> {
    station: GroundStation,
    clock: C,
    cmd_rx: Receiver<ControlCommand>,
    running: Arc<AtomicBool>,
    on_outcome: Box<dyn FnMut(&CommandOutcome)>,
}

impl<C: Clock> Runtime<C> {
    pub fn new(
        station: GroundStation,
        clock: C,
        cmd_rx: Receiver<ControlCommand>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            station,
            clock,
            cmd_rx,
            running,
            on_outcome: Box::new(|_| {}),
        }
    }

    /// Receive the result of every successful command
    pub fn on_outcome(mut self, callback: impl FnMut(&CommandOutcome) + 'static) -> Self {
        self.on_outcome = Box::new(callback);
        self
    }

    pub fn station(&self) -> &GroundStation {
        &self.station
    }

    pub fn station_mut(&mut self) -> &mut GroundStation {
        &mut self.station
    }

    /// Run until `running` is cleared, a quit command arrives or the
    /// command channel closes. Returns the station for shutdown.
    pub fn run(mut self) -> GroundStation {
        tracing::info!("Station loop started");
        let now = self.clock.now_ms();
        self.station.init(now);

        while self.running.load(Ordering::Relaxed) {
            self.station.advance_to(self.clock.now_ms());

            match self.cmd_rx.recv_timeout(self.wait_time()) {
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("Command channel closed");
                    self.running.store(false, Ordering::Relaxed);
                }
            }
        }

        self.station.shutdown();
        tracing::info!("Station loop exiting");
        self.station
    }

    fn wait_time(&self) -> Duration {
        let now = self.clock.now_ms();
        let wait = self
            .station
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(now))
            .unwrap_or(IDLE_WAIT_MS)
            .min(IDLE_WAIT_MS);
        Duration::from_millis(wait)
    }

    fn handle(&mut self, command: ControlCommand) {
        // Commands act at the current time, after anything already due
        self.station.advance_to(self.clock.now_ms());
        match execute(&mut self.station, command) {
            Ok(CommandOutcome::Quit) => {
                tracing::info!("Quit requested");
                self.running.store(false, Ordering::Relaxed);
            }
            Ok(outcome) => (self.on_outcome)(&outcome),
            Err(e) => tracing::warn!("Command failed: {}", e),
        }
    }
}
