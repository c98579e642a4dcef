//! Ground station coordinator
//!
//! [`GroundStation`] owns every component and the timer queue, and is the
//! only place they are wired together:
//!
//! ```text
//!  attitude ─┐                 ┌─► recording store (live, armed)
//!            ├─► fusion ───────┤
//!  position ─┘                 └─► mode controller ─► consumer feed
//!                                        ▲
//!  loaded / captured log ─► playback ────┘
//! ```
//!
//! Everything runs on the caller's thread. Time only moves when
//! [`GroundStation::advance_to`] is called, which fires due timers in
//! deadline order.

use crate::config::{PlaybackSettings, StationConfig};
use crate::error::{GroundLinkError, Result};
use crate::events::SubscriptionId;
use crate::fusion::FusionCoordinator;
use crate::mode::{Mode, ModeController};
use crate::session::{ExportFormat, PlaybackScheduler, PlaybackState, RecordingState, RecordingStore};
use crate::source::{MockAttitudeFeed, MockPositionFeed, SampleFeed, SourceAdapter};
use crate::time_fmt;
use crate::timer::{TimerQueue, TimerTask};
use crate::types::{CombinedRecord, Log, Sample, SourceKind, Timestamp};

/// Snapshot of the station for status displays
#[derive(Debug, Clone, PartialEq)]
pub struct StationStatus {
    pub mode: Mode,
    pub attitude_connected: bool,
    pub position_connected: bool,
    pub streaming: bool,
    pub recording: RecordingState,
    pub recorded: usize,
    pub playback: PlaybackState,
    pub cursor: Option<usize>,
    pub log_len: usize,
    pub speed: f64,
    /// Timestamp of the record consumers are showing
    pub last_record: Option<Timestamp>,
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let link = |up: bool| if up { "up" } else { "down" };
        write!(
            f,
            "mode={} attitude={} position={} streaming={} recording={} ({} records) playback={}",
            self.mode,
            link(self.attitude_connected),
            link(self.position_connected),
            self.streaming,
            self.recording.display_name(),
            self.recorded,
            self.playback.display_name(),
        )?;
        match self.cursor {
            Some(cursor) => write!(f, " [{}/{}] @{}x", cursor + 1, self.log_len, self.speed)?,
            None => write!(f, " [no log] @{}x", self.speed)?,
        }
        match self.last_record {
            Some(timestamp) => write!(f, " last={}", time_fmt::format_date(timestamp)),
            None => Ok(()),
        }
    }
}

/// Owns the sources, fusion, recording, playback and mode, and routes records between them
#[derive(Debug)]
pub struct GroundStation {
    attitude: SourceAdapter,
    position: SourceAdapter,
    endpoints: [Option<String>; 2],
    fusion: FusionCoordinator,
    recorder: RecordingStore,
    playback: PlaybackScheduler,
    mode: ModeController,
    timers: TimerQueue,
    /// Whether the operator wants the live streams running
    streams_enabled: bool,
    /// Ascending playback speeds for `step_speed`
    speed_presets: Vec<f64>,
    now: Timestamp,
}

impl GroundStation {
    /// Assemble a station from its parts
    pub fn new(attitude: SourceAdapter, position: SourceAdapter, recorder: RecordingStore) -> Self {
        debug_assert_eq!(attitude.kind(), SourceKind::Attitude);
        debug_assert_eq!(position.kind(), SourceKind::Position);
        Self {
            attitude,
            position,
            endpoints: [None, None],
            fusion: FusionCoordinator::new(),
            recorder,
            playback: PlaybackScheduler::new(),
            mode: ModeController::new(),
            timers: TimerQueue::new(),
            streams_enabled: false,
            speed_presets: PlaybackSettings::default().speed_presets,
            now: 0,
        }
    }

    /// Build a station over the given feeds using `config` for cadence, endpoints and storage
    pub fn with_feeds(
        config: &StationConfig,
        attitude: Box<dyn SampleFeed>,
        position: Box<dyn SampleFeed>,
    ) -> Self {
        let mut recorder = RecordingStore::new().with_max_records(config.recording.max_records);
        if let Some(dir) = &config.recording.directory {
            recorder = recorder.with_directory(dir);
        }
        let mut station = Self::new(
            SourceAdapter::new(attitude, config.attitude.interval_ms),
            SourceAdapter::new(position, config.position.interval_ms),
            recorder,
        );
        if config.attitude.auto_connect {
            station.endpoints[0] = Some(config.attitude.endpoint.clone());
        }
        if config.position.auto_connect {
            station.endpoints[1] = Some(config.position.endpoint.clone());
        }
        station
            .playback
            .set_speed(config.playback.default_speed, &mut station.timers);
        station.set_speed_presets(&config.playback.speed_presets);
        station
    }

    /// Build a station over the mock feeds
    pub fn from_config(config: &StationConfig) -> Self {
        Self::with_feeds(
            config,
            Box::new(MockAttitudeFeed::new()),
            Box::new(MockPositionFeed::new()),
        )
    }

    /// Connect the configured sources and start streaming
    ///
    /// A source that fails to connect is logged and left disconnected; the
    /// other one still starts.
    pub fn init(&mut self, now: Timestamp) {
        self.now = self.now.max(now);
        for kind in [SourceKind::Attitude, SourceKind::Position] {
            let Some(endpoint) = self.endpoints[index_of(kind)].clone() else {
                continue;
            };
            if let Err(e) = self.connect(kind, &endpoint) {
                tracing::warn!("{}", e);
            }
        }
        self.start_streams();
        tracing::info!("Ground station initialized in {} mode", self.mode.mode());
    }

    /// Stop everything: streams, playback, recording, connections
    pub fn shutdown(&mut self) {
        self.stop_streams();
        self.playback.pause(&mut self.timers);
        self.recorder.stop_logging();
        for kind in [SourceKind::Attitude, SourceKind::Position] {
            if let Err(e) = self.disconnect(kind) {
                tracing::warn!("{}", e);
            }
        }
        tracing::info!("Ground station shut down");
    }

    fn adapter_mut(&mut self, kind: SourceKind) -> &mut SourceAdapter {
        match kind {
            SourceKind::Attitude => &mut self.attitude,
            SourceKind::Position => &mut self.position,
        }
    }

    pub fn adapter(&self, kind: SourceKind) -> &SourceAdapter {
        match kind {
            SourceKind::Attitude => &self.attitude,
            SourceKind::Position => &self.position,
        }
    }

    /// Register a raw-sample listener on one source
    pub fn subscribe_source(
        &mut self,
        kind: SourceKind,
        on_sample: impl FnMut(&Sample) + 'static,
    ) -> SubscriptionId {
        self.adapter_mut(kind).subscribe(on_sample)
    }

    /// Connect one source. Streams it right away if live streaming is on.
    pub fn connect(&mut self, kind: SourceKind, endpoint: &str) -> Result<()> {
        self.adapter_mut(kind).connect(endpoint)?;
        self.endpoints[index_of(kind)] = Some(endpoint.to_string());
        if self.streams_enabled && self.mode.is_live() {
            let now = self.now;
            let timers = &mut self.timers;
            match kind {
                SourceKind::Attitude => self.attitude.start_stream(timers, now)?,
                SourceKind::Position => self.position.start_stream(timers, now)?,
            }
        }
        Ok(())
    }

    pub fn disconnect(&mut self, kind: SourceKind) -> Result<()> {
        let timers = &mut self.timers;
        match kind {
            SourceKind::Attitude => self.attitude.disconnect(timers),
            SourceKind::Position => self.position.disconnect(timers),
        }
    }

    /// Start streaming every connected source (live mode only)
    pub fn start_streams(&mut self) {
        self.streams_enabled = true;
        if self.mode.is_live() {
            self.resume_streams();
        }
    }

    /// Stop streaming all sources; connections stay up
    pub fn stop_streams(&mut self) {
        self.streams_enabled = false;
        self.halt_streams();
    }

    fn resume_streams(&mut self) {
        let now = self.now;
        for adapter in [&mut self.attitude, &mut self.position] {
            if adapter.is_connected() {
                if let Err(e) = adapter.start_stream(&mut self.timers, now) {
                    tracing::warn!("{}", e);
                }
            }
        }
    }

    fn halt_streams(&mut self) {
        self.attitude.stop_stream(&mut self.timers);
        self.position.stop_stream(&mut self.timers);
    }

    pub fn is_streaming(&self) -> bool {
        self.attitude.is_streaming() || self.position.is_streaming()
    }

    /// Push a decoded sample as if its source had just delivered it
    ///
    /// Returns the fused record when it reached the consumer feed.
    pub fn ingest(&mut self, sample: Sample) -> Option<CombinedRecord> {
        let sample = self.adapter_mut(sample.source()).accept(sample)?;
        self.route_live(sample)
    }

    fn route_live(&mut self, sample: Sample) -> Option<CombinedRecord> {
        let record = self.fusion.ingest(sample)?;
        if !self.mode.is_live() {
            return None;
        }
        self.recorder.append(&record);
        self.mode.offer(Mode::Live, &record);
        Some(record)
    }

    fn route_playback(&mut self, record: Option<CombinedRecord>) -> Option<CombinedRecord> {
        let record = record?;
        self.mode.offer(Mode::Playback, &record).then_some(record)
    }

    /// Fire every timer due at or before `now`, in deadline order
    ///
    /// Returns the number of ticks handled.
    pub fn advance_to(&mut self, now: Timestamp) -> usize {
        self.now = self.now.max(now);
        let mut fired = 0;
        while let Some((_, task)) = self.timers.pop_due(self.now) {
            fired += 1;
            match task {
                TimerTask::Stream(kind) => {
                    let now = self.now;
                    if let Some(sample) = self.adapter_mut(kind).poll(now) {
                        self.route_live(sample);
                    }
                }
                TimerTask::PlaybackTick => {
                    let record = self.playback.tick(&mut self.timers);
                    self.route_playback(record);
                }
            }
        }
        fired
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.next_deadline()
    }

    /// Latest time the station has advanced to
    pub fn now(&self) -> Timestamp {
        self.now
    }

    // ==================== Mode ====================

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    /// Switch between live and playback
    ///
    /// Going to playback stops the streams from driving the feed and shows
    /// the loaded log's record under the cursor, if any. Going back to live
    /// pauses playback and resumes the streams.
    pub fn set_mode(&mut self, mode: Mode) {
        if !self.mode.switch_to(mode) {
            return;
        }
        match mode {
            Mode::Playback => {
                self.halt_streams();
                if let Some(cursor) = self.playback.cursor() {
                    let record = self.playback.seek(cursor as i64);
                    self.route_playback(record);
                }
            }
            Mode::Live => {
                self.playback.pause(&mut self.timers);
                if self.streams_enabled {
                    self.resume_streams();
                }
                if let Some(record) = self.fusion.latest_combined() {
                    self.mode.offer(Mode::Live, &record);
                }
            }
        }
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(self.mode().other());
    }

    /// The record consumers should be showing
    pub fn current_record(&self) -> Option<&CombinedRecord> {
        self.mode.current()
    }

    /// Subscribe to the single consumer feed
    pub fn on_combined_record(
        &mut self,
        callback: impl FnMut(&CombinedRecord) + 'static,
    ) -> SubscriptionId {
        self.mode.on_combined_record(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.mode.unsubscribe(id)
    }

    // ==================== Recording ====================

    pub fn start_logging(&mut self) {
        self.recorder.start_logging();
    }

    pub fn stop_logging(&mut self) -> Option<Log> {
        self.recorder.stop_logging()
    }

    pub fn is_logging(&self) -> bool {
        self.recorder.is_logging()
    }

    pub fn log_file_path(&self) -> Option<&str> {
        self.recorder.log_file_path()
    }

    pub fn export_log(&self, format: ExportFormat) -> Result<String> {
        self.recorder.export_log(format)
    }

    // ==================== Playback ====================

    /// Load a log by identifier into the playback scheduler
    ///
    /// On failure the current log and mode are left as they were.
    pub fn load_log(&mut self, identifier: &str) -> Result<usize> {
        let log = self.recorder.load_log_file(identifier)?;
        Ok(self.load(log))
    }

    /// Load the log frozen by the last `stop_logging`
    pub fn load_recorded(&mut self) -> Result<usize> {
        let log = self
            .recorder
            .frozen_log()
            .cloned()
            .ok_or_else(|| GroundLinkError::NotFound("no finished recording".to_string()))?;
        Ok(self.load(log))
    }

    /// Load an in-memory log into the playback scheduler
    pub fn load(&mut self, log: Log) -> usize {
        let len = log.len();
        self.playback.load(log, &mut self.timers);
        if !self.mode.is_live() {
            let record = self.playback.seek(0);
            self.route_playback(record);
        }
        len
    }

    /// Start or resume playback (playback mode only)
    pub fn play(&mut self) {
        if self.mode.is_live() {
            tracing::debug!("Ignoring play in live mode");
            return;
        }
        let record = self.playback.play(&mut self.timers, self.now);
        self.route_playback(record);
    }

    pub fn pause(&mut self) {
        self.playback.pause(&mut self.timers);
    }

    /// Move the playback cursor and show that record
    pub fn seek(&mut self, index: i64) {
        let record = self.playback.seek(index);
        self.route_playback(record);
    }

    pub fn set_speed(&mut self, multiplier: f64) -> bool {
        self.playback.set_speed(multiplier, &mut self.timers)
    }

    /// Replace the speeds `step_speed` moves between; invalid entries are dropped
    pub fn set_speed_presets(&mut self, presets: &[f64]) {
        let mut presets: Vec<f64> = presets
            .iter()
            .copied()
            .filter(|s| s.is_finite() && *s > 0.0)
            .collect();
        presets.sort_by(f64::total_cmp);
        presets.dedup();
        self.speed_presets = presets;
    }

    pub fn speed_presets(&self) -> &[f64] {
        &self.speed_presets
    }

    /// Move to the nearest preset above (`faster`) or below the current speed
    ///
    /// Returns the speed in effect afterwards, unchanged past either end.
    pub fn step_speed(&mut self, faster: bool) -> f64 {
        let current = self.playback.speed();
        let next = if faster {
            self.speed_presets.iter().copied().find(|s| *s > current)
        } else {
            self.speed_presets.iter().rev().copied().find(|s| *s < current)
        };
        if let Some(speed) = next {
            self.set_speed(speed);
        }
        self.playback.speed()
    }

    // ==================== Queries ====================

    pub fn fusion(&self) -> &FusionCoordinator {
        &self.fusion
    }

    pub fn recorder(&self) -> &RecordingStore {
        &self.recorder
    }

    pub fn playback(&self) -> &PlaybackScheduler {
        &self.playback
    }

    pub fn status(&self) -> StationStatus {
        StationStatus {
            mode: self.mode.mode(),
            attitude_connected: self.attitude.is_connected(),
            position_connected: self.position.is_connected(),
            streaming: self.is_streaming(),
            recording: self.recorder.state(),
            recorded: self.recorder.record_count(),
            playback: self.playback.state(),
            cursor: self.playback.cursor(),
            log_len: self.playback.len(),
            speed: self.playback.speed(),
            last_record: self.mode.current().map(|r| r.timestamp),
        }
    }
}

fn index_of(kind: SourceKind) -> usize {
    match kind {
        SourceKind::Attitude => 0,
        SourceKind::Position => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::UNREACHABLE_PREFIX;
    use crate::types::{AttitudeSample, PositionSample, Vector3};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn station() -> GroundStation {
        let config = StationConfig::default();
        GroundStation::with_feeds(
            &config,
            Box::new(MockAttitudeFeed::seeded(1)),
            Box::new(MockPositionFeed::seeded(2)),
        )
    }

    fn feed_log(station: &mut GroundStation) -> Rc<RefCell<Vec<CombinedRecord>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        station.on_combined_record(move |r| s.borrow_mut().push(r.clone()));
        seen
    }

    fn attitude(timestamp: Timestamp) -> Sample {
        AttitudeSample::with_euler(timestamp, Vector3::new(1.0, 2.0, 3.0)).into()
    }

    fn position(timestamp: Timestamp) -> Sample {
        position_sample(timestamp).into()
    }

    fn position_sample(timestamp: Timestamp) -> PositionSample {
        PositionSample {
            timestamp,
            position: Vector3::new(10.0, 20.0, 30.0),
            orientation: Vector3::default(),
        }
    }

    fn position_log(len: u64) -> Log {
        (0..len)
            .filter_map(|i| CombinedRecord::fuse(None, Some(position_sample(i))))
            .collect()
    }

    #[test]
    fn test_init_streams_both_sources() {
        let mut station = station();
        let seen = feed_log(&mut station);
        station.init(0);
        assert!(station.is_streaming());

        station.advance_to(3000);
        // Two sources at 1 Hz for 3 s
        assert_eq!(seen.borrow().len(), 6);
        let last = seen.borrow().last().cloned().unwrap();
        assert!(last.attitude.is_some() && last.position.is_some());
    }

    #[test]
    fn test_failed_connect_leaves_other_source_running() {
        let mut config = StationConfig::default();
        config.attitude.endpoint = format!("{}COM3", UNREACHABLE_PREFIX);
        let mut station = GroundStation::with_feeds(
            &config,
            Box::new(MockAttitudeFeed::seeded(1)),
            Box::new(MockPositionFeed::seeded(2)),
        );
        station.init(0);
        assert!(!station.status().attitude_connected);
        assert!(station.status().position_connected);

        station.advance_to(2000);
        let record = station.current_record().unwrap();
        assert!(record.attitude.is_none());
        assert!(record.position.is_some());

        // Retry succeeds and joins the running stream
        station.connect(SourceKind::Attitude, "COM5").unwrap();
        station.advance_to(3000);
        assert!(station.current_record().unwrap().attitude.is_some());
    }

    #[test]
    fn test_live_records_are_recorded_while_armed() {
        let mut station = station();
        station.ingest(attitude(1));
        station.start_logging();
        station.ingest(position(2));
        station.ingest(attitude(3));
        station.ingest(position(4));
        let log = station.stop_logging().unwrap();
        station.ingest(attitude(5));

        assert_eq!(
            log.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        let csv = station.export_log(ExportFormat::Csv).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_playback_mode_without_log_shows_nothing() {
        let mut station = station();
        let seen = feed_log(&mut station);
        station.init(0);
        station.advance_to(1000);
        assert!(station.current_record().is_some());

        station.set_mode(Mode::Playback);
        assert!(station.current_record().is_none());
        assert!(!station.is_streaming());

        // Live samples pushed in playback mode never reach consumers
        let before = seen.borrow().len();
        assert!(station.ingest(attitude(5000)).is_none());
        station.advance_to(10_000);
        assert_eq!(seen.borrow().len(), before);
        assert!(station.current_record().is_none());
    }

    #[test]
    fn test_record_then_replay() {
        let mut station = station();
        station.start_logging();
        for t in [1000, 1100, 1200] {
            station.ingest(attitude(t));
        }
        station.stop_logging();

        station.set_mode(Mode::Playback);
        let seen = feed_log(&mut station);
        assert_eq!(station.load_recorded().unwrap(), 3);
        assert_eq!(station.current_record().map(|r| r.timestamp), Some(1000));

        station.play();
        station.advance_to(station.now() + 5000);
        assert_eq!(
            seen.borrow().iter().map(|r| r.timestamp).collect::<Vec<_>>(),
            vec![1000, 1100, 1200]
        );
        assert_eq!(station.playback().state(), PlaybackState::Ready);
    }

    #[test]
    fn test_back_to_live_pauses_playback() {
        let mut station = station();
        station.set_mode(Mode::Playback);
        station.load(position_log(10));
        station.play();
        station.advance_to(2000);
        assert_eq!(station.playback().cursor(), Some(2));

        station.set_mode(Mode::Live);
        assert_eq!(station.playback().state(), PlaybackState::Paused);
        station.advance_to(10_000);
        assert_eq!(station.playback().cursor(), Some(2));
    }

    #[test]
    fn test_play_ignored_in_live_mode() {
        let mut station = station();
        station.load(position_log(1));
        station.play();
        assert_eq!(station.playback().state(), PlaybackState::Ready);
    }

    #[test]
    fn test_load_failure_keeps_log() {
        let mut station = station();
        station.set_mode(Mode::Playback);
        station.load(position_log(1));

        let err = station.load_log("no_such_log.json").unwrap_err();
        assert!(matches!(err, GroundLinkError::NotFound(_)));
        assert_eq!(station.playback().len(), 1);
        assert_eq!(station.mode(), Mode::Playback);
    }

    #[test]
    fn test_shutdown_cancels_everything() {
        let mut station = station();
        station.init(0);
        station.start_logging();
        station.shutdown();
        assert!(station.next_deadline().is_none());
        assert!(!station.is_logging());
        assert!(!station.status().attitude_connected);
    }

    #[test]
    fn test_step_speed_walks_presets() {
        let mut station = station();
        assert_eq!(station.speed_presets(), &[0.25, 0.5, 1.0, 2.0, 4.0]);
        assert_eq!(station.step_speed(true), 2.0);
        assert_eq!(station.step_speed(true), 4.0);
        assert_eq!(station.step_speed(true), 4.0);

        // An off-preset speed steps to its neighbours
        station.set_speed(3.0);
        assert_eq!(station.step_speed(false), 2.0);

        station.set_speed_presets(&[2.0, f64::NAN, 0.5, -1.0, 2.0]);
        assert_eq!(station.speed_presets(), &[0.5, 2.0]);
        assert_eq!(station.step_speed(false), 0.5);
        assert_eq!(station.step_speed(false), 0.5);
    }

    #[test]
    fn test_status_shows_last_record_time() {
        let mut station = station();
        assert!(station.status().last_record.is_none());
        station.ingest(attitude(1_714_573_845_123));
        let status = station.status();
        assert_eq!(status.last_record, Some(1_714_573_845_123));
        assert!(status.to_string().contains(".123"));
    }

    #[test]
    fn test_status_display() {
        let station = station();
        let text = station.status().to_string();
        assert!(text.contains("mode=Live"));
        assert!(text.contains("[no log]"));
    }
}
