//! # GroundLink-RS: rocket telemetry ground station
//!
//! Receives attitude (LoRa) and position (RTK) telemetry from two
//! independent sources, fuses the latest sample from each into a
//! [`CombinedRecord`], and hands consumers a single record feed that comes
//! either from the live stream or from replaying a recorded log.
//!
//! ## Architecture
//!
//! - **Sources**: [`source::SourceAdapter`] wraps a [`source::SampleFeed`] and polls it on a timer
//! - **Fusion**: [`fusion::FusionCoordinator`] merges the freshest sample of each kind
//! - **Session**: capture live records, export them as JSON or CSV, replay them at any speed
//! - **Mode**: [`mode::ModeController`] selects which producer drives the consumer feed
//! - **Station**: [`GroundStation`] owns all of the above and routes records between them
//!
//! Everything runs on one thread, driven by a [`timer::TimerQueue`]. The
//! binary feeds operator commands in through a crossbeam channel.
//!
//! ## Example
//!
//! ```no_run
//! use groundlink_rs::{GroundStation, Mode, StationConfig};
//!
//! let config = StationConfig::load_or_default(None);
//! let mut station = GroundStation::from_config(&config);
//! station.on_combined_record(|record| println!("{}", record.timestamp));
//! station.init(0);
//! station.advance_to(5_000);
//!
//! station.set_mode(Mode::Playback);
//! station.load_log("rocket_telemetry_2024-05-01T12-30-45.000Z.json").ok();
//! station.play();
//! ```

pub mod config;
pub mod control;
pub mod error;
pub mod events;
pub mod fusion;
pub mod mode;
pub mod runtime;
pub mod session;
pub mod source;
pub mod station;
pub mod time_fmt;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use config::StationConfig;
pub use control::{CommandOutcome, ControlCommand};
pub use error::{GroundLinkError, Result};
pub use mode::Mode;
pub use session::{ExportFormat, PlaybackState, RecordingState};
pub use station::GroundStation;
pub use types::{AttitudeSample, CombinedRecord, Log, PositionSample, Sample, SourceKind, Vector3};
