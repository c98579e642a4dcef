//! Recording and playback of combined records
//!
//! [`RecordingStore`] captures live records into an append-only log and
//! freezes it on stop. [`PlaybackScheduler`] replays a loaded log one record
//! per tick at a configurable speed. [`codec`] converts logs to and from the
//! JSON and CSV formats.

pub mod codec;
pub mod player;
pub mod recorder;
pub mod types;

pub use player::PlaybackScheduler;
pub use recorder::{log_identifier, RecordingSession, RecordingStore};
pub use types::{ExportFormat, PlaybackState, RecordingState};
