//! Core data types for the ground station
//!
//! This module contains the fundamental data structures shared by every
//! component: the per-source samples, the fused record and the immutable log.
//!
//! # Main Types
//!
//! - [`Vector3`] - Three scalar components, no unit conversion applied
//! - [`AttitudeSample`] - Inertial/attitude reading (LoRa downlink)
//! - [`PositionSample`] - Positioning reading (RTK GPS)
//! - [`Sample`] - Either of the above, tagged with its source
//! - [`CombinedRecord`] - Fused record built from the latest sample of each source
//! - [`Log`] - Immutable, ordered sequence of combined records
//!
//! # Serialization
//!
//! Field names serialize in camelCase and the two optional sources are keyed
//! `lora` and `rtk`, matching the log files produced by the dashboard.

use serde::{Deserialize, Serialize};
use std::ops::Index;
use std::sync::Arc;

/// Milliseconds since the Unix epoch, on the producing source's clock
pub type Timestamp = u64;

/// Three scalar components
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Identifies which feed produced a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Inertial/attitude feed (LoRa downlink from the vehicle)
    Attitude,
    /// Positioning feed (RTK GPS)
    Position,
}

impl SourceKind {
    /// Display name for the source
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceKind::Attitude => "attitude",
            SourceKind::Position => "position",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Attitude reading from the vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttitudeSample {
    pub timestamp: Timestamp,
    pub euler_counter: u32,
    pub euler_angles: Vector3,
    pub velocity: Vector3,
    pub gravity: Vector3,
    pub angular_acceleration: Vector3,
    pub linear_acceleration: Vector3,
    pub free_heap_size: u32,
    pub servo_motor_angle: f64,
}

impl AttitudeSample {
    /// Attitude sample with the given Euler angles and every other field zeroed
    pub fn with_euler(timestamp: Timestamp, euler_angles: Vector3) -> Self {
        Self {
            timestamp,
            euler_counter: 0,
            euler_angles,
            velocity: Vector3::default(),
            gravity: Vector3::default(),
            angular_acceleration: Vector3::default(),
            linear_acceleration: Vector3::default(),
            free_heap_size: 0,
            servo_motor_angle: 0.0,
        }
    }
}

/// Position reading from the RTK receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub timestamp: Timestamp,
    pub position: Vector3,
    pub orientation: Vector3,
}

/// A single-source timestamped reading
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Attitude(AttitudeSample),
    Position(PositionSample),
}

impl Sample {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Sample::Attitude(s) => s.timestamp,
            Sample::Position(s) => s.timestamp,
        }
    }

    pub fn source(&self) -> SourceKind {
        match self {
            Sample::Attitude(_) => SourceKind::Attitude,
            Sample::Position(_) => SourceKind::Position,
        }
    }
}

impl From<AttitudeSample> for Sample {
    fn from(sample: AttitudeSample) -> Self {
        Sample::Attitude(sample)
    }
}

impl From<PositionSample> for Sample {
    fn from(sample: PositionSample) -> Self {
        Sample::Position(sample)
    }
}

/// Fused record holding the latest sample of each source
///
/// At least one side is always present; [`CombinedRecord::fuse`] refuses to
/// build an empty record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedRecord {
    pub timestamp: Timestamp,
    #[serde(rename = "lora", default, skip_serializing_if = "Option::is_none")]
    pub attitude: Option<AttitudeSample>,
    #[serde(rename = "rtk", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionSample>,
}

impl CombinedRecord {
    /// Fuse the given samples, stamping the record with the newest timestamp
    ///
    /// Returns `None` when both sides are absent.
    pub fn fuse(attitude: Option<AttitudeSample>, position: Option<PositionSample>) -> Option<Self> {
        let timestamp = match (&attitude, &position) {
            (None, None) => return None,
            (Some(a), None) => a.timestamp,
            (None, Some(p)) => p.timestamp,
            (Some(a), Some(p)) => a.timestamp.max(p.timestamp),
        };
        Some(Self {
            timestamp,
            attitude,
            position,
        })
    }

    pub fn has_attitude(&self) -> bool {
        self.attitude.is_some()
    }

    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }
}

/// Immutable, ordered sequence of combined records
///
/// Cloning a log is cheap; the records are shared. A new log replaces an old
/// one, it is never edited in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Log {
    records: Arc<[CombinedRecord]>,
}

impl Log {
    /// Create an empty log
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CombinedRecord> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&CombinedRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&CombinedRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CombinedRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[CombinedRecord] {
        &self.records
    }

    /// Time covered by the log in milliseconds
    pub fn span_ms(&self) -> u64 {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.timestamp.saturating_sub(first.timestamp),
            _ => 0,
        }
    }
}

impl From<Vec<CombinedRecord>> for Log {
    fn from(records: Vec<CombinedRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }
}

impl FromIterator<CombinedRecord> for Log {
    fn from_iter<I: IntoIterator<Item = CombinedRecord>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

impl Index<usize> for Log {
    type Output = CombinedRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a Log {
    type Item = &'a CombinedRecord;
    type IntoIter = std::slice::Iter<'a, CombinedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
