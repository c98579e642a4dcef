//! Mock Feed Implementations for Testing
//!
//! This module provides mock feeds that can be used to run the station
//! without a radio or RTK receiver attached. Values are synthetic; only the
//! sample shape and the arrival cadence mean anything.
//!
//! - [`MockAttitudeFeed`] - random vectors, constant gravity, counters
//! - [`MockPositionFeed`] - a slow circle around (100, 100, 50) with jitter

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{GroundLinkError, Result};
use crate::types::{AttitudeSample, PositionSample, Sample, SourceKind, Timestamp, Vector3};

use super::feed::SampleFeed;

/// Endpoints starting with this prefix refuse to open
pub const UNREACHABLE_PREFIX: &str = "unreachable:";

const STANDARD_GRAVITY: Vector3 = Vector3::new(0.0, 0.0, -9.81);

fn open_endpoint(kind: SourceKind, endpoint: &str) -> Result<()> {
    if endpoint.is_empty() || endpoint.starts_with(UNREACHABLE_PREFIX) {
        return Err(GroundLinkError::connection(
            endpoint,
            format!("{} endpoint unreachable", kind),
        ));
    }
    tracing::info!("Opened mock {} feed on {}", kind, endpoint);
    Ok(())
}

/// Attitude feed producing random motion
#[derive(Debug)]
pub struct MockAttitudeFeed {
    rng: StdRng,
    open: bool,
}

impl Default for MockAttitudeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAttitudeFeed {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible feed for tests
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self { rng, open: false }
    }

    fn random_vector(&mut self) -> Vector3 {
        Vector3::new(
            (self.rng.gen::<f64>() - 0.5) * 10.0,
            (self.rng.gen::<f64>() - 0.5) * 10.0,
            (self.rng.gen::<f64>() - 0.5) * 10.0,
        )
    }
}

impl SampleFeed for MockAttitudeFeed {
    fn kind(&self) -> SourceKind {
        SourceKind::Attitude
    }

    fn open(&mut self, endpoint: &str) -> Result<()> {
        open_endpoint(SourceKind::Attitude, endpoint)?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn read(&mut self, now: Timestamp) -> Result<Option<Sample>> {
        if !self.open {
            return Err(GroundLinkError::InvalidState("attitude feed is closed".into()));
        }
        let sample = AttitudeSample {
            timestamp: now,
            euler_counter: ((now / 1000) % 10_000) as u32,
            euler_angles: self.random_vector(),
            velocity: self.random_vector(),
            gravity: STANDARD_GRAVITY,
            angular_acceleration: self.random_vector(),
            linear_acceleration: self.random_vector(),
            free_heap_size: self.rng.gen_range(10_000..15_000),
            servo_motor_angle: self.rng.gen_range(0.0..180.0),
        };
        Ok(Some(sample.into()))
    }
}

/// Position feed tracing a slow circle derived from stream time
#[derive(Debug)]
pub struct MockPositionFeed {
    rng: StdRng,
    open: bool,
}

impl Default for MockPositionFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPositionFeed {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            open: false,
        }
    }

    /// Reproducible feed for tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            open: false,
        }
    }

    fn jitter(&mut self, amplitude: f64) -> f64 {
        (self.rng.gen::<f64>() - 0.5) * amplitude
    }
}

impl SampleFeed for MockPositionFeed {
    fn kind(&self) -> SourceKind {
        SourceKind::Position
    }

    fn open(&mut self, endpoint: &str) -> Result<()> {
        open_endpoint(SourceKind::Position, endpoint)?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn read(&mut self, now: Timestamp) -> Result<Option<Sample>> {
        if !self.open {
            return Err(GroundLinkError::InvalidState("position feed is closed".into()));
        }
        let t = now as f64;
        let position = Vector3::new(
            100.0 + (t / 10_000.0).sin() * 50.0 + self.jitter(5.0),
            100.0 + (t / 10_000.0).cos() * 50.0 + self.jitter(5.0),
            50.0 + (t / 5_000.0).sin() * 20.0 + self.jitter(2.0),
        );
        let orientation = Vector3::new(
            (t / 2_000.0).sin() * 15.0 + self.jitter(2.0),
            (t / 2_000.0).cos() * 15.0 + self.jitter(2.0),
            (t / 10_000.0) % 360.0,
        );
        Ok(Some(
            PositionSample {
                timestamp: now,
                position,
                orientation,
            }
            .into(),
        ))
    }
}
