//! Test data builders for samples, records and logs

use groundlink_rs::{AttitudeSample, CombinedRecord, Log, PositionSample, Vector3};

/// Builder for attitude samples
pub struct AttitudeBuilder {
    sample: AttitudeSample,
}

impl AttitudeBuilder {
    pub fn new(timestamp: u64) -> Self {
        Self {
            sample: AttitudeSample::with_euler(timestamp, Vector3::default()),
        }
    }

    pub fn euler(mut self, x: f64, y: f64, z: f64) -> Self {
        self.sample.euler_angles = Vector3::new(x, y, z);
        self
    }

    pub fn counter(mut self, counter: u32) -> Self {
        self.sample.euler_counter = counter;
        self
    }

    pub fn servo(mut self, angle: f64) -> Self {
        self.sample.servo_motor_angle = angle;
        self
    }

    pub fn heap(mut self, bytes: u32) -> Self {
        self.sample.free_heap_size = bytes;
        self
    }

    pub fn build(self) -> AttitudeSample {
        self.sample
    }
}

/// Position sample at `timestamp`
pub fn position(timestamp: u64, x: f64, y: f64, z: f64) -> PositionSample {
    PositionSample {
        timestamp,
        position: Vector3::new(x, y, z),
        orientation: Vector3::default(),
    }
}

/// Log of `len` records alternating attitude-only and fully fused, 100 ms apart
pub fn sample_log(len: u64) -> Log {
    (0..len)
        .filter_map(|i| {
            let t = 1_000 + i * 100;
            let attitude = AttitudeBuilder::new(t)
                .counter(i as u32)
                .euler(0.1 * i as f64, 0.0, -1.5)
                .build();
            let rtk = (i % 2 == 1).then(|| position(t, i as f64, 2.0 * i as f64, 100.0));
            CombinedRecord::fuse(Some(attitude), rtk)
        })
        .collect()
}
