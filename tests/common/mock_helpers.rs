//! Mock construction helpers

use groundlink_rs::config::StationConfig;
use groundlink_rs::error::{GroundLinkError, Result};
use groundlink_rs::source::{MockAttitudeFeed, MockPositionFeed, SampleFeed};
use groundlink_rs::{GroundStation, Sample, SourceKind};
use std::collections::VecDeque;

/// Feed that replays a fixed script of samples, restamped at read time
pub struct ScriptedFeed {
    kind: SourceKind,
    script: VecDeque<Sample>,
    open: bool,
}

impl ScriptedFeed {
    pub fn new(kind: SourceKind, script: impl IntoIterator<Item = Sample>) -> Self {
        Self {
            kind,
            script: script.into_iter().collect(),
            open: false,
        }
    }
}

impl SampleFeed for ScriptedFeed {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn open(&mut self, _endpoint: &str) -> Result<()> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open = false;
        Ok(())
    }

    fn read(&mut self, now: u64) -> Result<Option<Sample>> {
        if !self.open {
            return Err(GroundLinkError::InvalidState("feed closed".to_string()));
        }
        Ok(self.script.pop_front().map(|sample| match sample {
            Sample::Attitude(mut a) => {
                a.timestamp = now;
                Sample::Attitude(a)
            }
            Sample::Position(mut p) => {
                p.timestamp = now;
                Sample::Position(p)
            }
        }))
    }
}

/// Station over seeded mock feeds with default settings
pub fn create_test_station() -> GroundStation {
    create_test_station_with(&StationConfig::default())
}

pub fn create_test_station_with(config: &StationConfig) -> GroundStation {
    GroundStation::with_feeds(
        config,
        Box::new(MockAttitudeFeed::seeded(42)),
        Box::new(MockPositionFeed::seeded(43)),
    )
}
