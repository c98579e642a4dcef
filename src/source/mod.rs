//! Telemetry sources
//!
//! Each physical (or simulated) feed is wrapped in a [`SourceAdapter`] that
//! gives the rest of the station one uniform contract: connect, stream,
//! subscribe, latest.
//!
//! # Components
//!
//! - [`SampleFeed`] - Trait implemented by anything that yields decoded samples
//! - [`SourceAdapter`] - Connection state, stream timer and listeners around a feed
//! - [`MockAttitudeFeed`] / [`MockPositionFeed`] - Synthetic feeds for running without hardware

pub mod adapter;
pub mod feed;
pub mod mock;

pub use adapter::SourceAdapter;
pub use feed::{FeedStats, SampleFeed};
pub use mock::{MockAttitudeFeed, MockPositionFeed};
