//! Location tracking engine.
//!
//! Raw fixes from the device sensor go through a [`PositionSampler`], which
//! throttles them to a fixed cadence, and land in a [`TrackAggregator`], which
//! keeps the ordered track and the haversine distance walked so far.
//! [`LocationTracker`] wires the two together for hosts that just want a
//! start/stop button and something to draw.

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod errors;
pub mod geodesy;
pub mod models;
pub mod sampler;
pub mod source;
pub mod tracker;

pub use aggregator::TrackAggregator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SamplerConfig;
pub use errors::{ConfigError, SensorError, TrackerError};
pub use geodesy::{EARTH_RADIUS_KM, haversine_km, path_length_km};
pub use models::{Position, RawFix, SessionState, SessionSummary, TrackSnapshot};
pub use sampler::{PositionSampler, SamplerEvent};
pub use source::{ChannelSource, PositionSource, SensorEvent, SourceHandle, WatchOptions};
pub use tracker::{LocationTracker, TrackerUpdate};
