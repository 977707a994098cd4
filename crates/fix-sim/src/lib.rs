//! Position fix streams for exercising the tracker.
//!
//! This crate produces the kind of input a device sensor would: noisy,
//! irregular fixes with the occasional dropout. Streams come from a
//! procedural random walk or from recorded GPX files, and can be replayed
//! through a [`tracker::LocationTracker`] on a simulated clock.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fix_sim::prelude::*;
//!
//! let mut rng = rand::thread_rng();
//! let events = ProceduralWalk::new()
//!     .with_start(48.8566, 2.3522)
//!     .with_distance(2_000.0)
//!     .generate(&mut rng)?;
//!
//! let outcome = replay(&events, SamplerConfig::default())?;
//! println!("{:.2} km", outcome.summary.unwrap().distance_km);
//! ```

pub mod gpx_files;
pub mod procedural;
pub mod replay;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracker::SensorEvent;

/// A sensor event and the wall-clock time the host delivers it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub at_ms: i64,
    pub event: SensorEvent,
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Invalid simulation config: {0}")]
    InvalidConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Script parse error: {0}")]
    Script(#[from] serde_json::Error),
}

/// Reads a JSON array of scripted events.
pub fn load_script(path: impl AsRef<Path>) -> Result<Vec<ScriptedEvent>, SimError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

pub use gpx_files::{GpxError, GpxLoader};
pub use procedural::{ProceduralWalk, WalkConfig};
pub use replay::{ReplayOutcome, ReplayStats, replay};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::gpx_files::GpxLoader;
    pub use crate::procedural::{ProceduralWalk, WalkConfig};
    pub use crate::replay::{ReplayOutcome, ReplayStats, replay};
    pub use crate::{ScriptedEvent, load_script};
    pub use tracker::{SamplerConfig, SensorError, SensorEvent};
}
