//! Replays an event script through a [`LocationTracker`] on simulated time.

use serde::Serialize;
use tracing::debug;
use tracker::{
    ChannelSource, Clock, LocationTracker, ManualClock, SamplerConfig, SensorError,
    SessionSummary, TrackerUpdate,
};

use crate::ScriptedEvent;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Events the host handed to the sampler.
    pub delivered: usize,
    pub samples: usize,
    pub errors: usize,
}

impl ReplayStats {
    pub fn throttled(&self) -> usize {
        self.delivered - self.samples - self.errors
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayOutcome {
    pub stats: ReplayStats,
    pub summary: Option<SessionSummary>,
}

/// Delivers each event when the simulated clock reaches its `at_ms` and
/// processes it straight away, like a host callback would.
pub fn replay(
    events: &[ScriptedEvent],
    config: SamplerConfig,
) -> Result<ReplayOutcome, SensorError> {
    let start_ms = events.first().map_or(0, |e| e.at_ms);
    let clock = ManualClock::new(start_ms);
    let (source, handle) = ChannelSource::new();
    let mut tracker = LocationTracker::with_clock(source, clock.clone(), config);

    tracker.start_tracking()?;

    let mut stats = ReplayStats::default();
    for scripted in events {
        // never let simulated time run backwards
        clock.set(scripted.at_ms.max(clock.now_ms()));
        if !handle.push(scripted.event) {
            debug!(at_ms = scripted.at_ms, "Watch closed, dropping event");
            continue;
        }
        stats.delivered += 1;

        while let Some(update) = tracker.try_next_update() {
            match update {
                TrackerUpdate::Sample(_) => stats.samples += 1,
                TrackerUpdate::Error(_) => stats.errors += 1,
            }
        }
    }

    let summary = tracker.stop_tracking();
    Ok(ReplayOutcome { stats, summary })
}
