//! Sampler and aggregator wired together behind one handle.

use tracing::{error, info, warn};

use crate::{
    aggregator::TrackAggregator,
    clock::{Clock, SystemClock},
    config::SamplerConfig,
    errors::SensorError,
    models::{Position, SessionSummary, TrackSnapshot},
    sampler::{PositionSampler, SamplerEvent},
    source::PositionSource,
};

/// What a processed event did to the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerUpdate {
    Sample(Position),
    Error(SensorError),
}

pub struct LocationTracker<S, C = SystemClock> {
    sampler: PositionSampler<S, C>,
    aggregator: TrackAggregator,
    clock: C,
}

impl<S: PositionSource> LocationTracker<S, SystemClock> {
    pub fn new(source: S, config: SamplerConfig) -> Self {
        Self::with_clock(source, SystemClock, config)
    }
}

impl<S: PositionSource, C: Clock + Clone> LocationTracker<S, C> {
    pub fn with_clock(source: S, clock: C, config: SamplerConfig) -> Self {
        Self {
            sampler: PositionSampler::with_clock(source, clock.clone(), config),
            aggregator: TrackAggregator::new(),
            clock,
        }
    }

    /// Starts observing and opens a new session. On failure the error is
    /// recorded once and the tracker is left idle, even when a failed
    /// restart tore down a running session.
    pub fn start_tracking(&mut self) -> Result<(), SensorError> {
        if let Err(e) = self.sampler.start() {
            error!("Failed to start tracking: {e}");
            if self.aggregator.end_session(self.clock.now_ms()).is_some() {
                warn!("Restart failed, previous session closed");
            }
            self.aggregator.on_error(e);
            return Err(e);
        }
        self.aggregator.begin_session(self.clock.now_ms());
        Ok(())
    }

    /// Stops observing and closes the session. Safe to call in any state.
    pub fn stop_tracking(&mut self) -> Option<SessionSummary> {
        self.sampler.stop();
        self.aggregator.end_session(self.clock.now_ms())
    }

    pub fn clear_track(&mut self) {
        self.aggregator.clear_track();
    }

    /// Waits for the next sample or error and folds it into the session.
    pub async fn next_update(&mut self) -> Option<TrackerUpdate> {
        let event = self.sampler.next_event().await?;
        Some(self.apply(event))
    }

    /// Non-blocking [`next_update`](Self::next_update).
    pub fn try_next_update(&mut self) -> Option<TrackerUpdate> {
        let event = self.sampler.try_next_event()?;
        Some(self.apply(event))
    }

    /// Processes everything the host has already delivered.
    pub fn drain(&mut self) -> usize {
        let mut processed = 0;
        while self.try_next_update().is_some() {
            processed += 1;
        }
        processed
    }

    /// Runs until the host closes the watch, returning the summary of the
    /// session it closes.
    pub async fn run(&mut self) -> Option<SessionSummary> {
        while self.next_update().await.is_some() {}
        info!("Position source closed");
        self.stop_tracking()
    }

    fn apply(&mut self, event: SamplerEvent) -> TrackerUpdate {
        match event {
            SamplerEvent::Sample(position) => {
                self.aggregator.on_accepted_sample(position);
                TrackerUpdate::Sample(position)
            }
            SamplerEvent::Error(e) => {
                self.aggregator.on_error(e);
                TrackerUpdate::Error(e)
            }
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.aggregator.is_tracking()
    }

    pub fn current_position(&self) -> Option<Position> {
        self.aggregator.current_position()
    }

    pub fn last_error(&self) -> Option<SensorError> {
        self.aggregator.last_error()
    }

    pub fn track(&self) -> &[Position] {
        self.aggregator.track()
    }

    pub fn distance_km(&self) -> f64 {
        self.aggregator.distance_km()
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        self.aggregator.snapshot()
    }

    pub fn aggregator(&self) -> &TrackAggregator {
        &self.aggregator
    }

    pub fn sampler(&self) -> &PositionSampler<S, C> {
        &self.sampler
    }
}
