//! Throttled bridge between the host sensor and the rest of the engine.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::SamplerConfig,
    errors::SensorError,
    models::Position,
    source::{PositionSource, SensorEvent},
};

/// What the sampler emits after throttling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplerEvent {
    Sample(Position),
    Error(SensorError),
}

/// Watches a [`PositionSource`] and lets through at most one fix per
/// `min_interval_ms` of wall-clock time. Fixes arriving too soon are dropped,
/// not buffered.
pub struct PositionSampler<S, C = SystemClock> {
    source: S,
    clock: C,
    config: SamplerConfig,
    events: Option<UnboundedReceiver<SensorEvent>>,
    /// `None` until the first fix after `start()` is accepted.
    last_accepted_ms: Option<i64>,
}

impl<S: PositionSource> PositionSampler<S, SystemClock> {
    pub fn new(source: S, config: SamplerConfig) -> Self {
        Self::with_clock(source, SystemClock, config)
    }
}

impl<S: PositionSource, C: Clock> PositionSampler<S, C> {
    pub fn with_clock(source: S, clock: C, config: SamplerConfig) -> Self {
        Self {
            source,
            clock,
            config,
            events: None,
            last_accepted_ms: None,
        }
    }

    /// Opens a watch on the host sensor. Restarts cleanly if already started.
    pub fn start(&mut self) -> Result<(), SensorError> {
        if !self.source.is_available() {
            warn!("Positioning capability unavailable, not starting");
            return Err(SensorError::CapabilityUnavailable);
        }

        if self.events.is_some() {
            debug!("Sampler already started, reopening watch");
            self.stop();
        }

        let options = self.config.watch_options();
        let events = self.source.watch(&options)?;
        self.events = Some(events);
        self.last_accepted_ms = None;

        info!(
            min_interval_ms = self.config.min_interval_ms,
            high_accuracy = options.enable_high_accuracy,
            "Position sampler started"
        );
        Ok(())
    }

    /// Closes the watch. Nothing is emitted after this returns.
    pub fn stop(&mut self) {
        let Some(mut events) = self.events.take() else {
            return;
        };
        events.close();
        self.source.clear_watch();
        info!("Position sampler stopped");
    }

    pub fn is_started(&self) -> bool {
        self.events.is_some()
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn last_accepted_ms(&self) -> Option<i64> {
        self.last_accepted_ms
    }

    /// Runs one host event through the throttle. Events handed over while
    /// stopped are ignored.
    pub fn handle(&mut self, event: SensorEvent) -> Option<SamplerEvent> {
        if !self.is_started() {
            debug!("Ignoring sensor event while stopped");
            return None;
        }
        self.apply(event)
    }

    /// Waits for the next emission, skipping throttled fixes. Returns `None`
    /// once stopped or when the host closes the watch.
    pub async fn next_event(&mut self) -> Option<SamplerEvent> {
        loop {
            let event = self.events.as_mut()?.recv().await?;
            if let Some(emitted) = self.apply(event) {
                return Some(emitted);
            }
        }
    }

    /// Non-blocking [`next_event`](Self::next_event): only looks at events
    /// the host has already delivered.
    pub fn try_next_event(&mut self) -> Option<SamplerEvent> {
        loop {
            let event = self.events.as_mut()?.try_recv().ok()?;
            if let Some(emitted) = self.apply(event) {
                return Some(emitted);
            }
        }
    }

    fn apply(&mut self, event: SensorEvent) -> Option<SamplerEvent> {
        match event {
            SensorEvent::Fix(fix) => {
                let now = self.clock.now_ms();
                if let Some(last) = self.last_accepted_ms {
                    let elapsed = now.saturating_sub(last);
                    if elapsed < self.min_interval() {
                        debug!(elapsed_ms = elapsed, "Throttled position fix");
                        return None;
                    }
                }

                self.last_accepted_ms = Some(now);
                let position = Position::from(fix);
                debug!(
                    lat = position.latitude,
                    lon = position.longitude,
                    accuracy = position.accuracy,
                    "Accepted position sample"
                );
                Some(SamplerEvent::Sample(position))
            }
            SensorEvent::Error(error) => {
                warn!("Sensor error: {error}");
                Some(SamplerEvent::Error(error))
            }
        }
    }

    fn min_interval(&self) -> i64 {
        i64::try_from(self.config.min_interval_ms).unwrap_or(i64::MAX)
    }
}
