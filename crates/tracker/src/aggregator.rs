//! Track accumulation and running distance.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    errors::SensorError,
    geodesy,
    models::{Position, SessionState, SessionSummary, TrackSnapshot},
};

/// Owns the track of the current (or most recent) session.
///
/// The current position is refreshed by every accepted sample so it can be
/// shown live, but samples only join the track while a session is running.
#[derive(Debug, Default)]
pub struct TrackAggregator {
    state: SessionState,
    track: Vec<Position>,
    distance_km: f64,
    current_position: Option<Position>,
    last_error: Option<SensorError>,
    session_id: Option<Uuid>,
    started_at_ms: i64,
}

impl TrackAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session. Calling it while already tracking discards
    /// the running session and starts over.
    pub fn begin_session(&mut self, now_ms: i64) {
        if self.state == SessionState::Tracking {
            debug!(
                points = self.track.len(),
                "Session already running, re-initializing"
            );
        }

        let session_id = Uuid::new_v4();
        self.state = SessionState::Tracking;
        self.track.clear();
        self.distance_km = 0.0;
        self.last_error = None;
        self.session_id = Some(session_id);
        self.started_at_ms = now_ms;

        info!(%session_id, "Tracking session started");
    }

    /// Stops accumulating. The track stays readable until the next
    /// `begin_session` or `clear_track`.
    pub fn end_session(&mut self, now_ms: i64) -> Option<SessionSummary> {
        if self.state == SessionState::Idle {
            return None;
        }
        self.state = SessionState::Idle;

        let summary = SessionSummary::new(
            self.session_id.unwrap_or_else(Uuid::new_v4),
            self.started_at_ms,
            now_ms,
            self.track.clone(),
            self.distance_km,
        );

        info!(
            session_id = %summary.session_id,
            points = summary.point_count,
            distance_km = summary.distance_km,
            "Tracking session ended"
        );
        Some(summary)
    }

    pub fn clear_track(&mut self) {
        self.track.clear();
        self.distance_km = 0.0;
    }

    pub fn on_accepted_sample(&mut self, position: Position) {
        self.current_position = Some(position);
        self.last_error = None;

        if self.state != SessionState::Tracking {
            return;
        }

        if let Some(prev) = self.track.last() {
            self.distance_km += geodesy::distance_between(prev, &position);
        }
        self.track.push(position);
    }

    pub fn on_error(&mut self, error: SensorError) {
        self.last_error = Some(error);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }

    pub fn track(&self) -> &[Position] {
        &self.track
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            state: self.state,
            points: self.track.clone(),
            distance_km: self.distance_km,
        }
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    /// Distance rebuilt from the track alone.
    pub fn recomputed_distance_km(&self) -> f64 {
        geodesy::path_length_km(&self.track)
    }

    pub fn current_position(&self) -> Option<Position> {
        self.current_position
    }

    pub fn last_error(&self) -> Option<SensorError> {
        self.last_error
    }
}
