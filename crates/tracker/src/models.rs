use geo::LineString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A single accepted position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Degrees, [-90, 90]
    pub latitude: f64,
    /// Degrees, [-180, 180]
    pub longitude: f64,
    /// Uncertainty radius in meters
    pub accuracy: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64, accuracy: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            timestamp,
        }
    }

    /// Longitude/latitude pair, the order geometry libraries expect.
    pub fn lon_lat(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }
}

/// A fix exactly as the host positioning capability reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub timestamp_ms: i64,
}

impl From<RawFix> for Position {
    fn from(fix: RawFix) -> Self {
        Position {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy_meters,
            timestamp: fix.timestamp_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Tracking,
}

/// Owned copy of the track handed to rendering and stat widgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackSnapshot {
    pub state: SessionState,
    pub points: Vec<Position>,
    pub distance_km: f64,
}

impl TrackSnapshot {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Everything the persistence layer needs once a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at_ms: i64,
    pub ended_at_ms: i64,
    pub distance_km: f64,
    pub distance_meters: f64,
    pub point_count: usize,
    /// Span between the first and last sample, zero for fewer than two.
    pub duration_seconds: f64,
    pub points: Vec<Position>,
}

impl SessionSummary {
    pub fn new(
        session_id: Uuid,
        started_at_ms: i64,
        ended_at_ms: i64,
        points: Vec<Position>,
        distance_km: f64,
    ) -> Self {
        let duration_seconds = match (points.first(), points.last()) {
            (Some(first), Some(last)) => {
                last.timestamp.saturating_sub(first.timestamp) as f64 / 1000.0
            }
            _ => 0.0,
        };

        Self {
            session_id,
            started_at_ms,
            ended_at_ms,
            distance_km,
            distance_meters: distance_km * 1000.0,
            point_count: points.len(),
            duration_seconds,
            points,
        }
    }

    pub fn started_at(&self) -> Option<OffsetDateTime> {
        ms_to_datetime(self.started_at_ms)
    }

    pub fn ended_at(&self) -> Option<OffsetDateTime> {
        ms_to_datetime(self.ended_at_ms)
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        self.points.iter().map(Position::lon_lat).collect::<Vec<_>>().into()
    }

    /// WKT LINESTRING of the track, `None` when there is no segment to draw.
    pub fn to_wkt(&self) -> Option<String> {
        if self.points.len() < 2 {
            return None;
        }

        let coords: Vec<String> = self
            .points
            .iter()
            .map(|p| format!("{} {}", p.longitude, p.latitude))
            .collect();

        Some(format!("LINESTRING({})", coords.join(", ")))
    }
}

fn ms_to_datetime(ms: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<Position> {
        vec![
            Position::new(48.8566, 2.3522, 5.0, 1_000),
            Position::new(48.8666, 2.3522, 5.0, 21_000),
            Position::new(48.8666, 2.3622, 8.0, 41_000),
        ]
    }

    #[test]
    fn test_raw_fix_normalization() {
        let fix = RawFix {
            latitude: 10.5,
            longitude: -20.25,
            accuracy_meters: 12.0,
            timestamp_ms: 1_700_000_000_000,
        };
        let pos = Position::from(fix);
        assert_eq!(pos, Position::new(10.5, -20.25, 12.0, 1_700_000_000_000));
    }

    #[test]
    fn test_summary_duration_and_count() {
        let summary = SessionSummary::new(Uuid::new_v4(), 0, 50_000, sample_points(), 1.5);
        assert_eq!(summary.point_count, 3);
        assert_eq!(summary.duration_seconds, 40.0);
        assert_eq!(summary.distance_meters, 1500.0);
    }

    #[test]
    fn test_summary_empty_track() {
        let summary = SessionSummary::new(Uuid::new_v4(), 0, 10, Vec::new(), 0.0);
        assert_eq!(summary.duration_seconds, 0.0);
        assert!(summary.to_wkt().is_none());
        assert_eq!(summary.to_line_string().0.len(), 0);
    }

    #[test]
    fn test_summary_wkt_is_lon_lat() {
        let points = sample_points()[..2].to_vec();
        let summary = SessionSummary::new(Uuid::new_v4(), 0, 10, points, 1.1);
        assert_eq!(
            summary.to_wkt().as_deref(),
            Some("LINESTRING(2.3522 48.8566, 2.3522 48.8666)")
        );
    }

    #[test]
    fn test_summary_line_string() {
        let summary = SessionSummary::new(Uuid::new_v4(), 0, 10, sample_points(), 0.0);
        let line = summary.to_line_string();
        assert_eq!(line.0.len(), 3);
        assert_eq!(line.0[2].x, 2.3622);
        assert_eq!(line.0[2].y, 48.8666);
    }

    #[test]
    fn test_summary_duration_with_extreme_timestamps() {
        let points = vec![
            Position::new(0.0, 0.0, 5.0, i64::MIN),
            Position::new(0.0, 0.0, 5.0, i64::MAX),
        ];
        let summary = SessionSummary::new(Uuid::new_v4(), 0, 10, points, 0.0);
        assert_eq!(summary.duration_seconds, i64::MAX as f64 / 1000.0);
    }

    #[test]
    fn test_summary_timestamps() {
        let summary = SessionSummary::new(
            Uuid::new_v4(),
            1_700_000_000_000,
            1_700_000_060_000,
            Vec::new(),
            0.0,
        );
        let started = summary.started_at().unwrap();
        let ended = summary.ended_at().unwrap();
        assert_eq!(started.unix_timestamp(), 1_700_000_000);
        assert_eq!((ended - started).whole_seconds(), 60);
    }

    #[test]
    fn test_summary_serializes() {
        let summary = SessionSummary::new(Uuid::nil(), 0, 10, sample_points(), 2.0);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["point_count"], 3);
        assert_eq!(json["points"][0]["latitude"], 48.8566);
        assert_eq!(
            json["session_id"],
            "00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_session_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SessionState::Tracking).unwrap(),
            "\"tracking\""
        );
    }
}
