//! GPX file loading and export.

use std::path::Path;

use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint, read};
use thiserror::Error;
use time::OffsetDateTime;
use tracker::{Position, RawFix, SensorEvent};

use crate::ScriptedEvent;

#[derive(Debug, Error)]
pub enum GpxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("GPX parse error: {0}")]
    Parse(#[from] gpx::errors::GpxError),
    #[error("No tracks found in GPX file")]
    NoTracks,
    #[error("No track points found")]
    NoPoints,
}

/// Loads recorded tracks as sensor fixes.
#[derive(Debug, Clone)]
pub struct GpxLoader {
    /// Accuracy reported for every loaded fix; GPX carries none.
    pub accuracy_meters: f64,
    /// Gap assumed after the previous point when a point has no time.
    pub fallback_spacing_ms: i64,
}

impl Default for GpxLoader {
    fn default() -> Self {
        Self {
            accuracy_meters: 5.0,
            fallback_spacing_ms: 1_000,
        }
    }
}

impl GpxLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Vec<RawFix>, GpxError> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let gpx: Gpx = read(reader)?;

        self.extract_fixes(&gpx)
    }

    pub fn load_bytes(&self, data: &[u8]) -> Result<Vec<RawFix>, GpxError> {
        let gpx: Gpx = read(std::io::Cursor::new(data))?;

        self.extract_fixes(&gpx)
    }

    /// Flattens every track and segment into one fix sequence.
    fn extract_fixes(&self, gpx: &Gpx) -> Result<Vec<RawFix>, GpxError> {
        if gpx.tracks.is_empty() {
            return Err(GpxError::NoTracks);
        }

        let mut fixes: Vec<RawFix> = Vec::new();

        for track in &gpx.tracks {
            for segment in &track.segments {
                for waypoint in &segment.points {
                    let point = waypoint.point();
                    let timestamp_ms = match waypoint.time {
                        Some(t) => datetime_to_ms(OffsetDateTime::from(t)),
                        None => fixes
                            .last()
                            .map_or(0, |prev| prev.timestamp_ms + self.fallback_spacing_ms),
                    };

                    fixes.push(RawFix {
                        latitude: point.y(),
                        longitude: point.x(),
                        accuracy_meters: self.accuracy_meters,
                        timestamp_ms,
                    });
                }
            }
        }

        if fixes.is_empty() {
            return Err(GpxError::NoPoints);
        }

        Ok(fixes)
    }

    /// Turns loaded fixes into a replay script delivered at their own times.
    pub fn to_script(fixes: &[RawFix]) -> Vec<ScriptedEvent> {
        fixes
            .iter()
            .map(|fix| ScriptedEvent {
                at_ms: fix.timestamp_ms,
                event: SensorEvent::Fix(*fix),
            })
            .collect()
    }

    /// Writes an accepted track to a GPX 1.1 file for viewing in other tools.
    pub fn write_file(
        path: impl AsRef<Path>,
        points: &[Position],
        name: Option<&str>,
    ) -> Result<(), GpxError> {
        let waypoints: Vec<Waypoint> = points
            .iter()
            .map(|p| {
                let mut wp = Waypoint::new(geo::Point::new(p.longitude, p.latitude));
                wp.time = ms_to_datetime(p.timestamp).map(gpx::Time::from);
                wp
            })
            .collect();

        let mut track = Track::new();
        track.name = name.map(String::from);
        track.segments = vec![TrackSegment { points: waypoints }];

        let gpx = Gpx {
            version: GpxVersion::Gpx11,
            tracks: vec![track],
            ..Default::default()
        };

        let file = std::fs::File::create(path)?;
        gpx::write(&gpx, file)?;

        Ok(())
    }
}

fn datetime_to_ms(dt: OffsetDateTime) -> i64 {
    (dt.unix_timestamp_nanos() / 1_000_000) as i64
}

fn ms_to_datetime(ms: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="fix-sim" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Morning walk</name>
    <trkseg>
      <trkpt lat="48.8566" lon="2.3522"><time>2023-11-14T22:13:20Z</time></trkpt>
      <trkpt lat="48.8666" lon="2.3522"><time>2023-11-14T22:13:40Z</time></trkpt>
      <trkpt lat="48.8766" lon="2.3522"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_load_bytes() {
        let fixes = GpxLoader::new().load_bytes(SAMPLE.as_bytes()).unwrap();
        assert_eq!(fixes.len(), 3);
        assert_eq!(fixes[0].latitude, 48.8566);
        assert_eq!(fixes[0].longitude, 2.3522);
        assert_eq!(fixes[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(fixes[1].timestamp_ms, 1_700_000_020_000);
        // missing time falls back to the previous point plus the spacing
        assert_eq!(fixes[2].timestamp_ms, 1_700_000_021_000);
        assert!(fixes.iter().all(|f| f.accuracy_meters == 5.0));
    }

    #[test]
    fn test_no_tracks() {
        let empty = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="fix-sim" xmlns="http://www.topografix.com/GPX/1/1"></gpx>"#;
        assert!(matches!(
            GpxLoader::new().load_bytes(empty.as_bytes()),
            Err(GpxError::NoTracks)
        ));
    }

    #[test]
    fn test_to_script_uses_fix_times() {
        let fixes = GpxLoader::new().load_bytes(SAMPLE.as_bytes()).unwrap();
        let script = GpxLoader::to_script(&fixes);
        assert_eq!(script.len(), 3);
        assert_eq!(script[1].at_ms, 1_700_000_020_000);
        assert_eq!(script[1].event, SensorEvent::Fix(fixes[1]));
    }

    #[test]
    fn test_write_then_load() {
        let points = vec![
            Position::new(40.0, -105.3, 5.0, 1_700_000_000_000),
            Position::new(40.01, -105.29, 5.0, 1_700_000_060_000),
        ];

        let temp_path = std::env::temp_dir().join("fix_sim_write_then_load.gpx");
        GpxLoader::write_file(&temp_path, &points, Some("Test Track")).unwrap();

        let loaded = GpxLoader::new().load_file(&temp_path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].timestamp_ms, 1_700_000_060_000);

        std::fs::remove_file(temp_path).ok();
    }
}
