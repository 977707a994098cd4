//! Procedural fix streams: a pedestrian random walk seen through a noisy sensor.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracker::{RawFix, SensorError, SensorEvent};

use crate::{ScriptedEvent, SimError};

/// Meters per degree of latitude, close enough for jitter and step sizes.
const METERS_PER_DEGREE: f64 = 111_000.0;

/// Configuration for procedural walks.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// Target distance in meters.
    pub distance_meters: f64,
    /// Starting point (lat, lon).
    pub start_point: (f64, f64),
    /// Walking speed in meters per second.
    pub speed_mps: f64,
    /// Range of gaps between two sensor reports, in milliseconds.
    pub fix_interval_ms: (i64, i64),
    /// GPS position jitter standard deviation in meters.
    pub gps_jitter_m: f64,
    /// Reported accuracy range in meters.
    pub accuracy_range_m: (f64, f64),
    /// Probability that a report is a `PositionUnavailable` error instead of a fix.
    pub dropout_probability: f64,
    /// Wall-clock time of the first report.
    pub start_ms: i64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            distance_meters: 2_000.0,
            start_point: (48.8566, 2.3522),
            speed_mps: 1.4,
            fix_interval_ms: (500, 3_000),
            gps_jitter_m: 4.0,
            accuracy_range_m: (3.0, 25.0),
            dropout_probability: 0.01,
            start_ms: 1_700_000_000_000,
        }
    }
}

/// Generates sensor event scripts for a walker with momentum.
#[derive(Debug, Clone, Default)]
pub struct ProceduralWalk {
    config: WalkConfig,
}

impl ProceduralWalk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WalkConfig) -> Self {
        Self { config }
    }

    /// Sets the target distance.
    pub fn with_distance(mut self, meters: f64) -> Self {
        self.config.distance_meters = meters;
        self
    }

    /// Sets the starting point.
    pub fn with_start(mut self, lat: f64, lon: f64) -> Self {
        self.config.start_point = (lat, lon);
        self
    }

    /// Sets GPS jitter amount.
    pub fn with_gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    pub fn with_fix_interval(mut self, min_ms: i64, max_ms: i64) -> Self {
        self.config.fix_interval_ms = (min_ms, max_ms);
        self
    }

    pub fn with_dropouts(mut self, probability: f64) -> Self {
        self.config.dropout_probability = probability;
        self
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    fn validate(&self) -> Result<(), SimError> {
        let c = &self.config;
        if c.speed_mps.is_nan() || c.speed_mps <= 0.0 {
            return Err(SimError::InvalidConfig("speed_mps must be positive".into()));
        }
        if c.fix_interval_ms.0 <= 0 || c.fix_interval_ms.0 > c.fix_interval_ms.1 {
            return Err(SimError::InvalidConfig(
                "fix_interval_ms must be a positive, ordered range".into(),
            ));
        }
        if !(0.0..=1.0).contains(&c.dropout_probability) {
            return Err(SimError::InvalidConfig(
                "dropout_probability must be within 0..=1".into(),
            ));
        }
        if c.accuracy_range_m.0 < 0.0 || c.accuracy_range_m.0 > c.accuracy_range_m.1 {
            return Err(SimError::InvalidConfig(
                "accuracy_range_m must be a non-negative, ordered range".into(),
            ));
        }
        Ok(())
    }

    /// Generates the event script.
    ///
    /// Reports come at irregular intervals; every reported fix carries the
    /// time it was taken and Gaussian jitter around the true path.
    pub fn generate(&self, rng: &mut impl Rng) -> Result<Vec<ScriptedEvent>, SimError> {
        self.validate()?;

        let c = &self.config;
        let jitter = Normal::new(0.0, c.gps_jitter_m / METERS_PER_DEGREE)
            .map_err(|e| SimError::InvalidConfig(format!("gps_jitter_m: {e}")))?;

        let mut events = Vec::new();
        let (mut lat, mut lon) = c.start_point;
        let mut walked = 0.0;
        let mut at_ms = c.start_ms;

        // Random walk with some momentum to create natural-looking paths
        let mut heading = rng.gen_range(0.0..std::f64::consts::TAU);

        events.push(self.report(lat, lon, at_ms, &jitter, rng));

        while walked < c.distance_meters {
            let gap_ms = rng.gen_range(c.fix_interval_ms.0..=c.fix_interval_ms.1);
            let step = c.speed_mps * gap_ms as f64 / 1000.0;
            heading += rng.gen_range(-0.3..0.3);

            lat += (step * heading.cos()) / METERS_PER_DEGREE;
            lon += (step * heading.sin()) / (METERS_PER_DEGREE * lat.to_radians().cos());
            walked += step;
            at_ms += gap_ms;

            events.push(self.report(lat, lon, at_ms, &jitter, rng));
        }

        Ok(events)
    }

    fn report(
        &self,
        lat: f64,
        lon: f64,
        at_ms: i64,
        jitter: &Normal<f64>,
        rng: &mut impl Rng,
    ) -> ScriptedEvent {
        let c = &self.config;
        let event = if rng.r#gen::<f64>() < c.dropout_probability {
            SensorEvent::Error(SensorError::PositionUnavailable)
        } else {
            SensorEvent::Fix(RawFix {
                latitude: (lat + jitter.sample(rng)).clamp(-90.0, 90.0),
                longitude: wrap_longitude(lon + jitter.sample(rng)),
                accuracy_meters: rng.gen_range(c.accuracy_range_m.0..=c.accuracy_range_m.1),
                timestamp_ms: at_ms,
            })
        };
        ScriptedEvent { at_ms, event }
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        lon
    } else {
        (lon + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use tracker::haversine_km;

    use super::*;

    fn fixes(events: &[ScriptedEvent]) -> Vec<RawFix> {
        events
            .iter()
            .filter_map(|e| match e.event {
                SensorEvent::Fix(fix) => Some(fix),
                SensorEvent::Error(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_generate_walk() {
        let mut rng = StdRng::seed_from_u64(42);
        let events = ProceduralWalk::new()
            .with_distance(500.0)
            .with_dropouts(0.0)
            .generate(&mut rng)
            .unwrap();

        assert!(events.len() > 100);
        assert_eq!(fixes(&events).len(), events.len());
    }

    #[test]
    fn test_timestamps_increase() {
        let mut rng = StdRng::seed_from_u64(1);
        let events = ProceduralWalk::new().with_distance(300.0).generate(&mut rng).unwrap();

        for window in events.windows(2) {
            let gap = window[1].at_ms - window[0].at_ms;
            assert!((500..=3_000).contains(&gap), "gap {gap}");
        }
    }

    #[test]
    fn test_start_point_and_spread() {
        let mut rng = StdRng::seed_from_u64(3);
        let events = ProceduralWalk::new()
            .with_start(40.015, -105.2705)
            .with_gps_jitter(0.0)
            .with_dropouts(0.0)
            .with_distance(1_000.0)
            .generate(&mut rng)
            .unwrap();

        let fixes = fixes(&events);
        assert_eq!((fixes[0].latitude, fixes[0].longitude), (40.015, -105.2705));

        // straight-line displacement never exceeds the walked distance
        let last = fixes.last().unwrap();
        let displacement = haversine_km(40.015, -105.2705, last.latitude, last.longitude);
        assert!(displacement < 1.1, "displacement {displacement}");
    }

    #[test]
    fn test_dropouts_become_errors() {
        let mut rng = StdRng::seed_from_u64(9);
        let events = ProceduralWalk::new()
            .with_dropouts(1.0)
            .with_distance(100.0)
            .generate(&mut rng)
            .unwrap();

        assert!(events
            .iter()
            .all(|e| e.event == SensorEvent::Error(SensorError::PositionUnavailable)));
    }

    #[test]
    fn test_same_seed_same_walk() {
        let walk = ProceduralWalk::new().with_distance(200.0);
        let a = walk.generate(&mut StdRng::seed_from_u64(5)).unwrap();
        let b = walk.generate(&mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            ProceduralWalk::new().with_fix_interval(0, 10).generate(&mut rng),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProceduralWalk::new().with_dropouts(1.5).generate(&mut rng),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProceduralWalk::new().with_gps_jitter(-1.0).generate(&mut rng),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(10.0), 10.0);
        assert!((wrap_longitude(181.0) - -179.0).abs() < 1e-9);
        assert!((wrap_longitude(-181.0) - 179.0).abs() < 1e-9);
    }
}
