//! Replays recorded and generated tracks end to end.

use fix_sim::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use tracker::{Position, haversine_km};

/// A straight walk north from Paris, one point every 5 seconds.
fn recorded_walk() -> Vec<Position> {
    (0..60)
        .map(|i| {
            Position::new(
                48.8566 + f64::from(i) * 0.0001,
                2.3522,
                5.0,
                1_700_000_000_000 + i64::from(i) * 5_000,
            )
        })
        .collect()
}

#[test]
fn recorded_gpx_is_throttled_to_fifteen_seconds() {
    let path = std::env::temp_dir().join("fix_sim_recorded_walk.gpx");
    GpxLoader::write_file(&path, &recorded_walk(), Some("Recorded walk")).unwrap();

    let fixes = GpxLoader::new().load_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(fixes.len(), 60);

    let outcome = replay(&GpxLoader::to_script(&fixes), SamplerConfig::default()).unwrap();
    let summary = outcome.summary.unwrap();

    // every third point survives: 0s, 15s, 30s, ... 285s
    assert_eq!(summary.point_count, 20);
    assert_eq!(outcome.stats.throttled(), 40);

    let expected = haversine_km(48.8566, 2.3522, 48.8566 + 57.0 * 0.0001, 2.3522);
    assert!((summary.distance_km - expected).abs() < 1e-6);
}

#[test]
fn shorter_interval_keeps_more_points() {
    let mut rng = StdRng::seed_from_u64(21);
    let events = ProceduralWalk::new()
        .with_distance(1_500.0)
        .with_dropouts(0.05)
        .generate(&mut rng)
        .unwrap();

    let slow = replay(&events, SamplerConfig::default()).unwrap();
    let fast = replay(&events, SamplerConfig::default().with_min_interval_ms(5_000)).unwrap();

    assert!(fast.stats.samples > slow.stats.samples);
    assert_eq!(fast.stats.errors, slow.stats.errors);
    assert!(fast.stats.errors > 0);
}
