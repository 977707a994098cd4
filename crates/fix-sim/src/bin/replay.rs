//! Replays a fix stream through the tracker and prints the session summary.
//!
//! Run with:
//! ```
//! cargo run -p fix-sim --bin replay -- --walk 3000 --seed 7
//! cargo run -p fix-sim --bin replay -- --gpx morning.gpx --export accepted.gpx
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fix_sim::{GpxLoader, ProceduralWalk, load_script, replay};
use rand::{SeedableRng, rngs::StdRng};
use tracing_subscriber::EnvFilter;
use tracker::SamplerConfig;

#[derive(Debug, Parser)]
#[command(name = "replay", about = "Replay position fixes through the tracker")]
struct Args {
    /// Recorded track to replay
    #[arg(long, conflicts_with_all = ["walk", "script"])]
    gpx: Option<PathBuf>,

    /// Generate a procedural walk of this many meters
    #[arg(long, conflicts_with = "script")]
    walk: Option<f64>,

    /// JSON array of scripted sensor events
    #[arg(long)]
    script: Option<PathBuf>,

    /// Seed for procedural walks
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// JSON sampler config; TRACKER_* environment variables apply otherwise
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the minimum interval between accepted samples
    #[arg(long)]
    min_interval_ms: Option<u64>,

    /// Write the accepted track to this GPX file
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SamplerConfig::from_json(&json)?
        }
        None => SamplerConfig::from_env()?,
    };
    if let Some(ms) = args.min_interval_ms {
        config.min_interval_ms = ms;
    }

    let events = if let Some(path) = &args.gpx {
        let fixes = GpxLoader::new()
            .load_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        tracing::info!("Loaded {} fixes from {}", fixes.len(), path.display());
        GpxLoader::to_script(&fixes)
    } else if let Some(path) = &args.script {
        load_script(path).with_context(|| format!("loading {}", path.display()))?
    } else {
        let meters = args.walk.unwrap_or(2_000.0);
        let mut rng = StdRng::seed_from_u64(args.seed);
        ProceduralWalk::new().with_distance(meters).generate(&mut rng)?
    };

    let outcome = replay(&events, config)?;

    tracing::info!("Replay completed!");
    tracing::info!("  Delivered: {}", outcome.stats.delivered);
    tracing::info!("  Accepted: {}", outcome.stats.samples);
    tracing::info!("  Throttled: {}", outcome.stats.throttled());
    tracing::info!("  Errors: {}", outcome.stats.errors);

    if let (Some(path), Some(summary)) = (&args.export, &outcome.summary) {
        GpxLoader::write_file(path, &summary.points, Some("Replayed track"))?;
        tracing::info!("Wrote accepted track to {}", path.display());
    }

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(())
}
