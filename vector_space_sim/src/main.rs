//! Vector Space headless playback CLI
//!
//! Plays synthetic scenarios or JSON scene files and reports detection metrics.

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;
use vector_space_sim::scenarios::ScenarioId;
use vector_space_sim::{FrameExport, PlaybackConfig, PlaybackResult, PlaybackRunner, SceneFile, SimError, SimResult};

/// Vector Space playback CLI
#[derive(Parser, Debug)]
#[command(name = "vector-space-sim")]
#[command(about = "Headless playback of platform/sensor scenes", long_about = None)]
struct Args {
    /// Seed for synthetic scenarios (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Scenario to run (racetrack, crossing, banked_turn, orphan, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Play a JSON scene file instead of a synthetic scenario
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Playback step in milliseconds
    #[arg(long, default_value = "100")]
    step_ms: i64,

    /// FOV tessellation resolution in degrees
    #[arg(long, default_value = "5.0")]
    fov_resolution: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export frames, poses and FOV meshes to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    match run(&args) {
        Ok(results) => {
            report(&args, &results);
            if results.iter().any(|r| !r.passed) {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Error: {}", e);
            if matches!(e, SimError::UnknownScenario(_)) {
                eprintln!("Available scenarios: racetrack, crossing, banked_turn, orphan, all");
            }
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> SimResult<Vec<PlaybackResult>> {
    if !args.json {
        info!("Vector Space Playback v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let config = PlaybackConfig {
        step_ms: args.step_ms,
        fov_resolution_deg: args.fov_resolution,
    };
    let runner = PlaybackRunner::new(seed).with_config(config);

    // Scene file mode
    if let Some(path) = &args.scene {
        let label = path.display().to_string();
        let scene = SceneFile::load(path)?.build()?;
        let mut export = args.export.as_ref().map(|_| FrameExport::new(&label, None));
        let result = runner.play(&label, &scene, export.as_mut());
        write_export(args, export, result.passed)?;
        return Ok(vec![result]);
    }

    let scenarios: Vec<ScenarioId> = if args.scenario.eq_ignore_ascii_case("all") {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse()?]
    };

    if args.export.is_some() && scenarios.len() > 1 {
        return Err(SimError::invalid_config(
            "--export only supports a single scenario, not 'all'",
        ));
    }

    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let mut export = args
            .export
            .as_ref()
            .map(|_| FrameExport::new(scenario.name(), Some(seed)));
        let result = runner.run(scenario, export.as_mut())?;
        write_export(args, export, result.passed)?;
        results.push(result);
    }
    Ok(results)
}

fn write_export(args: &Args, export: Option<FrameExport>, passed: bool) -> SimResult<()> {
    if let (Some(path), Some(mut export)) = (&args.export, export) {
        export.finalize(passed);
        export.write_to_file(path)?;
        info!("Exported {} frames to {}", export.frames.len(), path.display());
    }
    Ok(())
}

fn report(args: &Args, results: &[PlaybackResult]) {
    let total = results.len();
    let failed = results.iter().filter(|r| !r.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed,
            "failed": failed,
            "results": results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.label,
                    "seed": r.seed,
                    "passed": r.passed,
                    "start_ms": r.start,
                    "end_ms": r.end,
                    "frames": r.metrics.frames,
                    "pairs_evaluated": r.metrics.pairs_evaluated,
                    "detected_pairs": r.metrics.detected_pairs,
                    "max_simultaneous": r.metrics.max_simultaneous,
                    "orphaned_sensors": r.metrics.orphaned_sensors,
                    "skipped_sensor_frames": r.metrics.skipped_sensor_frames,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to encode summary: {}", e),
        }
        return;
    }

    for result in results {
        let seed = result.seed.map(|s| format!(" (seed={})", s)).unwrap_or_default();
        if result.passed {
            info!("✓ {}{} PASSED", result.label, seed);
        } else {
            error!(
                "✗ {}{} FAILED: {}",
                result.label,
                seed,
                result.failure_reason.as_deref().unwrap_or("unknown")
            );
        }
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if failed == 0 {
        info!("✅ All {} playback runs passed!", total);
    } else {
        error!("❌ {}/{} playback runs failed!", failed, total);
    }
}
