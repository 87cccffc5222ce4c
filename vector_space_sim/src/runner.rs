//! Playback runner - steps a scene through time and checks expectations.

use crate::config::PlaybackConfig;
use crate::error::SimResult;
use crate::exporter::FrameExport;
use crate::scenarios::ScenarioId;
use std::collections::BTreeMap;
use tracing::{debug, info};
use vector_space_core::{FrameSnapshot, Scene, SensorId, Timestamp};

/// Frames between progress log lines.
const LOG_INTERVAL: u64 = 50;

/// Results from one playback.
#[derive(Debug, Clone)]
pub struct PlaybackResult {
    /// Scenario name or scene file path
    pub label: String,

    /// Seed used (synthetic scenarios only)
    pub seed: Option<u64>,

    /// Whether all expectations held
    pub passed: bool,

    pub start: Timestamp,
    pub end: Timestamp,

    /// Failure message if any
    pub failure_reason: Option<String>,

    pub metrics: PlaybackMetrics,
}

/// Metrics collected during playback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackMetrics {
    /// Frames resolved
    pub frames: u64,

    /// (sensor, target) pairs evaluated
    pub pairs_evaluated: u64,

    /// Pairs with the detection flag set
    pub detected_pairs: u64,

    /// Most detections in a single frame
    pub max_simultaneous: usize,

    /// Sensors excluded for an unresolved platform
    pub orphaned_sensors: usize,

    /// Linked sensors with no pose in a frame (platform without samples)
    pub skipped_sensor_frames: u64,

    /// Detected pairs per sensor
    pub detections_by_sensor: BTreeMap<SensorId, u64>,
}

impl PlaybackMetrics {
    fn record(&mut self, scene: &Scene, snapshot: &FrameSnapshot) {
        self.frames += 1;
        self.pairs_evaluated += snapshot.detections.len() as u64;

        let detected = snapshot.detected().count();
        self.detected_pairs += detected as u64;
        self.max_simultaneous = self.max_simultaneous.max(detected);

        for pair in snapshot.detected() {
            *self.detections_by_sensor.entry(pair.sensor_id.clone()).or_default() += 1;
        }

        let linked = scene.linked_sensors().count();
        self.skipped_sensor_frames += linked.saturating_sub(snapshot.sensors.len()) as u64;
    }

    /// Detected pairs for one sensor.
    pub fn detections_for(&self, sensor: &str) -> u64 {
        self.detections_by_sensor
            .get(&SensorId::new(sensor))
            .copied()
            .unwrap_or(0)
    }
}

/// Frame times from `start` to `end` inclusive at `step_ms`, produced lazily.
pub fn frame_times(start: Timestamp, end: Timestamp, step_ms: i64) -> impl Iterator<Item = Timestamp> {
    let step = usize::try_from(step_ms.max(1)).unwrap_or(usize::MAX);
    let last = (start <= end).then_some(end);
    (start..end).step_by(step).chain(last)
}

/// Drives scenes through playback.
pub struct PlaybackRunner {
    /// Configuration seed
    seed: u64,

    config: PlaybackConfig,
}

impl PlaybackRunner {
    /// Creates a new playback runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: PlaybackConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlaybackConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the frame step.
    pub fn with_step_ms(mut self, step_ms: i64) -> Self {
        self.config.step_ms = step_ms;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Generates a scenario, plays it back and checks its expectations.
    pub fn run(&self, scenario: ScenarioId, export: Option<&mut FrameExport>) -> SimResult<PlaybackResult> {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let scene = scenario.build_scene(self.seed)?;
        let mut result = self.play(scenario.name(), &scene, export);
        result.seed = Some(self.seed);

        if let Err(reason) = check_expectations(scenario, &result.metrics) {
            result.passed = false;
            result.failure_reason = Some(reason);
        }
        Ok(result)
    }

    /// Plays back an already-built scene.
    ///
    /// Passes when at least one frame was resolved.
    pub fn play(&self, label: &str, scene: &Scene, mut export: Option<&mut FrameExport>) -> PlaybackResult {
        let mut metrics = PlaybackMetrics {
            orphaned_sensors: scene.orphaned_sensors().count(),
            ..Default::default()
        };

        if let Some(export) = export.as_deref_mut() {
            export.add_scene_geometry(scene, self.config.fov_resolution_deg);
        }

        let Some((start, end)) = scene.time_span() else {
            return PlaybackResult {
                label: label.to_string(),
                seed: None,
                passed: false,
                start: 0,
                end: 0,
                failure_reason: Some("scene has no platform samples".to_string()),
                metrics,
            };
        };

        for t in frame_times(start, end, self.config.step_ms) {
            let snapshot = scene.snapshot(t);
            metrics.record(scene, &snapshot);

            if let Some(export) = export.as_deref_mut() {
                export.add_frame(&snapshot);
            }

            if metrics.frames % LOG_INTERVAL == 0 {
                debug!(
                    "  t={}ms | frames={} | detected={}",
                    t,
                    metrics.frames,
                    snapshot.detected().count()
                );
            }
        }

        info!(
            "{}: {} frames, {}/{} pairs detected, {} orphaned sensor(s)",
            label, metrics.frames, metrics.detected_pairs, metrics.pairs_evaluated, metrics.orphaned_sensors
        );

        let passed = metrics.frames > 0;
        PlaybackResult {
            label: label.to_string(),
            seed: None,
            passed,
            start,
            end,
            failure_reason: None,
            metrics,
        }
    }
}

/// What each scenario is built to demonstrate.
fn check_expectations(scenario: ScenarioId, metrics: &PlaybackMetrics) -> Result<(), String> {
    match scenario {
        ScenarioId::Racetrack => {
            if metrics.detected_pairs == 0 {
                return Err("radar never detected the crossing traffic".to_string());
            }
            if metrics.detected_pairs == metrics.pairs_evaluated {
                return Err("radar detected every pair; envelope has no effect".to_string());
            }
        }
        ScenarioId::Crossing => {
            for sensor in ["alpha_radar", "bravo_radar"] {
                if metrics.detections_for(sensor) == 0 {
                    return Err(format!("{} never acquired the opposing platform", sensor));
                }
            }
            if metrics.detected_pairs == metrics.pairs_evaluated {
                return Err("platforms were detected outside the envelope".to_string());
            }
        }
        ScenarioId::BankedTurn => {
            let stabilized = metrics.detections_for("gimbal_camera");
            let body_fixed = metrics.detections_for("wing_camera");
            if stabilized != metrics.frames {
                return Err(format!(
                    "stabilized sensor held the target in {}/{} frames",
                    stabilized, metrics.frames
                ));
            }
            if body_fixed != 0 {
                return Err(format!("body-fixed sensor saw the target in {} frames while banked", body_fixed));
            }
        }
        ScenarioId::Orphan => {
            if metrics.orphaned_sensors != 1 {
                return Err(format!("expected 1 orphaned sensor, found {}", metrics.orphaned_sensors));
            }
            if metrics.detections_for("lost_pod") != 0 {
                return Err("orphaned sensor produced detections".to_string());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vector_space_core::{PlatformId, SceneBuilder};

    fn times(start: Timestamp, end: Timestamp, step_ms: i64) -> Vec<Timestamp> {
        frame_times(start, end, step_ms).collect()
    }

    #[test]
    fn test_frame_times() {
        assert_eq!(times(0, 250, 100), vec![0, 100, 200, 250]);
        assert_eq!(times(0, 200, 100), vec![0, 100, 200]);
        assert_eq!(times(5, 5, 100), vec![5]);
        assert!(times(10, 0, 100).is_empty());
        assert_eq!(times(0, 2, 0), vec![0, 1, 2]);
    }

    #[test]
    fn test_epoch_scale_span_is_lazy() {
        let mut frames = frame_times(0, 1_700_000_000_000, 1);
        assert_eq!(frames.next(), Some(0));
        assert_eq!(frames.nth(9), Some(10));
    }

    #[test]
    fn test_racetrack_scenario() {
        let result = PlaybackRunner::new(42).run(ScenarioId::Racetrack, None).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.frames, 1201);
        assert_eq!(result.metrics.pairs_evaluated, 2 * 1201);
    }

    #[test]
    fn test_crossing_scenario() {
        let result = PlaybackRunner::new(42).run(ScenarioId::Crossing, None).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.max_simultaneous, 2);
    }

    #[test]
    fn test_banked_turn_scenario() {
        let result = PlaybackRunner::new(42).run(ScenarioId::BankedTurn, None).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
    }

    #[test]
    fn test_orphan_scenario() {
        let result = PlaybackRunner::new(42).run(ScenarioId::Orphan, None).unwrap();
        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(result.metrics.orphaned_sensors, 1);
        assert_eq!(result.metrics.skipped_sensor_frames, 0);
    }

    #[test]
    fn test_scenarios_pass_across_seeds() {
        for seed in [1, 2, 3] {
            for scenario in ScenarioId::all() {
                let result = PlaybackRunner::new(seed).with_step_ms(500).run(scenario, None).unwrap();
                assert!(result.passed, "{} seed={}: {:?}", scenario, seed, result.failure_reason);
            }
        }
    }

    #[test]
    fn test_deterministic_metrics() {
        let a = PlaybackRunner::new(9).run(ScenarioId::Racetrack, None).unwrap();
        let b = PlaybackRunner::new(9).run(ScenarioId::Racetrack, None).unwrap();
        assert_eq!(a.metrics, b.metrics);
    }

    #[test]
    fn test_export_collects_every_frame() {
        let runner = PlaybackRunner::new(3).with_step_ms(1000);
        let mut export = FrameExport::new("crossing", Some(3));
        let result = runner.run(ScenarioId::Crossing, Some(&mut export)).unwrap();
        assert_eq!(export.frames.len() as u64, result.metrics.frames);
        assert_eq!(export.sensors.len(), 2);
        assert_eq!(export.duration_ms, 90_000);
    }

    #[test]
    fn test_empty_scene_fails() {
        let scene = SceneBuilder::new().build();
        let result = PlaybackRunner::new(0).play("empty", &scene, None);
        assert!(!result.passed);
        assert_eq!(result.metrics.frames, 0);
    }

    #[test]
    fn test_platform_without_samples_skips_its_sensor() {
        let mut builder = SceneBuilder::new();
        builder
            .add_platform(
                PlatformId::new("live"),
                vec![vector_space_core::StateSample::new(
                    0,
                    nalgebra::Vector3::zeros(),
                    nalgebra::Vector3::zeros(),
                    vector_space_core::EulerDegrees::ZERO,
                )],
            )
            .unwrap();
        builder.add_platform(PlatformId::new("silent"), vec![]).unwrap();
        builder
            .add_sensor(vector_space_core::Sensor::new(
                SensorId::new("dark"),
                PlatformId::new("silent"),
                vector_space_core::FovEnvelope::new(60.0, 40.0, 0.0, 1000.0),
            ))
            .unwrap();
        let scene = builder.build();

        let result = PlaybackRunner::new(0).play("partial", &scene, None);
        assert!(result.passed);
        assert_eq!(result.metrics.frames, 1);
        assert_eq!(result.metrics.skipped_sensor_frames, 1);
    }

    proptest::proptest! {
        #[test]
        fn frame_times_cover_span(start in -5_000i64..5_000, len in 0i64..20_000, step in 1i64..2_000) {
            let frames = times(start, start + len, step);
            proptest::prop_assert_eq!(frames.first().copied(), Some(start));
            proptest::prop_assert_eq!(frames.last().copied(), Some(start + len));
            proptest::prop_assert!(frames.windows(2).all(|w| w[0] < w[1] && w[1] - w[0] <= step));
        }
    }
}
