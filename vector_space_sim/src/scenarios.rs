//! Synthetic playback scenarios.
//!
//! Each scenario builds a complete scene from a seed. Tracks are sampled at
//! 1 Hz so that playback at the default 100 ms step exercises interpolation.

use crate::error::{SimError, SimResult};
use crate::generator::{Orbit, TrackGenerator, TrackWindow};
use nalgebra::Vector3;
use vector_space_core::{
    EulerDegrees, FovEnvelope, MountType, PlatformId, Scene, SceneBuilder, Sensor, SensorClass,
    SensorId,
};

const SAMPLE_MS: i64 = 1000;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// VS-001: Orbiting surveillance platform watching crossing traffic
    Racetrack,

    /// VS-002: Two platforms closing head-on
    Crossing,

    /// VS-003: Body-fixed vs stabilized sensor on a banked platform
    BankedTurn,

    /// VS-004: Sensor referencing a platform that does not exist
    Orphan,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Racetrack,
            ScenarioId::Crossing,
            ScenarioId::BankedTurn,
            ScenarioId::Orphan,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Racetrack => "racetrack",
            ScenarioId::Crossing => "crossing",
            ScenarioId::BankedTurn => "banked_turn",
            ScenarioId::Orphan => "orphan",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Racetrack => "Stabilized radar on a 5 km orbit tracking two crossing aircraft",
            ScenarioId::Crossing => "Head-on pass, forward radars acquire then lose each other",
            ScenarioId::BankedTurn => "45° bank: stabilized sensor holds the target, body-fixed loses it",
            ScenarioId::Orphan => "Sensor bound to a missing platform is reported and skipped",
        }
    }

    /// Generates the scene for this scenario. Same seed, same scene.
    pub fn build_scene(&self, seed: u64) -> SimResult<Scene> {
        let mut generator = TrackGenerator::new(seed);
        let mut builder = SceneBuilder::new();

        match self {
            ScenarioId::Racetrack => racetrack(&mut generator, &mut builder)?,
            ScenarioId::Crossing => crossing(&mut generator, &mut builder)?,
            ScenarioId::BankedTurn => banked_turn(&mut generator, &mut builder)?,
            ScenarioId::Orphan => orphan(&mut generator, &mut builder)?,
        }

        Ok(builder.build())
    }
}

fn sensor(id: &str, platform: &str, class: &str, envelope: FovEnvelope) -> Sensor {
    Sensor::new(SensorId::new(id), PlatformId::new(platform), envelope)
        .with_class(SensorClass::new(class))
}

fn racetrack(generator: &mut TrackGenerator, builder: &mut SceneBuilder) -> SimResult<()> {
    let window = TrackWindow::new(0, 120_000, SAMPLE_MS);
    let orbit = Orbit {
        center: Vector3::new(0.0, 0.0, -8000.0),
        radius: 5000.0,
        speed: 150.0,
        start_angle_deg: 0.0,
        clockwise: true,
        banked: true,
    };

    builder.add_platform(PlatformId::new("awacs"), generator.orbit(&orbit, window))?;
    builder.add_platform(
        PlatformId::new("northbound"),
        generator.straight(Vector3::new(-6000.0, 0.0, -7000.0), Vector3::new(100.0, 0.0, 0.0), window),
    )?;
    builder.add_platform(
        PlatformId::new("eastbound"),
        generator.straight(Vector3::new(0.0, -6000.0, -7000.0), Vector3::new(0.0, 100.0, 0.0), window),
    )?;

    // Looks into the orbit (right of a clockwise track)
    builder.add_sensor(
        sensor("awacs_radar", "awacs", "radar", FovEnvelope::new(60.0, 30.0, 500.0, 20_000.0))
            .with_mount(EulerDegrees::new(0.0, 0.0, 90.0), MountType::Stabilized),
    )?;
    Ok(())
}

fn crossing(generator: &mut TrackGenerator, builder: &mut SceneBuilder) -> SimResult<()> {
    let window = TrackWindow::new(0, 90_000, SAMPLE_MS);

    builder.add_platform(
        PlatformId::new("alpha"),
        generator.straight(Vector3::new(0.0, -10_000.0, -3000.0), Vector3::new(0.0, 200.0, 0.0), window),
    )?;
    builder.add_platform(
        PlatformId::new("bravo"),
        generator.straight(Vector3::new(500.0, 10_000.0, -3000.0), Vector3::new(0.0, -200.0, 0.0), window),
    )?;

    let envelope = FovEnvelope::new(60.0, 20.0, 100.0, 15_000.0);
    builder.add_sensor(sensor("alpha_radar", "alpha", "radar", envelope))?;
    builder.add_sensor(sensor("bravo_radar", "bravo", "radar", envelope))?;
    Ok(())
}

fn banked_turn(generator: &mut TrackGenerator, builder: &mut SceneBuilder) -> SimResult<()> {
    let window = TrackWindow::new(0, 60_000, SAMPLE_MS);
    let center = Vector3::new(0.0, 0.0, -2000.0);
    let orbit = Orbit {
        center,
        radius: 1500.0,
        speed: 120.0,
        start_angle_deg: 0.0,
        clockwise: true,
        banked: true,
    };

    builder.add_platform(PlatformId::new("hunter"), generator.orbit(&orbit, window))?;
    builder.add_platform(PlatformId::new("beacon"), generator.stationary(center, 0.0, window))?;

    // Same mount, different policy: both look out the right wing
    let envelope = FovEnvelope::new(30.0, 20.0, 100.0, 5000.0);
    let mount = EulerDegrees::new(0.0, 0.0, 90.0);
    builder.add_sensor(
        sensor("wing_camera", "hunter", "eo", envelope).with_mount(mount, MountType::BodyFixed),
    )?;
    builder.add_sensor(
        sensor("gimbal_camera", "hunter", "eo", envelope).with_mount(mount, MountType::Stabilized),
    )?;
    Ok(())
}

fn orphan(generator: &mut TrackGenerator, builder: &mut SceneBuilder) -> SimResult<()> {
    let window = TrackWindow::new(0, 30_000, SAMPLE_MS);

    builder.add_platform(
        PlatformId::new("patrol"),
        generator.straight(Vector3::new(0.0, 0.0, -1500.0), Vector3::new(80.0, 0.0, 0.0), window),
    )?;
    builder.add_platform(
        PlatformId::new("contact"),
        generator.stationary(Vector3::new(4000.0, 0.0, -1500.0), 180.0, window),
    )?;

    builder.add_sensor(sensor(
        "patrol_radar",
        "patrol",
        "radar",
        FovEnvelope::new(90.0, 30.0, 100.0, 10_000.0),
    ))?;
    builder.add_sensor(sensor(
        "lost_pod",
        "decommissioned",
        "ir",
        FovEnvelope::new(20.0, 20.0, 0.0, 8000.0),
    ))?;
    Ok(())
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "racetrack" | "orbit" | "vs-001" => Ok(ScenarioId::Racetrack),
            "crossing" | "head_on" | "headon" | "vs-002" => Ok(ScenarioId::Crossing),
            "banked_turn" | "bankedturn" | "bank" | "vs-003" => Ok(ScenarioId::BankedTurn),
            "orphan" | "orphaned" | "vs-004" => Ok(ScenarioId::Orphan),
            _ => Err(SimError::UnknownScenario(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>().unwrap(), scenario);
            assert_eq!(scenario.to_string(), scenario.name());
        }
    }

    #[test]
    fn test_aliases_and_unknown() {
        assert_eq!("VS-003".parse::<ScenarioId>().unwrap(), ScenarioId::BankedTurn);
        assert_eq!("Head_On".parse::<ScenarioId>().unwrap(), ScenarioId::Crossing);
        assert!(matches!(
            "split_brain".parse::<ScenarioId>(),
            Err(SimError::UnknownScenario(_))
        ));
    }

    #[test]
    fn test_every_scenario_builds() {
        for scenario in ScenarioId::all() {
            let scene = scenario.build_scene(42).unwrap();
            assert!(scene.platforms().count() >= 2, "{scenario}");
            assert!(scene.time_span().is_some());
        }
    }

    #[test]
    fn test_seed_determinism() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.build_scene(7).unwrap(), scenario.build_scene(7).unwrap());
        }
        assert_ne!(
            ScenarioId::Racetrack.build_scene(7).unwrap(),
            ScenarioId::Racetrack.build_scene(8).unwrap()
        );
    }

    #[test]
    fn test_orphan_scenario_has_one_orphan() {
        let scene = ScenarioId::Orphan.build_scene(1).unwrap();
        let orphans: Vec<_> = scene.orphaned_sensors().collect();
        assert_eq!(orphans, vec![&SensorId::new("lost_pod")]);
    }
}
