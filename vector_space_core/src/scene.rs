//! The Scene - owned collection of platforms and sensors for one load.
//!
//! A [`SceneBuilder`] collects samples and sensors during the load phase;
//! [`SceneBuilder::build`] sorts every track, links sensors to their platforms
//! and reports orphans. The resulting [`Scene`] is immutable and answers the
//! per-frame queries:
//! 1. platform render pose at time T
//! 2. sensor render pose at time T
//! 3. detection flag for every (sensor, target platform) pair at time T
//!
//! A reload builds a new Scene; nothing is patched in place.

use crate::detection::is_detectable;
use crate::error::CoreError;
use crate::mount::resolve_sensor_pose;
use crate::sensor::Sensor;
use crate::timeline::{Platform, StateSample};
use crate::types::{PlatformId, Pose, SensorId, Timestamp};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Load-phase accumulator.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    tracks: BTreeMap<PlatformId, Vec<StateSample>>,
    sensors: BTreeMap<SensorId, Sensor>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a platform with an initial batch of samples (any order).
    pub fn add_platform(
        &mut self,
        id: PlatformId,
        samples: Vec<StateSample>,
    ) -> Result<&mut Self, CoreError> {
        if self.tracks.contains_key(&id) {
            return Err(CoreError::DuplicatePlatform(id));
        }
        self.tracks.insert(id, samples);
        Ok(self)
    }

    /// Appends one sample, creating the platform on first sight.
    pub fn push_sample(&mut self, id: &PlatformId, sample: StateSample) -> &mut Self {
        self.tracks.entry(id.clone()).or_default().push(sample);
        self
    }

    /// Registers a sensor. Its platform does not need to exist yet.
    pub fn add_sensor(&mut self, sensor: Sensor) -> Result<&mut Self, CoreError> {
        if self.sensors.contains_key(&sensor.id) {
            return Err(CoreError::DuplicateSensor(sensor.id));
        }
        if let Some(reason) = sensor.envelope.problem() {
            return Err(CoreError::invalid_envelope(&sensor.id, reason));
        }
        self.sensors.insert(sensor.id.clone(), sensor);
        Ok(self)
    }

    /// Finalizes the load: sorts tracks, links sensors, records orphans.
    pub fn build(self) -> Scene {
        let mut platforms: BTreeMap<PlatformId, Platform> = self
            .tracks
            .into_iter()
            .map(|(id, samples)| (id.clone(), Platform::new(id, samples)))
            .collect();

        let mut orphans = BTreeSet::new();
        for sensor in self.sensors.values() {
            match platforms.get_mut(&sensor.platform_id) {
                Some(platform) => platform.attach_sensor(sensor.id.clone()),
                None => {
                    warn!(
                        "Sensor {} references unknown platform {}; excluded from queries",
                        sensor.id, sensor.platform_id
                    );
                    orphans.insert(sensor.id.clone());
                }
            }
        }

        Scene {
            platforms,
            sensors: self.sensors,
            orphans,
        }
    }
}

/// One evaluated (sensor, target) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPair {
    pub sensor_id: SensorId,
    pub target_id: PlatformId,
    /// Render-frame sensor position
    pub sensor_position: Vector3<f64>,
    /// Render-frame target position
    pub target_position: Vector3<f64>,
    pub detected: bool,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub timestamp: Timestamp,
    pub platforms: BTreeMap<PlatformId, Pose>,
    pub sensors: BTreeMap<SensorId, Pose>,
    pub detections: Vec<DetectionPair>,
}

impl FrameSnapshot {
    /// Pairs whose detection flag is set.
    pub fn detected(&self) -> impl Iterator<Item = &DetectionPair> {
        self.detections.iter().filter(|pair| pair.detected)
    }
}

/// Immutable, linked set of platforms and sensors.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    platforms: BTreeMap<PlatformId, Platform>,
    sensors: BTreeMap<SensorId, Sensor>,
    orphans: BTreeSet<SensorId>,
}

impl Scene {
    pub fn platform(&self, id: &PlatformId) -> Option<&Platform> {
        self.platforms.get(id)
    }

    pub fn platforms(&self) -> impl Iterator<Item = &Platform> {
        self.platforms.values()
    }

    pub fn sensor(&self, id: &SensorId) -> Option<&Sensor> {
        self.sensors.get(id)
    }

    /// All sensors, orphans included.
    pub fn sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.values()
    }

    /// Sensors whose platform resolved; the only ones queries consider.
    pub fn linked_sensors(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors
            .values()
            .filter(move |sensor| !self.orphans.contains(&sensor.id))
    }

    /// Sensors whose platform reference could not be resolved.
    pub fn orphaned_sensors(&self) -> impl Iterator<Item = &SensorId> {
        self.orphans.iter()
    }

    pub fn is_orphaned(&self, id: &SensorId) -> bool {
        self.orphans.contains(id)
    }

    /// Earliest and latest timestamps across all platforms.
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        self.platforms
            .values()
            .filter_map(Platform::time_span)
            .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)))
    }

    /// Interpolated (or clamped) platform state at `t`.
    pub fn platform_state(&self, id: &PlatformId, t: Timestamp) -> Option<StateSample> {
        self.platforms.get(id)?.state_at_time(t)
    }

    /// Render-frame platform pose at `t`.
    pub fn platform_pose(&self, id: &PlatformId, t: Timestamp) -> Option<Pose> {
        let state = self.platform_state(id, t)?;
        Some(Pose::new(state.render_position(), state.render_orientation()))
    }

    /// Render-frame sensor pose at `t`. `None` for orphans and empty platforms.
    pub fn sensor_pose(&self, id: &SensorId, t: Timestamp) -> Option<Pose> {
        if self.orphans.contains(id) {
            return None;
        }
        let sensor = self.sensors.get(id)?;
        let platform_pose = self.platform_pose(&sensor.platform_id, t)?;
        Some(resolve_sensor_pose(sensor, &platform_pose))
    }

    /// Resolves a full frame.
    ///
    /// Platform poses are resolved first; sensor poses derive from them, and
    /// every linked sensor is then tested against every other platform.
    pub fn snapshot(&self, t: Timestamp) -> FrameSnapshot {
        let platforms: BTreeMap<PlatformId, Pose> = self
            .platforms
            .keys()
            .filter_map(|id| Some((id.clone(), self.platform_pose(id, t)?)))
            .collect();

        let mut sensors = BTreeMap::new();
        let mut detections = Vec::new();

        for sensor in self.linked_sensors() {
            let Some(platform_pose) = platforms.get(&sensor.platform_id) else {
                continue;
            };
            let pose = resolve_sensor_pose(sensor, platform_pose);

            for (target_id, target_pose) in &platforms {
                if *target_id == sensor.platform_id {
                    continue;
                }
                detections.push(DetectionPair {
                    sensor_id: sensor.id.clone(),
                    target_id: target_id.clone(),
                    sensor_position: pose.position,
                    target_position: target_pose.position,
                    detected: is_detectable(
                        sensor,
                        &pose.position,
                        &pose.orientation,
                        &target_pose.position,
                    ),
                });
            }

            sensors.insert(sensor.id.clone(), pose);
        }

        FrameSnapshot {
            timestamp: t,
            platforms,
            sensors,
            detections,
        }
    }

    /// Detection pairs at `t`.
    pub fn detections(&self, t: Timestamp) -> Vec<DetectionPair> {
        self.snapshot(t).detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::EulerDegrees;
    use crate::sensor::{FovEnvelope, MountType};
    use approx::assert_relative_eq;

    fn level(timestamp: Timestamp, north: f64, east: f64) -> StateSample {
        StateSample::new(
            timestamp,
            Vector3::new(north, east, -1000.0),
            Vector3::zeros(),
            EulerDegrees::ZERO,
        )
    }

    fn radar(id: &str, platform: &str) -> Sensor {
        Sensor::new(
            SensorId::new(id),
            PlatformId::new(platform),
            FovEnvelope::new(60.0, 40.0, 100.0, 5000.0),
        )
    }

    /// Hunter at the origin facing north; target 1 km north moving east.
    fn scene() -> Scene {
        let mut builder = SceneBuilder::new();
        builder
            .add_platform(PlatformId::new("hunter"), vec![level(0, 0.0, 0.0), level(10_000, 0.0, 0.0)])
            .unwrap();
        builder
            .add_platform(
                PlatformId::new("target"),
                vec![level(0, 1000.0, 0.0), level(10_000, 1000.0, 4000.0)],
            )
            .unwrap();
        builder.add_sensor(radar("radar", "hunter")).unwrap();
        builder.add_sensor(radar("ghost", "missing")).unwrap();
        builder.build()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut builder = SceneBuilder::new();
        builder.add_platform(PlatformId::new("p"), vec![]).unwrap();
        assert_eq!(
            builder.add_platform(PlatformId::new("p"), vec![]).err(),
            Some(CoreError::DuplicatePlatform(PlatformId::new("p")))
        );
        builder.add_sensor(radar("s", "p")).unwrap();
        assert!(matches!(
            builder.add_sensor(radar("s", "p")),
            Err(CoreError::DuplicateSensor(_))
        ));
    }

    #[test]
    fn test_invalid_envelope_rejected() {
        let mut builder = SceneBuilder::new();
        let bad = Sensor::new(
            SensorId::new("s"),
            PlatformId::new("p"),
            FovEnvelope::new(60.0, 40.0, 9000.0, 5000.0),
        );
        assert!(matches!(
            builder.add_sensor(bad),
            Err(CoreError::InvalidEnvelope { .. })
        ));
    }

    #[test]
    fn test_push_sample_sorts_on_build() {
        let mut builder = SceneBuilder::new();
        let id = PlatformId::new("p");
        builder.push_sample(&id, level(200, 2.0, 0.0));
        builder.push_sample(&id, level(100, 1.0, 0.0));
        let scene = builder.build();
        let times: Vec<Timestamp> = scene.platform(&id).unwrap().samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![100, 200]);
    }

    #[test]
    fn test_orphan_reported_and_excluded() {
        let scene = scene();
        let ghost = SensorId::new("ghost");
        assert!(scene.is_orphaned(&ghost));
        assert_eq!(scene.orphaned_sensors().collect::<Vec<_>>(), vec![&ghost]);
        assert!(scene.sensor_pose(&ghost, 0).is_none());
        assert_eq!(scene.linked_sensors().count(), 1);
        assert!(scene.detections(0).iter().all(|pair| pair.sensor_id != ghost));
    }

    #[test]
    fn test_platform_back_references() {
        let scene = scene();
        let hunter = scene.platform(&PlatformId::new("hunter")).unwrap();
        assert_eq!(hunter.sensors(), &[SensorId::new("radar")]);
    }

    #[test]
    fn test_platform_pose_in_render_frame() {
        let pose = scene().platform_pose(&PlatformId::new("target"), 5000).unwrap();
        assert_relative_eq!(pose.position, Vector3::new(1000.0, 1000.0, 2000.0), epsilon = 1e-9);
    }

    #[test]
    fn test_detection_tracks_target_through_fov() {
        let scene = scene();
        // t=0: dead ahead at 1 km
        let start = scene.detections(0);
        assert_eq!(start.len(), 1);
        assert!(start[0].detected);
        assert_eq!(start[0].target_id, PlatformId::new("target"));

        // t=10s: 4 km east, 1 km north -> ~76° off boresight
        let end = scene.detections(10_000);
        assert!(!end[0].detected);
    }

    #[test]
    fn test_no_self_detection() {
        let scene = scene();
        let snapshot = scene.snapshot(0);
        assert!(snapshot
            .detections
            .iter()
            .all(|pair| pair.target_id != PlatformId::new("hunter")));
    }

    #[test]
    fn test_snapshot_matches_individual_queries() {
        let scene = scene();
        // t=1s: target 400 m east, ~22° right of the nose
        let snapshot = scene.snapshot(1000);
        let radar = SensorId::new("radar");
        assert_eq!(snapshot.sensors.get(&radar).copied(), scene.sensor_pose(&radar, 1000));
        assert_eq!(snapshot.platforms.len(), 2);
        assert_eq!(snapshot.detected().count(), 1);
    }

    #[test]
    fn test_stabilized_sensor_ignores_bank() {
        let mut builder = SceneBuilder::new();
        let banked = StateSample::new(
            0,
            Vector3::new(0.0, 0.0, -1000.0),
            Vector3::zeros(),
            EulerDegrees::new(60.0, 0.0, 0.0),
        );
        builder.add_platform(PlatformId::new("hunter"), vec![banked]).unwrap();
        builder.add_platform(PlatformId::new("target"), vec![level(0, 1000.0, 500.0)]).unwrap();

        // Both sensors look 25° right of the nose
        let mount = EulerDegrees::new(0.0, 0.0, 25.0);
        builder
            .add_sensor(radar("body", "hunter").with_mount(mount, MountType::BodyFixed))
            .unwrap();
        builder
            .add_sensor(radar("gimbal", "hunter").with_mount(mount, MountType::Stabilized))
            .unwrap();
        let scene = builder.build();

        let flags: BTreeMap<SensorId, bool> = scene
            .detections(0)
            .into_iter()
            .map(|pair| (pair.sensor_id, pair.detected))
            .collect();
        assert!(flags[&SensorId::new("gimbal")]);
        assert!(!flags[&SensorId::new("body")]);
    }

    #[test]
    fn test_time_span_covers_all_platforms() {
        let mut builder = SceneBuilder::new();
        builder.add_platform(PlatformId::new("a"), vec![level(500, 0.0, 0.0)]).unwrap();
        builder.add_platform(PlatformId::new("b"), vec![level(-100, 0.0, 0.0), level(300, 0.0, 0.0)]).unwrap();
        builder.add_platform(PlatformId::new("empty"), vec![]).unwrap();
        let scene = builder.build();
        assert_eq!(scene.time_span(), Some((-100, 500)));
        assert!(scene.platform_pose(&PlatformId::new("empty"), 0).is_none());
    }
}
