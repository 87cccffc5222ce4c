//! JSON frame exporter for external viewers.
//!
//! FOV meshes are tessellated once per sensor in sensor-local coordinates;
//! each frame then carries only poses and detection lines. A viewer places a
//! mesh by applying the sensor pose of the frame.

use crate::error::SimResult;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use vector_space_core::{
    tessellate_envelope, FovMesh, FrameSnapshot, MountType, Pose, Scene, SensorId, Timestamp,
};

/// Static geometry for one sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorGeometry {
    pub sensor_id: String,
    pub platform_id: String,
    pub sensor_type: String,
    pub color: [u8; 3],
    pub mount_type: MountType,
    pub mesh: FovMesh,
}

/// Render-frame pose of a platform or sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub id: String,
    pub position: [f64; 3],
    /// Quaternion as [x, y, z, w]
    pub orientation: [f64; 4],
}

impl PoseRecord {
    pub fn new(id: impl Into<String>, pose: &Pose) -> Self {
        Self {
            id: id.into(),
            position: vec3(&pose.position),
            orientation: quat(&pose.orientation),
        }
    }
}

/// Line from a sensor to a target it currently detects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionLine {
    pub sensor_id: String,
    pub target_id: String,
    pub from: [f64; 3],
    pub to: [f64; 3],
}

/// A single exported frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFrame {
    pub timestamp: Timestamp,
    pub platforms: Vec<PoseRecord>,
    pub sensors: Vec<PoseRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub detections: Vec<DetectionLine>,
}

impl From<&FrameSnapshot> for ExportFrame {
    fn from(snapshot: &FrameSnapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            platforms: snapshot
                .platforms
                .iter()
                .map(|(id, pose)| PoseRecord::new(id.as_str(), pose))
                .collect(),
            sensors: snapshot
                .sensors
                .iter()
                .map(|(id, pose)| PoseRecord::new(id.as_str(), pose))
                .collect(),
            detections: snapshot
                .detected()
                .map(|pair| DetectionLine {
                    sensor_id: pair.sensor_id.to_string(),
                    target_id: pair.target_id.to_string(),
                    from: vec3(&pair.sensor_position),
                    to: vec3(&pair.target_position),
                })
                .collect(),
        }
    }
}

/// Complete playback export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameExport {
    /// Scenario name or scene file path
    pub scenario: String,

    /// Seed for synthetic scenarios
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Last frame time minus first frame time
    pub duration_ms: i64,

    pub sensors: Vec<SensorGeometry>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub orphaned_sensors: Vec<SensorId>,

    pub frames: Vec<ExportFrame>,

    pub passed: bool,
}

impl FrameExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: Option<u64>) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_ms: 0,
            sensors: Vec::new(),
            orphaned_sensors: Vec::new(),
            frames: Vec::new(),
            passed: false,
        }
    }

    /// Tessellates every linked sensor and records orphans.
    pub fn add_scene_geometry(&mut self, scene: &Scene, resolution_deg: f64) {
        self.sensors = scene
            .linked_sensors()
            .map(|sensor| SensorGeometry {
                sensor_id: sensor.id.to_string(),
                platform_id: sensor.platform_id.to_string(),
                sensor_type: sensor.class.0.clone(),
                color: sensor.class.color_rgb(),
                mount_type: sensor.mount_type,
                mesh: tessellate_envelope(&sensor.envelope, resolution_deg),
            })
            .collect();
        self.orphaned_sensors = scene.orphaned_sensors().cloned().collect();
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, snapshot: &FrameSnapshot) {
        self.frames.push(ExportFrame::from(snapshot));
        if let (Some(first), Some(last)) = (self.frames.first(), self.frames.last()) {
            self.duration_ms = last.timestamp.saturating_sub(first.timestamp);
        }
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool) {
        self.passed = passed;
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

fn vec3(v: &Vector3<f64>) -> [f64; 3] {
    [v.x, v.y, v.z]
}

fn quat(q: &UnitQuaternion<f64>) -> [f64; 4] {
    let c = q.quaternion().coords;
    [c.x, c.y, c.z, c.w]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::ScenarioId;

    #[test]
    fn test_export_from_scenario() {
        let scene = ScenarioId::Orphan.build_scene(5).unwrap();
        let mut export = FrameExport::new("orphan", Some(5));
        export.add_scene_geometry(&scene, 5.0);
        export.add_frame(&scene.snapshot(0));
        export.add_frame(&scene.snapshot(1000));
        export.finalize(true);

        assert_eq!(export.sensors.len(), 1);
        assert_eq!(export.sensors[0].sensor_id, "patrol_radar");
        assert_eq!(export.sensors[0].color, [255, 165, 0]);
        assert_eq!(export.orphaned_sensors, vec![SensorId::new("lost_pod")]);
        assert_eq!(export.duration_ms, 1000);
        assert_eq!(export.frames[0].platforms.len(), 2);
        assert_eq!(export.frames[0].detections.len(), 1);
    }

    #[test]
    fn test_pose_record_layout() {
        let pose = Pose::new(Vector3::new(1.0, 2.0, 3.0), UnitQuaternion::identity());
        let record = PoseRecord::new("p", &pose);
        assert_eq!(record.position, [1.0, 2.0, 3.0]);
        assert_eq!(record.orientation, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_json_shape() {
        let scene = ScenarioId::Crossing.build_scene(1).unwrap();
        let mut export = FrameExport::new("crossing", Some(1));
        export.add_scene_geometry(&scene, 10.0);
        export.add_frame(&scene.snapshot(0));

        let value: serde_json::Value = serde_json::from_str(&export.to_json().unwrap()).unwrap();
        assert_eq!(value["scenario"], "crossing");
        assert_eq!(value["seed"], 1);
        assert_eq!(value["sensors"][0]["mount_type"], "body_fixed");
        assert!(value["sensors"][0]["mesh"]["vertices"].is_array());
        // Out of range at t=0: no detection lines serialized
        assert!(value["frames"][0].get("detections").is_none());
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join("vector_space_export_test.json");
        let export = FrameExport::new("empty", None);
        export.write_to_file(&path).unwrap();
        let back: FrameExport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, export);
        let _ = std::fs::remove_file(path);
    }
}
