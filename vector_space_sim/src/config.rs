//! Scene file loading and playback settings.
//!
//! A scene file is a JSON document:
//!
//! ```json
//! {
//!   "angle_units": "degrees",
//!   "coordinate_system": "ned",
//!   "platforms": [
//!     { "id": "p1", "samples": [ { "timestamp": 0, "north": 0, "east": 0, "down": -1000, "yaw": 90 } ] }
//!   ],
//!   "sensors": [
//!     { "id": "s1", "platform_id": "p1", "sensor_type": "radar",
//!       "azimuth_fov": 60, "elevation_fov": 40, "range_min": 100, "range_max": 5000,
//!       "mount_type": "stabilized" }
//!   ]
//! }
//! ```
//!
//! With `"coordinate_system": "lla"` samples carry `lat`/`lon` (radians) and
//! `alt` (meters) instead, all converted about one shared `lla_reference`.
//! The default `"first"` is the first sample of the first platform in file
//! order, so every platform lands in the same NED frame.

use crate::error::{SimError, SimResult};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};
use vector_space_core::geodetic::{convert_track_to_ned, Geodetic, LlaReference};
use vector_space_core::{
    AngleUnits, EulerDegrees, FieldValue, FovEnvelope, MountType, PlatformId, Scene, SceneBuilder,
    Sensor, SensorClass, SensorId, StateSample, Timestamp,
};

/// Position encoding of sample coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateSystem {
    #[default]
    Ned,
    Lla,
}

/// `"first"` or an explicit `{lat, lon, alt}` point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceConfig {
    Named(String),
    Point(Geodetic),
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        ReferenceConfig::Named("first".to_string())
    }
}

impl ReferenceConfig {
    pub fn resolve(&self) -> SimResult<LlaReference> {
        match self {
            ReferenceConfig::Named(name) if name.eq_ignore_ascii_case("first") => {
                Ok(LlaReference::First)
            }
            ReferenceConfig::Named(name) => Err(SimError::invalid_config(format!(
                "unknown lla_reference '{}', expected \"first\" or {{lat, lon, alt}}",
                name
            ))),
            ReferenceConfig::Point(point) => Ok(LlaReference::Explicit(*point)),
        }
    }
}

/// One row of platform telemetry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Milliseconds since epoch
    pub timestamp: Timestamp,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub north: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub east: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<f64>,

    #[serde(default)]
    pub vel_north: f64,
    #[serde(default)]
    pub vel_east: f64,
    #[serde(default)]
    pub vel_down: f64,

    #[serde(default)]
    pub roll: f64,
    #[serde(default)]
    pub pitch: f64,
    #[serde(default)]
    pub yaw: f64,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, FieldValue>,
}

impl SampleConfig {
    fn ned(&self) -> Option<Vector3<f64>> {
        Some(Vector3::new(self.north?, self.east?, self.down?))
    }

    fn geodetic(&self) -> Option<Geodetic> {
        Some(Geodetic::new(self.lat?, self.lon?, self.alt?))
    }

    fn to_sample(&self, position: Vector3<f64>, units: AngleUnits) -> StateSample {
        let attitude = EulerDegrees::new(
            units.to_degrees(self.roll),
            units.to_degrees(self.pitch),
            units.to_degrees(self.yaw),
        );
        let velocity = Vector3::new(self.vel_north, self.vel_east, self.vel_down);

        let mut sample = StateSample::new(self.timestamp, position, velocity, attitude);
        sample.extra = self.extra.clone();
        sample
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub id: PlatformId,
    #[serde(default)]
    pub samples: Vec<SampleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: SensorId,
    pub platform_id: PlatformId,
    #[serde(default)]
    pub sensor_type: SensorClass,
    pub azimuth_fov: f64,
    pub elevation_fov: f64,
    #[serde(default)]
    pub range_min: f64,
    pub range_max: f64,
    #[serde(default)]
    pub mount_roll: f64,
    #[serde(default)]
    pub mount_pitch: f64,
    #[serde(default)]
    pub mount_yaw: f64,
    #[serde(default)]
    pub mount_type: MountType,
}

impl SensorConfig {
    fn to_sensor(&self, units: AngleUnits) -> Sensor {
        let envelope = FovEnvelope::new(
            self.azimuth_fov,
            self.elevation_fov,
            self.range_min,
            self.range_max,
        );
        let mount = EulerDegrees::new(
            units.to_degrees(self.mount_roll),
            units.to_degrees(self.mount_pitch),
            units.to_degrees(self.mount_yaw),
        );
        Sensor::new(self.id.clone(), self.platform_id.clone(), envelope)
            .with_class(self.sensor_type.clone())
            .with_mount(mount, self.mount_type)
    }
}

/// A complete scene document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub angle_units: AngleUnits,
    #[serde(default)]
    pub coordinate_system: CoordinateSystem,
    #[serde(default)]
    pub lla_reference: ReferenceConfig,
    #[serde(default)]
    pub platforms: Vec<PlatformConfig>,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
}

impl SceneFile {
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let file = Self::from_json(&json)?;
        info!(
            "Loaded scene {} ({} platforms, {} sensors)",
            path.display(),
            file.platforms.len(),
            file.sensors.len()
        );
        Ok(file)
    }

    /// Builds a fresh [`Scene`]. Each call produces an independent scene.
    pub fn build(&self) -> SimResult<Scene> {
        let reference = self.shared_reference()?;
        let mut builder = SceneBuilder::new();

        for platform in &self.platforms {
            let positions = self.platform_positions(platform, reference)?;
            let samples = platform
                .samples
                .iter()
                .zip(positions)
                .map(|(row, position)| row.to_sample(position, self.angle_units))
                .collect();
            builder.add_platform(platform.id.clone(), samples)?;
            debug!("Platform {}: {} samples", platform.id, platform.samples.len());
        }

        for sensor in &self.sensors {
            builder.add_sensor(sensor.to_sensor(self.angle_units))?;
        }

        Ok(builder.build())
    }

    /// Pins a `"first"` reference to one point for the whole file.
    fn shared_reference(&self) -> SimResult<LlaReference> {
        let reference = self.lla_reference.resolve()?;
        if self.coordinate_system != CoordinateSystem::Lla || reference != LlaReference::First {
            return Ok(reference);
        }
        let Some((platform, row)) = self
            .platforms
            .iter()
            .find_map(|platform| Some((platform, platform.samples.first()?)))
        else {
            return Ok(reference);
        };
        let origin = row.geodetic().ok_or_else(|| {
            SimError::invalid_config(format!(
                "platform {} sample at {} is missing lat/lon/alt",
                platform.id, row.timestamp
            ))
        })?;
        debug!(
            "LLA origin from platform {}: lat={} lon={} alt={}",
            platform.id, origin.lat, origin.lon, origin.alt
        );
        Ok(LlaReference::Explicit(origin))
    }

    fn platform_positions(
        &self,
        platform: &PlatformConfig,
        reference: LlaReference,
    ) -> SimResult<Vec<Vector3<f64>>> {
        match self.coordinate_system {
            CoordinateSystem::Ned => platform
                .samples
                .iter()
                .map(|row| {
                    row.ned().ok_or_else(|| {
                        SimError::invalid_config(format!(
                            "platform {} sample at {} is missing north/east/down",
                            platform.id, row.timestamp
                        ))
                    })
                })
                .collect(),
            CoordinateSystem::Lla => {
                let track = platform
                    .samples
                    .iter()
                    .map(|row| {
                        row.geodetic().ok_or_else(|| {
                            SimError::invalid_config(format!(
                                "platform {} sample at {} is missing lat/lon/alt",
                                platform.id, row.timestamp
                            ))
                        })
                    })
                    .collect::<SimResult<Vec<Geodetic>>>()?;
                // An empty platform contributes nothing to convert
                if track.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(convert_track_to_ned(&track, reference)?)
            }
        }
    }
}

/// Playback settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Time between frames in milliseconds
    pub step_ms: i64,

    /// Angular step for FOV tessellation in degrees
    pub fov_resolution_deg: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_ms: 100,
            fov_resolution_deg: vector_space_core::fov::DEFAULT_RESOLUTION_DEG,
        }
    }
}
