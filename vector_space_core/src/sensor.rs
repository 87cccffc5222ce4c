//! Sensor definitions: detection envelope, mount orientation, mount policy.

use crate::frames::EulerDegrees;
use crate::types::{PlatformId, SensorId};
use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

/// How a sensor's orientation follows its platform.
///
/// Parsed from free-form metadata; anything unrecognized is `BodyFixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MountType {
    /// Rotates with all three platform axes
    #[default]
    BodyFixed,

    /// Tracks platform heading only; roll and pitch are cancelled (gimbal)
    Stabilized,
}

impl MountType {
    /// Strict parse. Returns `None` for tags that are not a known policy.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "body_fixed" | "body-fixed" | "bodyfixed" | "body" | "fixed" => Some(MountType::BodyFixed),
            "stabilized" | "stabilised" | "gimbal" | "gimballed" => Some(MountType::Stabilized),
            _ => None,
        }
    }

    /// Lenient parse: unrecognized tags fall back to `BodyFixed`.
    pub fn from_tag(tag: &str) -> Self {
        Self::parse(tag).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MountType::BodyFixed => "body_fixed",
            MountType::Stabilized => "stabilized",
        }
    }
}

impl From<String> for MountType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<MountType> for String {
    fn from(mount: MountType) -> Self {
        mount.as_str().to_string()
    }
}

impl std::fmt::Display for MountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sensor class tag. Only drives display color, never geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorClass(pub String);

impl SensorClass {
    pub fn new(class: impl Into<String>) -> Self {
        Self(class.into())
    }

    /// Display color for this class.
    pub fn color_rgb(&self) -> [u8; 3] {
        match self.0.trim().to_ascii_lowercase().as_str() {
            "radar" => [255, 165, 0],           // Orange
            "eo" | "camera" => [100, 255, 255], // Cyan
            "ir" | "irst" => [255, 100, 100],   // Red
            "lidar" => [100, 255, 100],         // Green
            "esm" | "rf" => [255, 100, 255],    // Magenta
            _ => [200, 200, 200],
        }
    }
}

/// Field-of-view and range envelope.
///
/// FOVs are full angles in degrees, symmetric about the boresight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovEnvelope {
    pub azimuth_fov_deg: f64,
    pub elevation_fov_deg: f64,
    /// Minimum detection range (meters)
    pub range_min: f64,
    /// Maximum detection range (meters)
    pub range_max: f64,
}

impl FovEnvelope {
    pub fn new(azimuth_fov_deg: f64, elevation_fov_deg: f64, range_min: f64, range_max: f64) -> Self {
        Self {
            azimuth_fov_deg,
            elevation_fov_deg,
            range_min,
            range_max,
        }
    }

    /// Returns the reason this envelope is unusable, if it is.
    pub fn problem(&self) -> Option<&'static str> {
        let values = [
            self.azimuth_fov_deg,
            self.elevation_fov_deg,
            self.range_min,
            self.range_max,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Some("non-finite value");
        }
        if self.azimuth_fov_deg <= 0.0 || self.azimuth_fov_deg > 360.0 {
            return Some("azimuth FOV must be in (0, 360]");
        }
        if self.elevation_fov_deg <= 0.0 || self.elevation_fov_deg > 180.0 {
            return Some("elevation FOV must be in (0, 180]");
        }
        if self.range_min < 0.0 {
            return Some("minimum range is negative");
        }
        if self.range_min > self.range_max {
            return Some("minimum range exceeds maximum range");
        }
        None
    }
}

/// A sensor attached to a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,

    /// Owning platform, resolved when the scene is built
    pub platform_id: PlatformId,

    pub class: SensorClass,

    pub envelope: FovEnvelope,

    /// Mount angles (degrees, NED ZYX) relative to the mount frame
    pub mount: EulerDegrees,

    pub mount_type: MountType,
}

impl Sensor {
    /// Creates a body-fixed, boresight-forward sensor.
    pub fn new(id: SensorId, platform_id: PlatformId, envelope: FovEnvelope) -> Self {
        Self {
            id,
            platform_id,
            class: SensorClass::default(),
            envelope,
            mount: EulerDegrees::ZERO,
            mount_type: MountType::BodyFixed,
        }
    }

    pub fn with_class(mut self, class: SensorClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_mount(mut self, mount: EulerDegrees, mount_type: MountType) -> Self {
        self.mount = mount;
        self.mount_type = mount_type;
        self
    }

    /// Mount orientation as a render-frame quaternion.
    pub fn mount_quaternion(&self) -> UnitQuaternion<f64> {
        self.mount.to_render_quaternion()
    }
}
