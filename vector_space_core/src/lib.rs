//! Vector Space Core - Platform/Sensor Geometry for 3D Playback
//!
//! This library answers three questions for every playback frame:
//! 1. **Where is each platform?** Timeline interpolation over NED state samples
//!    (linear position, spherical attitude) mapped into the Y-up render frame
//! 2. **Where is each sensor looking?** Mount composition under body-fixed or
//!    gyro-stabilized policies
//! 3. **What does each sensor see?** Spherical-angle envelope tests per
//!    (sensor, target) pair, plus tessellated FOV boundaries for drawing

pub mod detection;
pub mod error;
pub mod fov;
pub mod frames;
pub mod geodetic;
pub mod mount;
pub mod scene;
pub mod sensor;
pub mod timeline;
pub mod types;

// Re-export key types for convenience
pub use detection::{is_detectable, local_bearing, LocalBearing};
pub use error::CoreError;
pub use fov::{tessellate_envelope, tessellate_fov, FovMesh};
pub use frames::{AngleUnits, EulerDegrees};
pub use geodetic::{Geodetic, LlaReference};
pub use mount::resolve_sensor_pose;
pub use scene::{DetectionPair, FrameSnapshot, Scene, SceneBuilder};
pub use sensor::{FovEnvelope, MountType, Sensor, SensorClass};
pub use timeline::{Attitude, FieldValue, Platform, StateSample};
pub use types::{PlatformId, Pose, SensorId, Timestamp};
