//! Sensor mount resolution.
//!
//! Two fixed policies, chosen per sensor by its [`MountType`]:
//! - `BodyFixed`:  sensor = platform ⊗ mount
//! - `Stabilized`: sensor = horizon(platform yaw) ⊗ mount
//!
//! The sensor always sits at the platform origin; no lever arm is modelled.

use crate::frames::{euler_ned_to_quaternion, quaternion_to_euler_ned};
use crate::sensor::{MountType, Sensor};
use crate::types::Pose;
use nalgebra::UnitQuaternion;

/// Level frame sharing the platform's heading (roll and pitch discarded).
pub fn horizon_frame(platform_orientation: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let heading = quaternion_to_euler_ned(platform_orientation).yaw;
    euler_ned_to_quaternion(0.0, 0.0, heading)
}

/// World (render-frame) orientation of a sensor.
///
/// The mount rotation is applied in the local frame of the policy's base
/// frame, i.e. composed on the right.
pub fn resolve_sensor_orientation(
    mount_type: MountType,
    platform_orientation: &UnitQuaternion<f64>,
    mount_orientation: &UnitQuaternion<f64>,
) -> UnitQuaternion<f64> {
    let base = match mount_type {
        MountType::BodyFixed => *platform_orientation,
        MountType::Stabilized => horizon_frame(platform_orientation),
    };
    base * mount_orientation
}

/// World pose of a sensor given its platform's pose.
pub fn resolve_sensor_pose(sensor: &Sensor, platform_pose: &Pose) -> Pose {
    Pose::new(
        platform_pose.position,
        resolve_sensor_orientation(
            sensor.mount_type,
            &platform_pose.orientation,
            &sensor.mount_quaternion(),
        ),
    )
}
