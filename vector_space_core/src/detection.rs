//! Detection geometry: is a target inside a sensor's envelope?
//!
//! The target offset is rotated into the sensor's local frame and decomposed
//! into spherical angles about the boresight:
//!
//! ```text
//!   boresight (forward) = local +x
//!   right               = local +z
//!   up                  = local +y
//!
//!   azimuth   = atan2(right, forward)              positive to the right
//!   elevation = atan2(up, |(forward, right)|)      positive up
//! ```
//!
//! Detection is a stateless predicate: no history, no hysteresis.

use crate::frames::normalize_or;
use crate::sensor::{FovEnvelope, Sensor};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Sensor-local boresight direction.
pub fn boresight() -> Vector3<f64> {
    Vector3::x()
}

/// Target position expressed in sensor-local spherical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBearing {
    /// Angle right of boresight in degrees, (-180, 180]
    pub azimuth_deg: f64,

    /// Angle above the boresight/right plane in degrees, [-90, 90]
    pub elevation_deg: f64,

    /// Straight-line distance in meters
    pub range: f64,
}

impl LocalBearing {
    /// Whether this bearing falls inside `envelope` (range and both angles).
    pub fn within(&self, envelope: &FovEnvelope) -> bool {
        if self.range < envelope.range_min || self.range > envelope.range_max {
            return false;
        }
        self.azimuth_deg.abs() <= envelope.azimuth_fov_deg / 2.0
            && self.elevation_deg.abs() <= envelope.elevation_fov_deg / 2.0
    }
}

/// Computes the bearing of `target` from a sensor at the given world pose.
///
/// A target coincident with the sensor takes the boresight direction.
pub fn local_bearing(
    sensor_position: &Vector3<f64>,
    sensor_orientation: &UnitQuaternion<f64>,
    target_position: &Vector3<f64>,
) -> LocalBearing {
    let delta = target_position - sensor_position;
    let range = delta.norm();

    let local = sensor_orientation.inverse_transform_vector(&delta);
    let dir = normalize_or(&local, boresight());

    LocalBearing {
        azimuth_deg: dir.z.atan2(dir.x).to_degrees(),
        elevation_deg: dir.y.atan2(dir.x.hypot(dir.z)).to_degrees(),
        range,
    }
}

/// Whether `sensor`, at the given world pose, detects a point target.
///
/// Callers exclude the sensor's own platform.
pub fn is_detectable(
    sensor: &Sensor,
    sensor_position: &Vector3<f64>,
    sensor_orientation: &UnitQuaternion<f64>,
    target_position: &Vector3<f64>,
) -> bool {
    local_bearing(sensor_position, sensor_orientation, target_position).within(&sensor.envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{euler_ned_to_quaternion, ned_to_render_position};
    use crate::types::{PlatformId, SensorId};
    use approx::assert_relative_eq;

    fn sensor() -> Sensor {
        Sensor::new(
            SensorId::new("radar"),
            PlatformId::new("p1"),
            FovEnvelope::new(60.0, 40.0, 100.0, 5000.0),
        )
    }

    fn on_boresight(range: f64) -> Vector3<f64> {
        Vector3::new(range, 0.0, 0.0)
    }

    #[test]
    fn test_detection_envelope_range_gates() {
        let s = sensor();
        let origin = Vector3::zeros();
        let level = UnitQuaternion::identity();

        assert!(is_detectable(&s, &origin, &level, &on_boresight(1000.0)));
        assert!(!is_detectable(&s, &origin, &level, &on_boresight(50.0)));
        assert!(!is_detectable(&s, &origin, &level, &on_boresight(6000.0)));
    }

    #[test]
    fn test_range_limits_are_inclusive() {
        let s = sensor();
        let level = UnitQuaternion::identity();
        assert!(is_detectable(&s, &Vector3::zeros(), &level, &on_boresight(100.0)));
        assert!(is_detectable(&s, &Vector3::zeros(), &level, &on_boresight(5000.0)));
    }

    #[test]
    fn test_azimuth_and_elevation_signs() {
        let level = UnitQuaternion::identity();
        // 45° right (render +z)
        let right = local_bearing(&Vector3::zeros(), &level, &Vector3::new(100.0, 0.0, 100.0));
        assert_relative_eq!(right.azimuth_deg, 45.0, epsilon = 1e-9);
        assert_relative_eq!(right.elevation_deg, 0.0, epsilon = 1e-9);

        // 30° up
        let up_y = 100.0 * 30.0_f64.to_radians().tan();
        let up = local_bearing(&Vector3::zeros(), &level, &Vector3::new(100.0, up_y, 0.0));
        assert_relative_eq!(up.elevation_deg, 30.0, epsilon = 1e-9);
        assert_relative_eq!(up.azimuth_deg, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_angular_gates() {
        let s = sensor();
        let level = UnitQuaternion::identity();
        let at = |az: f64, el: f64| {
            let (az, el) = (az.to_radians(), el.to_radians());
            Vector3::new(el.cos() * az.cos(), el.sin(), el.cos() * az.sin()) * 1000.0
        };

        assert!(is_detectable(&s, &Vector3::zeros(), &level, &at(29.0, 0.0)));
        assert!(!is_detectable(&s, &Vector3::zeros(), &level, &at(31.0, 0.0)));
        assert!(is_detectable(&s, &Vector3::zeros(), &level, &at(-29.0, 19.0)));
        assert!(!is_detectable(&s, &Vector3::zeros(), &level, &at(0.0, -21.0)));
        assert!(!is_detectable(&s, &Vector3::zeros(), &level, &at(180.0, 0.0)));
    }

    #[test]
    fn test_rotated_sensor_sees_along_its_boresight() {
        let s = sensor();
        // Heading east: the target must be east (render +z) of the sensor
        let facing_east = euler_ned_to_quaternion(0.0, 0.0, 90.0);
        let sensor_pos = ned_to_render_position(&Vector3::new(0.0, 0.0, -1000.0));
        let east_target = ned_to_render_position(&Vector3::new(0.0, 2000.0, -1000.0));
        let north_target = ned_to_render_position(&Vector3::new(2000.0, 0.0, -1000.0));

        assert!(is_detectable(&s, &sensor_pos, &facing_east, &east_target));
        assert!(!is_detectable(&s, &sensor_pos, &facing_east, &north_target));
    }

    #[test]
    fn test_coincident_target_uses_fallback_axis() {
        let bearing = local_bearing(
            &Vector3::new(5.0, 5.0, 5.0),
            &UnitQuaternion::identity(),
            &Vector3::new(5.0, 5.0, 5.0),
        );
        assert_eq!(bearing.range, 0.0);
        assert_eq!(bearing.azimuth_deg, 0.0);
        assert_eq!(bearing.elevation_deg, 0.0);

        let point_blank = Sensor::new(
            SensorId::new("s"),
            PlatformId::new("p"),
            FovEnvelope::new(10.0, 10.0, 0.0, 10.0),
        );
        assert!(is_detectable(
            &point_blank,
            &Vector3::zeros(),
            &UnitQuaternion::identity(),
            &Vector3::zeros()
        ));
    }

    #[test]
    fn test_detection_is_repeatable() {
        let s = sensor();
        let q = euler_ned_to_quaternion(10.0, 5.0, -20.0);
        let target = Vector3::new(900.0, 40.0, -300.0);
        let first = is_detectable(&s, &Vector3::zeros(), &q, &target);
        for _ in 0..5 {
            assert_eq!(is_detectable(&s, &Vector3::zeros(), &q, &target), first);
        }
    }
}
