//! The "FRAMES" Engine - NED ↔ render-frame conversion
//!
//! Telemetry arrives in the aerospace North-East-Down frame. The renderer is
//! right-handed and Y-up. The two are related by a fixed axis permutation:
//!
//! ```text
//!   render.x =  north
//!   render.y = -down    (up)
//!   render.z =  east
//! ```
//!
//! The permutation has determinant +1, so it is itself a proper rotation:
//! attitude quaternions carry over by remapping their vector part the same way
//! positions are remapped. Everything here is pure and total over finite input.

use nalgebra::{Quaternion, UnitQuaternion, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// Above this |dot| the two quaternions are nearly parallel and slerp falls back
/// to normalized lerp (the sine denominator vanishes).
const SLERP_LINEAR_THRESHOLD: f64 = 0.9995;

/// Euler angles in degrees, ZYX intrinsic in the NED frame:
/// yaw about down, then pitch about east, then roll about north.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EulerDegrees {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl EulerDegrees {
    pub const ZERO: Self = Self {
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
    };

    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Converts to a unit quaternion in the render frame.
    pub fn to_render_quaternion(&self) -> UnitQuaternion<f64> {
        euler_ned_to_quaternion(self.roll, self.pitch, self.yaw)
    }
}

/// Units of attitude angles in input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnits {
    #[default]
    Degrees,
    Radians,
}

impl AngleUnits {
    /// Converts a value in these units to degrees.
    pub fn to_degrees(self, value: f64) -> f64 {
        match self {
            AngleUnits::Degrees => value,
            AngleUnits::Radians => value.to_degrees(),
        }
    }
}

// ========== Positions & Velocities ==========

/// Maps an NED position `[north, east, down]` to the render frame `(N, -D, E)`.
pub fn ned_to_render_position(ned: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(ned.x, -ned.z, ned.y)
}

/// Inverse of [`ned_to_render_position`]; returns `[north, east, down]`.
pub fn render_to_ned_position(render: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(render.x, render.z, -render.y)
}

/// Velocities are free vectors: same mapping as positions.
pub fn ned_to_render_velocity(ned: &Vector3<f64>) -> Vector3<f64> {
    ned_to_render_position(ned)
}

/// Inverse of [`ned_to_render_velocity`].
pub fn render_to_ned_velocity(render: &Vector3<f64>) -> Vector3<f64> {
    render_to_ned_position(render)
}

// ========== Orientations ==========

/// Re-expresses an NED-frame rotation in the render frame.
///
/// Conjugating by the axis permutation remaps the quaternion's vector part
/// exactly like a position: the yaw (down) component is negated onto the
/// up axis, and the pitch (east) component moves to render z.
pub fn ned_to_render_quaternion(ned: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let q = ned.quaternion();
    UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, -q.k, q.j))
}

/// Inverse of [`ned_to_render_quaternion`].
pub fn render_to_ned_quaternion(render: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
    let q = render.quaternion();
    UnitQuaternion::new_unchecked(Quaternion::new(q.w, q.i, q.k, -q.j))
}

/// Builds the render-frame attitude quaternion from NED Euler angles (degrees).
///
/// The NED rotation is `Rz(yaw) · Ry(pitch) · Rx(roll)`.
pub fn euler_ned_to_quaternion(roll: f64, pitch: f64, yaw: f64) -> UnitQuaternion<f64> {
    let ned = UnitQuaternion::from_euler_angles(
        roll.to_radians(),
        pitch.to_radians(),
        yaw.to_radians(),
    );
    ned_to_render_quaternion(&ned)
}

/// Extracts NED Euler angles (degrees) from a render-frame attitude.
///
/// Angles come back in roll ∈ (-180, 180], pitch ∈ [-90, 90], yaw ∈ (-180, 180].
/// At pitch = ±90° roll and yaw are not separable; the split is arbitrary.
pub fn quaternion_to_euler_ned(render: &UnitQuaternion<f64>) -> EulerDegrees {
    let (roll, pitch, yaw) = render_to_ned_quaternion(render).euler_angles();
    EulerDegrees::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
}

// ========== Interpolation ==========

/// Shortest-path spherical interpolation, `t` clamped to [0, 1].
///
/// Endpoints are renormalized on the way in and the result on the way out.
pub fn slerp(from: &UnitQuaternion<f64>, to: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    let t = t.clamp(0.0, 1.0);
    let a: Vector4<f64> = from.quaternion().coords.normalize();
    let mut b: Vector4<f64> = to.quaternion().coords.normalize();

    // q and -q are the same rotation; take the hemisphere closer to `a`
    let mut dot = a.dot(&b);
    if dot < 0.0 {
        b = -b;
        dot = -dot;
    }

    let blended = if dot > SLERP_LINEAR_THRESHOLD {
        a.lerp(&b, t)
    } else {
        let theta = dot.min(1.0).acos();
        let sin_theta = theta.sin();
        a * (((1.0 - t) * theta).sin() / sin_theta) + b * ((t * theta).sin() / sin_theta)
    };

    UnitQuaternion::from_quaternion(Quaternion::from(blended))
}

/// Scalar linear interpolation.
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Componentwise linear interpolation for positions and velocities.
pub fn lerp_vector(from: &Vector3<f64>, to: &Vector3<f64>, t: f64) -> Vector3<f64> {
    Vector3::new(
        lerp(from.x, to.x, t),
        lerp(from.y, to.y, t),
        lerp(from.z, to.z, t),
    )
}

/// Normalizes `v`, or returns `fallback` when `v` has (near) zero length.
pub fn normalize_or(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    v.try_normalize(f64::EPSILON).unwrap_or(fallback)
}
