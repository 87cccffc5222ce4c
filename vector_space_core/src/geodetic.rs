//! Geodetic input conversion (WGS84 LLA → ECEF → local NED).
//!
//! Latitude and longitude are radians, altitude is meters above the ellipsoid.

use crate::error::CoreError;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// WGS84 semi-major axis (meters)
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = 6.694_379_990_14e-3;

/// A geodetic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geodetic {
    /// Latitude (radians)
    pub lat: f64,
    /// Longitude (radians)
    pub lon: f64,
    /// Altitude above the ellipsoid (meters)
    pub alt: f64,
}

impl Geodetic {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }
}

/// Origin of the local NED frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LlaReference {
    /// First point of the track being converted
    #[default]
    First,

    /// Fixed geodetic point
    Explicit(Geodetic),
}

/// Converts a geodetic position to Earth-Centered Earth-Fixed meters.
pub fn lla_to_ecef(position: &Geodetic) -> Vector3<f64> {
    let (sin_lat, cos_lat) = position.lat.sin_cos();
    let (sin_lon, cos_lon) = position.lon.sin_cos();

    // Prime vertical radius of curvature
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + position.alt) * cos_lat * cos_lon,
        (n + position.alt) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + position.alt) * sin_lat,
    )
}

/// Expresses an ECEF point in the NED tangent frame at `reference`.
pub fn ecef_to_ned(ecef: &Vector3<f64>, reference: &Geodetic) -> Vector3<f64> {
    let delta = ecef - lla_to_ecef(reference);

    let (sin_lat, cos_lat) = reference.lat.sin_cos();
    let (sin_lon, cos_lon) = reference.lon.sin_cos();

    #[rustfmt::skip]
    let ecef_to_ned = Matrix3::new(
        -sin_lat * cos_lon, -sin_lat * sin_lon,  cos_lat,
        -sin_lon,            cos_lon,            0.0,
        -cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat,
    );

    ecef_to_ned * delta
}

/// Geodetic position to NED relative to `reference`.
pub fn lla_to_ned(position: &Geodetic, reference: &Geodetic) -> Vector3<f64> {
    ecef_to_ned(&lla_to_ecef(position), reference)
}

/// Resolves the reference point for a track.
pub fn resolve_reference(track: &[Geodetic], reference: LlaReference) -> Result<Geodetic, CoreError> {
    match reference {
        LlaReference::First => track.first().copied().ok_or(CoreError::EmptyTrack),
        LlaReference::Explicit(point) => {
            if !(point.lat.is_finite() && point.lon.is_finite() && point.alt.is_finite()) {
                return Err(CoreError::InvalidReference("non-finite coordinate".to_string()));
            }
            if point.lat.abs() > std::f64::consts::FRAC_PI_2 {
                return Err(CoreError::InvalidReference(format!(
                    "latitude {} rad outside [-pi/2, pi/2]",
                    point.lat
                )));
            }
            Ok(point)
        }
    }
}

/// Converts a whole track to NED positions about a single reference.
pub fn convert_track_to_ned(
    track: &[Geodetic],
    reference: LlaReference,
) -> Result<Vec<Vector3<f64>>, CoreError> {
    let origin = resolve_reference(track, reference)?;
    Ok(track.iter().map(|p| lla_to_ned(p, &origin)).collect())
}
