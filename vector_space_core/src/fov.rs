//! FOV boundary tessellation.
//!
//! The detection envelope is a spherical-angle wedge: every boundary point is
//! at `range_max` from the apex, so the far face is a spherical cap patch
//! rather than a flat pyramid base. Geometry is produced in sensor-local
//! coordinates using the same axes as [`crate::detection`].

use crate::sensor::FovEnvelope;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Default angular step between neighbouring cap vertices (degrees).
pub const DEFAULT_RESOLUTION_DEG: f64 = 5.0;

/// Minimum segments along each angular axis, however narrow the FOV.
pub const MIN_SEGMENTS: usize = 2;

/// Maximum segments along each angular axis, however fine the resolution.
pub const MAX_SEGMENTS: usize = 720;

/// Index of the apex vertex (the sensor origin).
pub const APEX: u32 = 0;

/// Triangulated boundary of a sensor envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FovMesh {
    /// Apex first, then the cap grid row by row (elevation-major)
    pub vertices: Vec<Point3<f64>>,

    /// Far cap, wound counter-clockwise seen from outside
    pub cap: Vec<[u32; 3]>,

    /// Four ruled sides, each a fan from the apex to one boundary curve
    pub sides: Vec<[u32; 3]>,

    /// Wireframe polylines: four apex-to-corner edges, then the four
    /// boundary curves (bottom, right, top, left)
    pub edges: Vec<Vec<u32>>,

    pub azimuth_segments: usize,
    pub elevation_segments: usize,
}

impl FovMesh {
    /// Number of cap grid vertices (excludes the apex).
    pub fn cap_vertex_count(&self) -> usize {
        (self.azimuth_segments + 1) * (self.elevation_segments + 1)
    }
}

/// Segments needed to cover `fov_deg` at `resolution_deg` per segment.
pub fn segment_count(fov_deg: f64, resolution_deg: f64) -> usize {
    let resolution = if resolution_deg.is_finite() && resolution_deg > 0.0 {
        resolution_deg
    } else {
        DEFAULT_RESOLUTION_DEG
    };
    let raw = (fov_deg.abs() / resolution).ceil();
    if raw.is_finite() {
        (raw.min(MAX_SEGMENTS as f64) as usize).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
    } else {
        MIN_SEGMENTS
    }
}

/// Unit direction for local spherical angles (degrees).
pub fn direction(azimuth_deg: f64, elevation_deg: f64) -> Vector3<f64> {
    let (sin_az, cos_az) = azimuth_deg.to_radians().sin_cos();
    let (sin_el, cos_el) = elevation_deg.to_radians().sin_cos();
    Vector3::new(cos_el * cos_az, sin_el, cos_el * sin_az)
}

/// Builds the envelope boundary mesh. Deterministic in its inputs.
pub fn tessellate_fov(
    azimuth_fov_deg: f64,
    elevation_fov_deg: f64,
    range_max: f64,
    resolution_deg: f64,
) -> FovMesh {
    let n_az = segment_count(azimuth_fov_deg, resolution_deg);
    let n_el = segment_count(elevation_fov_deg, resolution_deg);
    let half_az = azimuth_fov_deg / 2.0;
    let half_el = elevation_fov_deg / 2.0;

    let mut vertices = Vec::with_capacity(1 + (n_az + 1) * (n_el + 1));
    vertices.push(Point3::origin());
    for j in 0..=n_el {
        let el = -half_el + elevation_fov_deg * j as f64 / n_el as f64;
        for i in 0..=n_az {
            let az = -half_az + azimuth_fov_deg * i as f64 / n_az as f64;
            vertices.push(Point3::from(direction(az, el) * range_max));
        }
    }

    let index = |i: usize, j: usize| (1 + j * (n_az + 1) + i) as u32;

    let mut cap = Vec::with_capacity(2 * n_az * n_el);
    for j in 0..n_el {
        for i in 0..n_az {
            let a = index(i, j);
            let b = index(i + 1, j);
            let c = index(i, j + 1);
            let d = index(i + 1, j + 1);
            cap.push([a, c, b]);
            cap.push([b, c, d]);
        }
    }

    let bottom: Vec<u32> = (0..=n_az).map(|i| index(i, 0)).collect();
    let top: Vec<u32> = (0..=n_az).map(|i| index(i, n_el)).collect();
    let left: Vec<u32> = (0..=n_el).map(|j| index(0, j)).collect();
    let right: Vec<u32> = (0..=n_el).map(|j| index(n_az, j)).collect();

    // Fan order is flipped on top/left so every side faces away from the wedge
    let mut sides = Vec::with_capacity(2 * (n_az + n_el));
    fan(&mut sides, &bottom, false);
    fan(&mut sides, &right, false);
    fan(&mut sides, &top, true);
    fan(&mut sides, &left, true);

    let corners = [index(0, 0), index(n_az, 0), index(n_az, n_el), index(0, n_el)];
    let mut edges: Vec<Vec<u32>> = corners.iter().map(|&corner| vec![APEX, corner]).collect();
    edges.push(bottom);
    edges.push(right);
    edges.push(top);
    edges.push(left);

    FovMesh {
        vertices,
        cap,
        sides,
        edges,
        azimuth_segments: n_az,
        elevation_segments: n_el,
    }
}

/// Tessellates a sensor envelope at the given resolution.
pub fn tessellate_envelope(envelope: &FovEnvelope, resolution_deg: f64) -> FovMesh {
    tessellate_fov(
        envelope.azimuth_fov_deg,
        envelope.elevation_fov_deg,
        envelope.range_max,
        resolution_deg,
    )
}

fn fan(out: &mut Vec<[u32; 3]>, curve: &[u32], reversed: bool) {
    for pair in curve.windows(2) {
        if reversed {
            out.push([APEX, pair[1], pair[0]]);
        } else {
            out.push([APEX, pair[0], pair[1]]);
        }
    }
}
