//! The "TIME" Engine - time-indexed platform state
//!
//! A platform owns a sorted sequence of timestamped state samples. Queries
//! clamp outside the recorded span and interpolate inside it:
//! - position, velocity and numeric custom fields by linear interpolation
//! - attitude by shortest-path slerp of the endpoints' render-frame quaternions
//!
//! Interpolated samples are built on demand and never written back.

use crate::frames::{lerp, lerp_vector, quaternion_to_euler_ned, slerp, EulerDegrees};
use crate::frames::{ned_to_render_position, ned_to_render_velocity};
use crate::types::{PlatformId, SensorId, Timestamp};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of an extra named field carried alongside the kinematic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(value) => Some(*value),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::Text(text) => Some(text),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Orientation of a sample.
///
/// Loaded samples carry the raw NED Euler angles. Interpolated samples carry
/// the slerped render-frame quaternion instead. Keeping the two apart means a
/// genuinely level platform (all angles zero) is never mistaken for a sample
/// whose angles were not populated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Attitude {
    /// Euler angles (degrees, NED) exactly as loaded
    Raw(EulerDegrees),

    /// Render-frame quaternion produced by interpolation
    Interpolated(UnitQuaternion<f64>),
}

impl Attitude {
    /// Render-frame orientation, derived on demand for raw angles.
    pub fn render_quaternion(&self) -> UnitQuaternion<f64> {
        match self {
            Attitude::Raw(euler) => euler.to_render_quaternion(),
            Attitude::Interpolated(q) => *q,
        }
    }

    /// Euler angles for display. Raw angles are returned untouched.
    pub fn euler_degrees(&self) -> EulerDegrees {
        match self {
            Attitude::Raw(euler) => *euler,
            Attitude::Interpolated(q) => quaternion_to_euler_ned(q),
        }
    }

    pub fn is_interpolated(&self) -> bool {
        matches!(self, Attitude::Interpolated(_))
    }
}

/// One timestamped platform state. Position and velocity are NED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSample {
    /// Milliseconds since epoch
    pub timestamp: Timestamp,

    /// Position [north, east, down] in meters
    pub position: Vector3<f64>,

    /// Velocity [north, east, down] in m/s
    pub velocity: Vector3<f64>,

    /// Attitude (raw angles or interpolated quaternion)
    pub attitude: Attitude,

    /// Open-ended named fields (numeric or text)
    #[serde(default)]
    pub extra: BTreeMap<String, FieldValue>,
}

impl StateSample {
    /// Creates a raw sample as produced by the loader.
    pub fn new(
        timestamp: Timestamp,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        attitude: EulerDegrees,
    ) -> Self {
        Self {
            timestamp,
            position,
            velocity,
            attitude: Attitude::Raw(attitude),
            extra: BTreeMap::new(),
        }
    }

    /// Adds a custom field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn render_position(&self) -> Vector3<f64> {
        ned_to_render_position(&self.position)
    }

    pub fn render_velocity(&self) -> Vector3<f64> {
        ned_to_render_velocity(&self.velocity)
    }

    pub fn render_orientation(&self) -> UnitQuaternion<f64> {
        self.attitude.render_quaternion()
    }

    /// Synthesizes the state at `t` between two bracketing samples.
    ///
    /// Coincident timestamps interpolate with fraction 0. The fraction is
    /// clamped to [0, 1] so callers cannot extrapolate.
    pub fn interpolate(before: &StateSample, after: &StateSample, t: Timestamp) -> StateSample {
        // Widened so spans across the whole i64 range cannot overflow
        let span = i128::from(after.timestamp) - i128::from(before.timestamp);
        let elapsed = i128::from(t) - i128::from(before.timestamp);
        let frac = if span == 0 {
            0.0
        } else {
            (elapsed as f64 / span as f64).clamp(0.0, 1.0)
        };

        let orientation = slerp(
            &before.attitude.render_quaternion(),
            &after.attitude.render_quaternion(),
            frac,
        );

        StateSample {
            timestamp: t,
            position: lerp_vector(&before.position, &after.position, frac),
            velocity: lerp_vector(&before.velocity, &after.velocity, frac),
            attitude: Attitude::Interpolated(orientation),
            extra: blend_fields(&before.extra, &after.extra, frac),
        }
    }
}

/// Merges custom fields of two endpoints.
///
/// Numbers on both sides are lerped. Anything else takes the earlier
/// endpoint's value when present, otherwise the later one's.
fn blend_fields(
    before: &BTreeMap<String, FieldValue>,
    after: &BTreeMap<String, FieldValue>,
    frac: f64,
) -> BTreeMap<String, FieldValue> {
    let mut merged = BTreeMap::new();

    for key in before.keys().chain(after.keys()) {
        if merged.contains_key(key) {
            continue;
        }
        let value = match (before.get(key), after.get(key)) {
            (Some(FieldValue::Number(a)), Some(FieldValue::Number(b))) => {
                FieldValue::Number(lerp(*a, *b, frac))
            }
            (Some(value), _) | (None, Some(value)) => value.clone(),
            (None, None) => continue,
        };
        merged.insert(key.clone(), value);
    }

    merged
}

/// A platform: identifier, sorted samples, and the sensors mounted on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    id: PlatformId,
    samples: Vec<StateSample>,
    sensors: Vec<SensorId>,
}

impl Platform {
    /// Creates a platform from samples in any order.
    ///
    /// Samples are stably sorted by timestamp; where several share a
    /// timestamp the last one supplied wins.
    pub fn new(id: PlatformId, mut samples: Vec<StateSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);

        let mut resolved: Vec<StateSample> = Vec::with_capacity(samples.len());
        for sample in samples {
            match resolved.last_mut() {
                Some(last) if last.timestamp == sample.timestamp => *last = sample,
                _ => resolved.push(sample),
            }
        }

        Self {
            id,
            samples: resolved,
            sensors: Vec::new(),
        }
    }

    pub fn id(&self) -> &PlatformId {
        &self.id
    }

    /// Samples in timestamp order.
    pub fn samples(&self) -> &[StateSample] {
        &self.samples
    }

    /// Sensors mounted on this platform (non-owning back-references).
    pub fn sensors(&self) -> &[SensorId] {
        &self.sensors
    }

    pub(crate) fn attach_sensor(&mut self, sensor: SensorId) {
        self.sensors.push(sensor);
    }

    /// First and last timestamps, if any samples exist.
    pub fn time_span(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.samples.first()?.timestamp, self.samples.last()?.timestamp))
    }

    /// State at time `t`.
    ///
    /// Returns `None` only when the platform has no samples. Outside the
    /// recorded span the boundary sample is returned unmodified; inside it the
    /// bracketing pair `s1.timestamp <= t < s2.timestamp` is found by binary
    /// search and interpolated.
    pub fn state_at_time(&self, t: Timestamp) -> Option<StateSample> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if t < first.timestamp {
            return Some(first.clone());
        }
        if t >= last.timestamp {
            return Some(last.clone());
        }

        // first.timestamp <= t < last.timestamp, so 1 <= upper < len
        let upper = self.samples.partition_point(|s| s.timestamp <= t);
        let before = &self.samples[upper - 1];
        let after = &self.samples[upper];

        Some(StateSample::interpolate(before, after, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(timestamp: Timestamp, north: f64, yaw: f64) -> StateSample {
        StateSample::new(
            timestamp,
            Vector3::new(north, 0.0, 0.0),
            Vector3::zeros(),
            EulerDegrees::new(0.0, 0.0, yaw),
        )
    }

    fn platform(samples: Vec<StateSample>) -> Platform {
        Platform::new(PlatformId::new("p1"), samples)
    }

    #[test]
    fn test_empty_platform_has_no_state() {
        assert!(platform(vec![]).state_at_time(0).is_none());
    }

    #[test]
    fn test_samples_are_sorted() {
        let p = platform(vec![sample(300, 3.0, 0.0), sample(100, 1.0, 0.0), sample(200, 2.0, 0.0)]);
        let order: Vec<Timestamp> = p.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(order, vec![100, 200, 300]);
        assert_eq!(p.time_span(), Some((100, 300)));
    }

    #[test]
    fn test_duplicate_timestamps_keep_last_seen() {
        let p = platform(vec![
            sample(100, 1.0, 0.0),
            sample(200, 2.0, 0.0),
            sample(100, 9.0, 0.0),
        ]);
        assert_eq!(p.samples().len(), 2);
        assert_eq!(p.samples()[0].position.x, 9.0);
    }

    #[test]
    fn test_clamps_before_first_sample() {
        let first = sample(1000, 5.0, 10.0).with_field("mach", 0.8);
        let p = platform(vec![first.clone(), sample(2000, 6.0, 20.0)]);
        assert_eq!(p.state_at_time(0), Some(first));
    }

    #[test]
    fn test_clamps_after_last_sample() {
        let last = sample(2000, 6.0, 20.0);
        let p = platform(vec![sample(1000, 5.0, 10.0), last.clone()]);
        assert_eq!(p.state_at_time(999_999), Some(last.clone()));
        assert_eq!(p.state_at_time(2000), Some(last));
    }

    #[test]
    fn test_single_sample_is_returned_everywhere() {
        let only = sample(500, 1.0, 0.0);
        let p = platform(vec![only.clone()]);
        assert_eq!(p.state_at_time(-10), Some(only.clone()));
        assert_eq!(p.state_at_time(500), Some(only.clone()));
        assert_eq!(p.state_at_time(10_000), Some(only));
    }

    #[test]
    fn test_interpolation_midpoint() {
        let p = platform(vec![sample(0, 0.0, 0.0), sample(1000, 100.0, 0.0)]);
        let mid = p.state_at_time(500).unwrap();
        assert_eq!(mid.timestamp, 500);
        assert_eq!(mid.position, Vector3::new(50.0, 0.0, 0.0));
        assert!(mid.attitude.is_interpolated());
    }

    #[test]
    fn test_interpolation_picks_bracketing_pair() {
        let p = platform(vec![
            sample(0, 0.0, 0.0),
            sample(1000, 10.0, 0.0),
            sample(2000, 30.0, 0.0),
            sample(3000, 60.0, 0.0),
        ]);
        let state = p.state_at_time(2500).unwrap();
        assert_relative_eq!(state.position.x, 45.0, epsilon = 1e-12);
    }

    #[test]
    fn test_attitude_is_slerped_short_way() {
        let p = platform(vec![sample(0, 0.0, 170.0), sample(1000, 0.0, -170.0)]);
        let mid = p.state_at_time(500).unwrap();
        let euler = mid.attitude.euler_degrees();
        assert_relative_eq!(euler.yaw.abs(), 180.0, epsilon = 1e-6);
    }

    #[test]
    fn test_numeric_fields_lerp_and_missing_values_carry() {
        let a = sample(0, 0.0, 0.0).with_field("fuel", 100.0).with_field("only_a", 7.0);
        let b = sample(1000, 0.0, 0.0).with_field("fuel", 50.0).with_field("only_b", 3.0);
        let mid = platform(vec![a, b]).state_at_time(250).unwrap();

        assert_eq!(mid.extra["fuel"], FieldValue::Number(87.5));
        assert_eq!(mid.extra["only_a"], FieldValue::Number(7.0));
        assert_eq!(mid.extra["only_b"], FieldValue::Number(3.0));
    }

    #[test]
    fn test_text_fields_take_earlier_endpoint() {
        let a = sample(0, 0.0, 0.0).with_field("mode", "cruise");
        let b = sample(1000, 0.0, 0.0)
            .with_field("mode", "dash")
            .with_field("callsign", "VIPER");
        let mid = platform(vec![a, b]).state_at_time(900).unwrap();

        assert_eq!(mid.extra["mode"].as_text(), Some("cruise"));
        assert_eq!(mid.extra["callsign"].as_text(), Some("VIPER"));
    }

    #[test]
    fn test_coincident_timestamps_do_not_divide_by_zero() {
        let a = sample(100, 1.0, 0.0);
        let b = sample(100, 2.0, 0.0);
        let out = StateSample::interpolate(&a, &b, 100);
        assert_eq!(out.position.x, 1.0);
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let p = platform(vec![sample(i64::MIN, 0.0, 0.0), sample(i64::MAX, 100.0, 0.0)]);
        let mid = p.state_at_time(0).unwrap();
        assert_relative_eq!(mid.position.x, 50.0, epsilon = 1e-9);
        assert_eq!(p.state_at_time(i64::MAX).unwrap().position.x, 100.0);
    }

    #[test]
    fn test_lookup_is_idempotent_and_pure() {
        let p = platform(vec![sample(0, 0.0, 10.0), sample(1000, 100.0, 80.0)]);
        let before = p.samples().to_vec();

        let first = p.state_at_time(333).unwrap();
        let second = p.state_at_time(333).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.position.x.to_bits(), second.position.x.to_bits());
        assert_eq!(p.samples(), before.as_slice());
    }

    #[test]
    fn test_raw_attitude_reads_back_untouched() {
        let raw = EulerDegrees::new(0.0, 0.0, 0.0);
        let s = StateSample::new(0, Vector3::zeros(), Vector3::zeros(), raw);
        assert!(!s.attitude.is_interpolated());
        assert_eq!(s.attitude.euler_degrees(), raw);
    }

    #[test]
    fn test_render_accessors() {
        let s = StateSample::new(
            0,
            Vector3::new(1.0, 2.0, -300.0),
            Vector3::new(10.0, 0.0, 1.0),
            EulerDegrees::ZERO,
        );
        assert_eq!(s.render_position(), Vector3::new(1.0, 300.0, 2.0));
        assert_eq!(s.render_velocity(), Vector3::new(10.0, -1.0, 0.0));
    }

    #[test]
    fn test_field_value_json_shape() {
        let fields: BTreeMap<String, FieldValue> =
            serde_json::from_str(r#"{"mach": 0.9, "mode": "cruise"}"#).unwrap();
        assert_eq!(fields["mach"], FieldValue::Number(0.9));
        assert_eq!(fields["mode"], FieldValue::Text("cruise".into()));
    }
}
