//! Deterministic track generator.
//!
//! Produces NED platform telemetry for synthetic scenes:
//! - Straight constant-velocity legs
//! - Circular orbits, optionally in a coordinated bank
//! - Gaussian position and attitude jitter from a seeded RNG
//!
//! Same seed and same calls give bit-identical samples.

use nalgebra::Vector3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use vector_space_core::{EulerDegrees, StateSample, Timestamp};

/// Standard gravity (m/s²)
pub const GRAVITY: f64 = 9.806_65;

/// Sampling window for a generated track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackWindow {
    pub start: Timestamp,
    pub duration_ms: i64,
    pub sample_ms: i64,
}

impl TrackWindow {
    pub fn new(start: Timestamp, duration_ms: i64, sample_ms: i64) -> Self {
        Self {
            start,
            duration_ms,
            sample_ms,
        }
    }

    /// Sample times from `start` to `start + duration_ms`, both inclusive.
    pub fn timestamps(&self) -> Vec<Timestamp> {
        let step = self.sample_ms.max(1);
        let end = self.start + self.duration_ms.max(0);
        let mut times: Vec<Timestamp> = (self.start..end).step_by(step as usize).collect();
        times.push(end);
        times
    }
}

/// A circular holding pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    /// Orbit center, NED meters
    pub center: Vector3<f64>,
    pub radius: f64,
    /// Ground speed in m/s
    pub speed: f64,
    /// Starting angle from north towards east (degrees)
    pub start_angle_deg: f64,
    /// Clockwise seen from above (right-hand turn)
    pub clockwise: bool,
    /// Fly the coordinated-turn bank angle instead of wings level
    pub banked: bool,
}

impl Orbit {
    /// Bank angle of a coordinated turn at this speed and radius (degrees).
    pub fn bank_angle_deg(&self) -> f64 {
        let roll = (self.speed * self.speed / (GRAVITY * self.radius)).atan().to_degrees();
        if self.clockwise {
            roll
        } else {
            -roll
        }
    }
}

/// The track generator: seeded noise plus simple kinematics.
pub struct TrackGenerator {
    seed: u64,
    rng: ChaCha8Rng,

    /// Position jitter standard deviation (meters)
    position_noise_std: f64,

    /// Attitude jitter standard deviation (degrees)
    attitude_noise_std: f64,
}

impl TrackGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            position_noise_std: 0.5,
            attitude_noise_std: 0.2,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_position_noise(&mut self, std_dev: f64) {
        self.position_noise_std = std_dev;
    }

    pub fn set_attitude_noise(&mut self, std_dev_deg: f64) {
        self.attitude_noise_std = std_dev_deg;
    }

    /// One zero-mean Gaussian draw. A zero, negative or non-finite deviation
    /// yields no noise and consumes no randomness.
    fn jitter(&mut self, std_dev: f64) -> f64 {
        if !(std_dev.is_finite() && std_dev > 0.0) {
            return 0.0;
        }
        match Normal::new(0.0, std_dev) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => 0.0,
        }
    }

    fn jitter_position(&mut self, position: Vector3<f64>) -> Vector3<f64> {
        let std = self.position_noise_std;
        position + Vector3::new(self.jitter(std), self.jitter(std), self.jitter(std))
    }

    fn jitter_attitude(&mut self, attitude: EulerDegrees) -> EulerDegrees {
        let std = self.attitude_noise_std;
        EulerDegrees::new(
            attitude.roll + self.jitter(std),
            attitude.pitch + self.jitter(std),
            attitude.yaw + self.jitter(std),
        )
    }

    fn sample(
        &mut self,
        timestamp: Timestamp,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        attitude: EulerDegrees,
    ) -> StateSample {
        let position = self.jitter_position(position);
        let attitude = self.jitter_attitude(attitude);
        StateSample::new(timestamp, position, velocity, attitude)
            .with_field("ground_speed", velocity.xy().norm())
    }

    /// Constant-velocity leg, wings level, nose along the velocity.
    pub fn straight(
        &mut self,
        start: Vector3<f64>,
        velocity: Vector3<f64>,
        window: TrackWindow,
    ) -> Vec<StateSample> {
        let heading = velocity.y.atan2(velocity.x).to_degrees();
        let climb = (-velocity.z).atan2(velocity.xy().norm()).to_degrees();
        let attitude = EulerDegrees::new(0.0, climb, heading);

        window
            .timestamps()
            .into_iter()
            .map(|t| {
                let elapsed = (t - window.start) as f64 / 1000.0;
                self.sample(t, start + velocity * elapsed, velocity, attitude)
            })
            .collect()
    }

    /// Circular orbit at constant altitude.
    pub fn orbit(&mut self, orbit: &Orbit, window: TrackWindow) -> Vec<StateSample> {
        let direction = if orbit.clockwise { 1.0 } else { -1.0 };
        let omega = direction * orbit.speed / orbit.radius;
        let roll = if orbit.banked { orbit.bank_angle_deg() } else { 0.0 };

        window
            .timestamps()
            .into_iter()
            .map(|t| {
                let elapsed = (t - window.start) as f64 / 1000.0;
                let theta = orbit.start_angle_deg.to_radians() + omega * elapsed;
                let (sin, cos) = theta.sin_cos();

                let position = orbit.center + Vector3::new(cos, sin, 0.0) * orbit.radius;
                let velocity = Vector3::new(-sin, cos, 0.0) * (omega * orbit.radius);
                let heading = velocity.y.atan2(velocity.x).to_degrees();

                self.sample(t, position, velocity, EulerDegrees::new(roll, 0.0, heading))
            })
            .collect()
    }

    /// Stationary platform (ground site, hovering target).
    pub fn stationary(
        &mut self,
        position: Vector3<f64>,
        heading_deg: f64,
        window: TrackWindow,
    ) -> Vec<StateSample> {
        window
            .timestamps()
            .into_iter()
            .map(|t| {
                self.sample(
                    t,
                    position,
                    Vector3::zeros(),
                    EulerDegrees::new(0.0, 0.0, heading_deg),
                )
            })
            .collect()
    }
}
