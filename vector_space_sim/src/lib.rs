//! Vector Space headless playback harness
//!
//! Drives a [`vector_space_core::Scene`] frame by frame without a renderer:
//! - **Scenes** come from JSON scene files or seeded synthetic scenarios
//! - **Playback** resolves every frame through `Scene::snapshot` and collects metrics
//! - **Export** writes FOV meshes and per-frame poses/detections as JSON
//!
//! # Usage
//!
//! ```ignore
//! use vector_space_sim::{PlaybackRunner, scenarios::ScenarioId};
//!
//! let runner = PlaybackRunner::new(42).with_step_ms(100);
//! let result = runner.run(ScenarioId::BankedTurn, None)?;
//! assert!(result.passed);
//! ```

pub mod config;
mod error;
mod exporter;
mod generator;
mod runner;
pub mod scenarios;

pub use config::{PlaybackConfig, SceneFile};
pub use error::{SimError, SimResult};
pub use exporter::{DetectionLine, ExportFrame, FrameExport, PoseRecord, SensorGeometry};
pub use generator::{Orbit, TrackGenerator, TrackWindow};
pub use runner::{frame_times, PlaybackMetrics, PlaybackResult, PlaybackRunner};
