//! Errors for scene loading, scenario selection and export.

use thiserror::Error;
use vector_space_core::CoreError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scene file parsed but is semantically unusable
    #[error("Invalid scene config: {0}")]
    InvalidConfig(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}

impl SimError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
