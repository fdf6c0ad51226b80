// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestingError {
    #[error("scenario not found for '{name}' in resources/scenarios")]
    ScenarioNotFound { name: String },
    #[error("invalid scenario '{name}': {reason}")]
    ScenarioInvalid { name: String, reason: String },
    #[error("scenario io error for {path:?}: {reason}")]
    ScenarioIo { path: PathBuf, reason: String },
    #[error("invalid platform config: {reason}")]
    PlatformInvalid { reason: String },
    #[error("scenario '{name}' failed at step {step}: {detail}")]
    StepFailed {
        name: String,
        step: usize,
        detail: String,
    },
}

pub type Result<T> = std::result::Result<T, TestingError>;
