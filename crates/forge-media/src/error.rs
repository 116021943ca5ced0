//! Error types for subprocess and assembly operations.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::process::ProcessPhase;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during subprocess work and slideshow assembly.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("process failed: {message}")]
    ProcessFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("process {phase} phase timed out after {limit:?}")]
    Timeout {
        phase: ProcessPhase,
        limit: Duration,
    },

    #[error("output file missing: {0}")]
    OutputMissing(PathBuf),

    #[error("output file too small: {path} is {size} bytes, need at least {min}")]
    OutputTooSmall {
        path: PathBuf,
        size: u64,
        min: u64,
    },

    #[error("no usable frames after normalization")]
    NoUsableFrames,

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a process failure error.
    pub fn process_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ProcessFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True when the error is a deadline expiry rather than a process failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, MediaError::Timeout { .. })
    }

    /// Captured stderr, if the failure retained any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            MediaError::ProcessFailed { stderr, .. } => stderr.as_deref(),
            _ => None,
        }
    }
}
