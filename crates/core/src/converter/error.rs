//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("ffmpeg executable missing: {path}")]
    FfmpegNotFound { path: PathBuf },

    #[error("ffprobe executable missing: {path}")]
    FfprobeNotFound { path: PathBuf },

    #[error("Source file missing: {path}")]
    InputNotFound { path: PathBuf },

    /// The configured output directory could not be created.
    #[error("Cannot create output directory {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// ffmpeg exited unsuccessfully. `stderr` holds its tail when captured.
    #[error("ffmpeg failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    #[error("ffmpeg still running after {timeout_secs}s, killed")]
    Timeout { timeout_secs: u64 },

    #[error("ffprobe failed: {reason}")]
    ProbeFailed { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ffprobe ran but its JSON could not be read.
    #[error("Unreadable ffprobe output: {reason}")]
    ParseError { reason: String },
}

impl ConverterError {
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Whether ffmpeg or ffprobe is missing, as opposed to a bad source.
    pub fn is_missing_tool(&self) -> bool {
        matches!(
            self,
            Self::FfmpegNotFound { .. } | Self::FfprobeNotFound { .. }
        )
    }
}
