//! Error types for the placer module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from replicating a finished file.
#[derive(Debug, Error)]
pub enum PlacerError {
    #[error("Nothing to replicate, {path} does not exist")]
    SourceNotFound { path: PathBuf },

    #[error("Cannot create destination directory {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Copy of {source} to {destination} failed")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Move of {source} to {destination} failed")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// The copy on disk differs from the original.
    #[error("Copy at {path} is corrupt: sha256 {actual}, expected {expected}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlacerError {
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}
