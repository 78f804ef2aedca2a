//! Mock placer for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::placer::{Placer, PlacerError};

/// A recorded replication for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPlacement {
    pub file: PathBuf,
    pub relative: Option<PathBuf>,
}

/// Mock implementation of the Placer trait.
///
/// Leaves files where they are and reports the original path, unless a
/// destination directory is set.
#[derive(Debug)]
pub struct MockPlacer {
    placements: Arc<RwLock<Vec<RecordedPlacement>>>,
    /// Reported destination directory.
    destination: Arc<RwLock<Option<PathBuf>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<PlacerError>>>,
}

impl Default for MockPlacer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlacer {
    /// Create a new mock placer.
    pub fn new() -> Self {
        Self {
            placements: Arc::new(RwLock::new(Vec::new())),
            destination: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Get all recorded placements.
    pub async fn recorded_placements(&self) -> Vec<RecordedPlacement> {
        self.placements.read().await.clone()
    }

    /// Report files as moved into `dir`.
    pub async fn set_destination(&self, dir: PathBuf) {
        *self.destination.write().await = Some(dir);
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: PlacerError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn replicate(
        &self,
        file: &Path,
        relative: Option<&Path>,
    ) -> Result<Vec<PathBuf>, PlacerError> {
        self.placements.write().await.push(RecordedPlacement {
            file: file.to_path_buf(),
            relative: relative.map(Path::to_path_buf),
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let placed = match (self.destination.read().await.as_ref(), file.file_name()) {
            (Some(dir), Some(name)) => {
                let mut target = dir.clone();
                if let Some(relative) = relative {
                    target.push(relative);
                }
                target.join(name)
            }
            _ => file.to_path_buf(),
        };
        Ok(vec![placed])
    }
}
