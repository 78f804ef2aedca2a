//! Mock post-processor for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::identify::Identification;
use crate::post_process::{PostProcessError, PostProcessReport, PostProcessor};

/// Mock implementation of the PostProcessor trait. Records every run.
#[derive(Debug, Default)]
pub struct MockPostProcessor {
    runs: Arc<RwLock<Vec<(Vec<PathBuf>, Identification)>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockPostProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every run fail.
    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    pub async fn recorded_runs(&self) -> Vec<(Vec<PathBuf>, Identification)> {
        self.runs.read().await.clone()
    }
}

#[async_trait]
impl PostProcessor for MockPostProcessor {
    async fn run(
        &self,
        files: &[PathBuf],
        identification: &Identification,
    ) -> Result<PostProcessReport, PostProcessError> {
        self.runs
            .write()
            .await
            .push((files.to_vec(), identification.clone()));

        if *self.fail.read().await {
            return Err(PostProcessError::ScriptsDir {
                path: PathBuf::from("/mock/scripts"),
                source: std::io::Error::other("mock failure"),
            });
        }
        Ok(PostProcessReport::default())
    }
}
