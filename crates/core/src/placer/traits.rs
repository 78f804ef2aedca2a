//! Trait definitions for the placer module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::PlacerError;

/// Replicates a finished file to its configured destinations.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Copy and/or move `file`, appending `relative` to each destination.
    ///
    /// Returns every path the file now exists at, primary location first.
    async fn replicate(
        &self,
        file: &Path,
        relative: Option<&Path>,
    ) -> Result<Vec<PathBuf>, PlacerError>;
}
