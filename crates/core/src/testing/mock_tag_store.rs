//! Mock tag store for testing.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::tagger::{TagSet, TagStore, TagStoreError};

#[derive(Debug, Default)]
struct StoreState {
    saved: Vec<(PathBuf, TagSet)>,
    save_errors: VecDeque<TagStoreError>,
    save_attempts: usize,
    delete_count: usize,
}

/// Mock implementation of the TagStore trait.
///
/// Keeps written tag sets in memory. Queued save errors are returned one
/// per save attempt before saves start succeeding.
#[derive(Debug, Default)]
pub struct MockTagStore {
    state: Mutex<StoreState>,
}

impl MockTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fail the next save attempt with `error`.
    pub fn push_save_error(&self, error: TagStoreError) {
        self.state().save_errors.push_back(error);
    }

    /// Number of save attempts, failed ones included.
    pub fn save_attempts(&self) -> usize {
        self.state().save_attempts
    }

    /// Every successful save, in order.
    pub fn saved(&self) -> Vec<(PathBuf, TagSet)> {
        self.state().saved.clone()
    }

    pub fn delete_count(&self) -> usize {
        self.state().delete_count
    }
}

impl TagStore for MockTagStore {
    fn read(&self, path: &Path) -> Result<usize, TagStoreError> {
        Ok(self
            .state()
            .saved
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, tags)| tags.len())
            .unwrap_or(0))
    }

    fn delete_all(&self, _path: &Path) -> Result<(), TagStoreError> {
        self.state().delete_count += 1;
        Ok(())
    }

    fn save(&self, path: &Path, tags: &TagSet) -> Result<(), TagStoreError> {
        let mut state = self.state();
        state.save_attempts += 1;
        if let Some(err) = state.save_errors.pop_front() {
            return Err(err);
        }
        state.saved.push((path.to_path_buf(), tags.clone()));
        Ok(())
    }
}
