//! Configuration for the placer module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where finished files are replicated to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Directory finished files are moved into.
    #[serde(default)]
    pub move_to: Option<PathBuf>,

    /// Directories finished files are copied into before the move.
    #[serde(default)]
    pub copy_to: Vec<PathBuf>,

    /// Whether to verify checksums after copying.
    #[serde(default)]
    pub verify_checksums: bool,

    /// Buffer size for file copies in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    8 * 1024 * 1024 // 8 MB
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            move_to: None,
            copy_to: Vec::new(),
            verify_checksums: false,
            buffer_size: default_buffer_size(),
        }
    }
}

impl PlacerConfig {
    /// Sets the move destination.
    pub fn with_move_to(mut self, dir: PathBuf) -> Self {
        self.move_to = Some(dir);
        self
    }

    /// Adds a copy destination.
    pub fn with_copy_to(mut self, dir: PathBuf) -> Self {
        self.copy_to.push(dir);
        self
    }

    /// Enables checksum verification.
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Sets the buffer size for copies.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Whether any destination is configured.
    pub fn is_active(&self) -> bool {
        self.move_to.is_some() || !self.copy_to.is_empty()
    }
}
