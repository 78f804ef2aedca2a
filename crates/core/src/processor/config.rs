//! Configuration for the processor module.

use crate::config::Settings;

/// Per-file processing switches, taken from [`Settings`] once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Embed artwork when tagging.
    pub artwork: bool,
    /// Prefer episode stills for TV artwork.
    pub thumbnail: bool,
    /// Run post-processing scripts.
    pub post_process: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            artwork: true,
            thumbnail: false,
            post_process: false,
        }
    }
}

impl ProcessorConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            artwork: settings.tagging.artwork,
            thumbnail: settings.tagging.thumbnail,
            post_process: settings.post_process.enabled,
        }
    }

    /// Enables post-processing.
    pub fn with_post_process(mut self, enabled: bool) -> Self {
        self.post_process = enabled;
        self
    }
}
