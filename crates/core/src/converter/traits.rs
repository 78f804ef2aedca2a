//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::{ConversionOutput, MediaInfo};

/// A converter that turns source files into the configured output container.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Whether `path` is a source this converter will accept.
    async fn is_valid_source(&self, path: &Path) -> bool;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError>;

    /// Converts one source file.
    ///
    /// `Ok(None)` means the converter ran but produced nothing usable.
    async fn convert(&self, input: &Path) -> Result<Option<ConversionOutput>, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
