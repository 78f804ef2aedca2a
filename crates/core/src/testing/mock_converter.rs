//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::converter::{extension_of, ConversionOutput, Converter, ConverterError, MediaInfo};

/// Mock implementation of the Converter trait.
///
/// Never touches the filesystem. By default every path is a valid source
/// and converts to the same path with an `mp4` extension at 1920x1080.
///
/// # Example
///
/// ```rust,ignore
/// use reeltag_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.reject_extension("txt").await;
/// converter.fail_for("broken.mkv").await;
///
/// let output = converter.convert(Path::new("/in/movie.mkv")).await?;
/// assert_eq!(converter.converted().await.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockConverter {
    /// Inputs passed to `convert`, in order.
    conversions: Arc<RwLock<Vec<PathBuf>>>,
    /// Paths passed to `is_valid_source`, in order.
    validations: Arc<RwLock<Vec<PathBuf>>>,
    /// Extensions that are not valid sources.
    rejected_extensions: Arc<RwLock<HashSet<String>>>,
    /// File names whose conversion errors.
    failing: Arc<RwLock<HashSet<String>>>,
    /// File names whose conversion produces nothing.
    empty: Arc<RwLock<HashSet<String>>>,
    output_extension: Arc<RwLock<String>>,
    resolution: Arc<RwLock<(u32, u32)>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            validations: Arc::new(RwLock::new(Vec::new())),
            rejected_extensions: Arc::new(RwLock::new(HashSet::new())),
            failing: Arc::new(RwLock::new(HashSet::new())),
            empty: Arc::new(RwLock::new(HashSet::new())),
            output_extension: Arc::new(RwLock::new("mp4".to_string())),
            resolution: Arc::new(RwLock::new((1920, 1080))),
        }
    }

    /// Get every converted input, in order.
    pub async fn converted(&self) -> Vec<PathBuf> {
        self.conversions.read().await.clone()
    }

    /// Get every path checked with `is_valid_source`, in order.
    pub async fn validated(&self) -> Vec<PathBuf> {
        self.validations.read().await.clone()
    }

    /// Treat files with this extension as invalid sources.
    pub async fn reject_extension(&self, extension: &str) {
        self.rejected_extensions
            .write()
            .await
            .insert(extension.to_lowercase());
    }

    /// Make conversion of `file_name` fail.
    pub async fn fail_for(&self, file_name: &str) {
        self.failing.write().await.insert(file_name.to_string());
    }

    /// Make conversion of `file_name` produce no output.
    pub async fn produce_nothing_for(&self, file_name: &str) {
        self.empty.write().await.insert(file_name.to_string());
    }

    /// Set the extension of produced outputs.
    pub async fn set_output_extension(&self, extension: &str) {
        *self.output_extension.write().await = extension.to_string();
    }

    /// Set the resolution reported for outputs.
    pub async fn set_resolution(&self, width: u32, height: u32) {
        *self.resolution.write().await = (width, height);
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn is_valid_source(&self, path: &Path) -> bool {
        self.validations.write().await.push(path.to_path_buf());
        !self
            .rejected_extensions
            .read()
            .await
            .contains(&extension_of(path))
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        let (width, height) = *self.resolution.read().await;
        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 100 * 1024 * 1024,
            duration_secs: 2700.0,
            format: extension_of(path),
            video_codec: Some("h264".to_string()),
            video_width: Some(width),
            video_height: Some(height),
            audio_codecs: vec!["aac".to_string()],
        })
    }

    async fn convert(&self, input: &Path) -> Result<Option<ConversionOutput>, ConverterError> {
        self.conversions.write().await.push(input.to_path_buf());

        let name = Self::file_name(input);
        if self.failing.read().await.contains(&name) {
            return Err(ConverterError::conversion_failed(
                format!("mock failure for {}", name),
                None,
            ));
        }
        if self.empty.read().await.contains(&name) {
            return Ok(None);
        }

        let extension = self.output_extension.read().await.clone();
        let (width, height) = *self.resolution.read().await;
        Ok(Some(ConversionOutput::new(
            input.with_extension(extension),
            width,
            height,
        )))
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
