//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output extensions whose containers carry MP4 metadata atoms.
pub const TAG_ELIGIBLE_EXTENSIONS: [&str; 2] = ["mp4", "m4v"];

/// Whether files with this extension can be tagged.
pub fn is_tag_eligible(extension: &str) -> bool {
    TAG_ELIGIBLE_EXTENSIONS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(extension))
}

/// Information about a media file from ffprobe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
    /// First entry of ffprobe's `format_name`.
    pub format: String,
    pub video_codec: Option<String>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    /// Codec of each audio stream, in stream order.
    pub audio_codecs: Vec<String>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }
}

/// A converted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub output_path: PathBuf,
    /// Lower-case extension without the dot.
    pub output_extension: String,
    pub width: u32,
    pub height: u32,
}

impl ConversionOutput {
    /// Describe `path`, taking the extension from its name.
    pub fn new(output_path: PathBuf, width: u32, height: u32) -> Self {
        let output_extension = extension_of(&output_path);
        Self {
            output_path,
            output_extension,
            width,
            height,
        }
    }

    /// Whether the output can carry tags.
    pub fn is_tag_eligible(&self) -> bool {
        is_tag_eligible(&self.output_extension)
    }
}

/// Lower-case extension of `path`, empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
