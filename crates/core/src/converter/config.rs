//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Directory converted files are written to. Next to the source when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Extension of converted files.
    #[serde(default = "default_output_extension")]
    pub output_extension: String,

    /// Source extensions accepted for conversion.
    #[serde(default = "default_input_extensions")]
    pub input_extensions: Vec<String>,

    /// Also process sources that already have the output extension.
    #[serde(default)]
    pub process_same_extension: bool,

    /// Remove the source after a successful conversion.
    #[serde(default = "default_true")]
    pub delete_original: bool,

    /// Move the moov atom to the front of the file (`+faststart`).
    #[serde(default = "default_true")]
    pub relocate_moov: bool,

    /// Encoder used when the video stream cannot be copied.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Source video codecs that are copied as-is.
    #[serde(default = "default_video_copy_codecs")]
    pub video_copy_codecs: Vec<String>,

    /// Constant rate factor for re-encoded video.
    #[serde(default)]
    pub video_crf: Option<u8>,

    /// Source audio codecs that are copied as-is.
    #[serde(default = "default_audio_copy_codecs")]
    pub audio_copy_codecs: Vec<String>,

    /// Bitrate for re-encoded AAC audio.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// Timeout for a single conversion in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Additional ffmpeg output arguments.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_output_extension() -> String {
    "mp4".to_string()
}

fn default_input_extensions() -> Vec<String> {
    ["mkv", "avi", "mp4", "m4v", "mov", "wmv", "ts", "m2ts", "mpg", "mpeg", "flv", "webm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_video_copy_codecs() -> Vec<String> {
    vec!["h264".to_string()]
}

fn default_audio_copy_codecs() -> Vec<String> {
    vec!["aac".to_string()]
}

fn default_audio_bitrate() -> u32 {
    256
}

fn default_timeout() -> u64 {
    4 * 3600
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            output_dir: None,
            output_extension: default_output_extension(),
            input_extensions: default_input_extensions(),
            process_same_extension: false,
            delete_original: true,
            relocate_moov: true,
            video_codec: default_video_codec(),
            video_copy_codecs: default_video_copy_codecs(),
            video_crf: None,
            audio_copy_codecs: default_audio_copy_codecs(),
            audio_bitrate_kbps: default_audio_bitrate(),
            timeout_secs: default_timeout(),
            ffmpeg_log_level: default_log_level(),
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl ConverterConfig {
    /// Creates a new config with custom ffmpeg/ffprobe paths.
    pub fn with_paths(ffmpeg_path: PathBuf, ffprobe_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            ..Default::default()
        }
    }

    /// Sets the output directory.
    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = Some(output_dir);
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Whether `extension` is an accepted source extension.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        if extension == self.output_extension.to_lowercase() && !self.process_same_extension {
            return false;
        }
        self.input_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(&extension))
    }
}
