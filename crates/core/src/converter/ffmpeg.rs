//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{extension_of, ConversionOutput, MediaInfo};

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Where the converted version of `input` is written.
    ///
    /// When that is the input itself, a sibling work file is used and
    /// swapped in after conversion.
    fn output_path_for(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        dir.join(format!("{}.{}", stem, self.config.output_extension))
    }

    fn work_path_for(output: &Path) -> PathBuf {
        let mut name = output
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_default();
        name.push(".converting.");
        name.push(output.extension().unwrap_or_default());
        output.with_file_name(name)
    }

    /// Builds ffmpeg arguments for one conversion.
    fn build_args(&self, input: &Path, output: &Path, info: &MediaInfo) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "0:a?".to_string(),
            "-sn".to_string(),
        ];

        // Video
        let copy_video = info
            .video_codec
            .as_ref()
            .map(|codec| self.config.video_copy_codecs.iter().any(|c| c == codec))
            .unwrap_or(false);
        if copy_video {
            args.extend(["-c:v".to_string(), "copy".to_string()]);
        } else {
            args.extend(["-c:v".to_string(), self.config.video_codec.clone()]);
            if let Some(crf) = self.config.video_crf {
                args.extend(["-crf".to_string(), crf.to_string()]);
            }
        }

        // Audio, per stream
        for (index, codec) in info.audio_codecs.iter().enumerate() {
            if self.config.audio_copy_codecs.iter().any(|c| c == codec) {
                args.extend([format!("-c:a:{}", index), "copy".to_string()]);
            } else {
                args.extend([
                    format!("-c:a:{}", index),
                    "aac".to_string(),
                    format!("-b:a:{}", index),
                    format!("{}k", self.config.audio_bitrate_kbps),
                ]);
            }
        }

        if self.config.relocate_moov {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        args.push(output.to_string_lossy().to_string());

        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ConverterError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            disposition: Option<ProbeDisposition>,
        }

        #[derive(Deserialize)]
        struct ProbeDisposition {
            #[serde(default)]
            attached_pic: u8,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ConverterError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_ref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        // Cover images show up as video streams; skip them
        let video_stream = probe.streams.iter().find(|s| {
            s.codec_type == "video"
                && s.disposition
                    .as_ref()
                    .map(|d| d.attached_pic == 0)
                    .unwrap_or(true)
        });

        let audio_codecs = probe
            .streams
            .iter()
            .filter(|s| s.codec_type == "audio")
            .map(|s| s.codec_name.clone().unwrap_or_default())
            .collect();

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            audio_codecs,
        })
    }

    /// Remove whatever a failed ffmpeg run left at `target`.
    async fn discard_partial(target: &Path) {
        match tokio::fs::remove_file(target).await {
            Ok(()) => debug!(output = %target.display(), "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(output = %target.display(), error = %e, "Could not remove partial output"),
        }
    }

    /// Runs ffmpeg with a timeout, returning captured error lines on failure.
    async fn run_ffmpeg(&self, args: &[String]) -> Result<(), ConverterError> {
        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConverterError::conversion_failed("stderr not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut error_output = String::new();
            while let Ok(Some(line)) = reader.next_line().await {
                debug!(line = %line, "ffmpeg");
                error_output.push_str(&line);
                error_output.push('\n');
            }
            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(ConverterError::conversion_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
                Ok(())
            }
            Ok(Err(e)) => Err(ConverterError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        }
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn is_valid_source(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        if !self.config.accepts_extension(&extension_of(path)) {
            debug!(path = %path.display(), "Extension not accepted for conversion");
            return false;
        }
        match self.probe(path).await {
            Ok(info) => info.has_video(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Probe failed, not a valid source");
                false
            }
        }
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn convert(&self, input: &Path) -> Result<Option<ConversionOutput>, ConverterError> {
        let start = Instant::now();
        let info = self.probe(input).await?;

        let output_path = self.output_path_for(input);
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                ConverterError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let in_place = output_path == input;
        let target = if in_place {
            Self::work_path_for(&output_path)
        } else {
            output_path.clone()
        };

        info!(
            input = %input.display(),
            output = %output_path.display(),
            "Converting"
        );
        let args = self.build_args(input, &target, &info);
        if let Err(e) = self.run_ffmpeg(&args).await {
            Self::discard_partial(&target).await;
            return Err(e);
        }

        if tokio::fs::metadata(&target).await.is_err() {
            warn!(output = %target.display(), "FFmpeg finished without writing output");
            return Ok(None);
        }

        if in_place {
            tokio::fs::rename(&target, &output_path).await?;
        } else if self.config.delete_original {
            match tokio::fs::remove_file(input).await {
                Ok(()) => debug!(path = %input.display(), "Deleted original"),
                Err(e) => warn!(path = %input.display(), error = %e, "Failed to delete original"),
            }
        }

        let (width, height) = match self.probe(&output_path).await {
            Ok(out) => (out.video_width.unwrap_or(0), out.video_height.unwrap_or(0)),
            Err(e) => {
                warn!(output = %output_path.display(), error = %e, "Could not probe output");
                (0, 0)
            }
        };

        info!(
            output = %output_path.display(),
            width,
            height,
            duration_ms = start.elapsed().as_millis() as u64,
            "Conversion complete"
        );
        Ok(Some(ConversionOutput::new(output_path, width, height)))
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        let ffmpeg_result = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffmpeg_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(ConverterError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(ConverterError::Io(e));
        }

        if let Some(dir) = &self.config.output_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        Ok(())
    }
}
