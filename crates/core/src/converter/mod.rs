//! Converter module for remuxing and transcoding video files.
//!
//! The `Converter` trait is the seam between the processor and the tool doing
//! the work. `FfmpegConverter` copies streams that already fit the output
//! container and re-encodes the rest.
//!
//! # Example
//!
//! ```ignore
//! use reeltag_core::converter::{Converter, ConverterConfig, FfmpegConverter};
//!
//! let converter = FfmpegConverter::new(ConverterConfig::default());
//! converter.validate().await?;
//!
//! if converter.is_valid_source(path).await {
//!     if let Some(output) = converter.convert(path).await? {
//!         println!("{} ({}x{})", output.output_path.display(), output.width, output.height);
//!     }
//! }
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{extension_of, is_tag_eligible, ConversionOutput, MediaInfo, TAG_ELIGIBLE_EXTENSIONS};
