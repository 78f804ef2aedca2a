//! Processor module: the per-file pipeline and the runs that drive it.
//!
//! `MediaProcessor` takes one file with a resolved identification through:
//! - Conversion, when the converter accepts the source
//! - Tagging, with metadata first and filename-derived tags as a fallback
//! - Replication to the configured library folders
//! - Post-processing scripts
//!
//! `BatchRunner` resolves identifications and feeds files to the processor,
//! either a single file or every file under a directory. Files are handled
//! strictly one after another.
//!
//! # Example
//!
//! ```ignore
//! use reeltag_core::processor::{BatchRunner, MediaProcessor, ProcessorConfig, RunOptions};
//!
//! let processor = MediaProcessor::new(config, converter, tag_writers, fallback, placer);
//! let mut runner = BatchRunner::new(resolver, processor);
//!
//! let report = runner.run_directory(Path::new("/downloads"), &RunOptions::default()).await;
//! println!("{} processed, {} failed", report.processed, report.failed);
//! ```

mod batch;
mod config;
mod pipeline;
mod types;

pub use batch::{relative_dir, BatchRunner};
pub use config::ProcessorConfig;
pub use pipeline::{MediaProcessor, ProcessError};
pub use types::{BatchReport, FileOutcome, RunOptions, TagOutcome};
