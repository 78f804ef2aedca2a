//! Types for the processor module.

use serde::Serialize;
use std::path::PathBuf;

use crate::converter::ConversionOutput;
use crate::identify::{ExplicitIds, Mode};

/// How tagging of a converted file went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum TagOutcome {
    /// No tagging: untagged identification or an output that cannot carry tags.
    NotAttempted,
    /// The metadata writer succeeded.
    Tagged,
    /// The metadata writer failed and filename-derived tags were written.
    FallbackTagged,
    /// Both writers failed.
    FallbackFailed(String),
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Skipped,
    InvalidSource,
    ConversionFailed {
        reason: String,
    },
    Completed {
        output: ConversionOutput,
        tagging: TagOutcome,
        /// Where the output ended up, primary location first.
        placed: Vec<PathBuf>,
    },
}

/// Counts from a directory run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Files converted (whatever happened with their tags).
    pub processed: usize,
    /// Files skipped by the operator or not convertible.
    pub skipped: usize,
    /// Files whose conversion or placement failed.
    pub failed: usize,
}

impl BatchReport {
    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Completed { .. } => self.processed += 1,
            FileOutcome::Skipped | FileOutcome::InvalidSource => self.skipped += 1,
            FileOutcome::ConversionFailed { .. } => self.failed += 1,
        }
    }
}

/// Options for a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub mode: Mode,
    pub tagging_enabled: bool,
    pub explicit: ExplicitIds,
    /// Pass each file's directory relative to the walk root to placement.
    pub preserve_relative: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Interactive,
            tagging_enabled: true,
            explicit: ExplicitIds::default(),
            preserve_relative: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = BatchReport::default();
        report.record(&FileOutcome::Skipped);
        report.record(&FileOutcome::InvalidSource);
        report.record(&FileOutcome::ConversionFailed {
            reason: "boom".to_string(),
        });
        report.record(&FileOutcome::Completed {
            output: ConversionOutput::new(PathBuf::from("/out/a.mp4"), 0, 0),
            tagging: TagOutcome::NotAttempted,
            placed: vec![],
        });
        assert_eq!(
            report,
            BatchReport {
                processed: 1,
                skipped: 2,
                failed: 1
            }
        );
    }
}
