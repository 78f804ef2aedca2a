//! Single-file and directory runs.

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::identify::{ResolveRequest, Resolver};

use super::pipeline::{MediaProcessor, ProcessError};
use super::types::{BatchReport, FileOutcome, RunOptions};

/// Resolves and processes files one at a time.
pub struct BatchRunner {
    resolver: Resolver,
    processor: MediaProcessor,
}

impl BatchRunner {
    pub fn new(resolver: Resolver, processor: MediaProcessor) -> Self {
        Self {
            resolver,
            processor,
        }
    }

    /// Process a single file.
    ///
    /// A complete set of explicit IDs is used as is, without guessing.
    pub async fn run_file(
        &mut self,
        path: &Path,
        options: &RunOptions,
    ) -> Result<FileOutcome, ProcessError> {
        if !self.processor.is_valid_source(path).await {
            info!(path = %path.display(), "File is not in the correct format");
            return Ok(FileOutcome::InvalidSource);
        }

        let request = ResolveRequest::new(Some(path), options.mode)
            .with_tagging(options.tagging_enabled)
            .with_explicit(options.explicit.identification())
            .with_tvdb_hint(options.explicit.tvdb_id);
        let identification = self.resolver.resolve(request).await;

        self.processor
            .process_valid_source(path, &identification, None)
            .await
    }

    /// Process every convertible file under `root`.
    ///
    /// Files are visited in name order. Explicit IDs only contribute the
    /// TVDB series hint, since one episode identification cannot fit every
    /// file. A failure on one file is logged and counted, and the walk goes
    /// on.
    pub async fn run_directory(&mut self, root: &Path, options: &RunOptions) -> BatchReport {
        let mut report = BatchReport::default();

        let entries = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Unable to read directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !self.processor.is_valid_source(path).await {
                debug!(path = %path.display(), "Not a convertible source");
                report.skipped += 1;
                continue;
            }

            info!(path = %path.display(), "Processing file");
            let request = ResolveRequest::new(Some(path), options.mode)
                .with_tagging(options.tagging_enabled)
                .with_tvdb_hint(options.explicit.tvdb_id);
            let identification = self.resolver.resolve(request).await;

            let relative = if options.preserve_relative {
                relative_dir(root, path)
            } else {
                None
            };

            match self
                .processor
                .process_valid_source(path, &identification, relative.as_deref())
                .await
            {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Error processing file");
                    report.failed += 1;
                }
            }
        }

        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Directory run finished"
        );
        report
    }
}

/// The directory of `path` relative to `root`, `None` for files at the top.
pub fn relative_dir(root: &Path, path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?.strip_prefix(root).ok()?;
    if parent.as_os_str().is_empty() {
        None
    } else {
        Some(parent.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::{CandidateMatcher, ExplicitIds, FilenameGuesser, Mode, ScriptedPrompter};
    use crate::processor::{ProcessorConfig, TagOutcome};
    use crate::tagger::{FallbackTagger, RetryPolicy};
    use crate::testing::{
        MockConverter, MockExternalCatalog, MockPlacer, MockTagStore, MockTagWriterFactory,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn runner(
        converter: Arc<MockConverter>,
        placer: Arc<MockPlacer>,
        answers: &[&str],
    ) -> BatchRunner {
        let resolver = Resolver::new(
            FilenameGuesser::heuristic(false),
            CandidateMatcher::new(Arc::new(MockExternalCatalog::new())),
            Box::new(ScriptedPrompter::new(answers.iter().copied())),
        );
        let processor = MediaProcessor::new(
            ProcessorConfig::default(),
            converter,
            Arc::new(MockTagWriterFactory::new()),
            FallbackTagger::new(
                Arc::new(MockTagStore::new()),
                RetryPolicy {
                    max_attempts: 1,
                    delay: Duration::ZERO,
                },
            ),
            placer,
        );
        BatchRunner::new(resolver, processor)
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, b"data").unwrap();
        path
    }

    #[test]
    fn test_relative_dir() {
        let root = Path::new("/media/in");
        assert_eq!(
            relative_dir(root, Path::new("/media/in/Show/Season 1/a.mkv")),
            Some(PathBuf::from("Show/Season 1"))
        );
        assert_eq!(relative_dir(root, Path::new("/media/in/a.mkv")), None);
        assert_eq!(relative_dir(root, Path::new("/elsewhere/a.mkv")), None);
    }

    #[tokio::test]
    async fn test_run_file_with_explicit_ids() {
        let converter = Arc::new(MockConverter::new());
        let placer = Arc::new(MockPlacer::new());
        let mut runner = runner(converter.clone(), placer, &[]);

        let options = RunOptions {
            mode: Mode::Interactive,
            explicit: ExplicitIds {
                tvdb_id: Some(81189),
                season: Some(2),
                episode: Some(5),
                ..Default::default()
            },
            ..Default::default()
        };
        let outcome = runner
            .run_file(Path::new("/in/Breaking Bad - S02E05 - Breakage.mkv"), &options)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            FileOutcome::Completed {
                tagging: TagOutcome::Tagged,
                ..
            }
        ));
        assert_eq!(converter.validated().await.len(), 1);
    }

    #[tokio::test]
    async fn test_run_file_invalid_source_asks_nothing() {
        let converter = Arc::new(MockConverter::new());
        converter.reject_extension("nfo").await;
        let mut runner = runner(converter.clone(), Arc::new(MockPlacer::new()), &[]);

        let outcome = runner
            .run_file(Path::new("/in/info.nfo"), &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(outcome, FileOutcome::InvalidSource);
        assert!(converter.converted().await.is_empty());
    }

    #[tokio::test]
    async fn test_directory_walk_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.mkv");
        touch(dir.path(), "b.mkv");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "sub/c.mkv");

        let converter = Arc::new(MockConverter::new());
        converter.reject_extension("txt").await;
        converter.fail_for("a.mkv").await;
        let placer = Arc::new(MockPlacer::new());
        let mut runner = runner(converter.clone(), placer.clone(), &[]);

        let options = RunOptions {
            mode: Mode::Silent,
            preserve_relative: true,
            ..Default::default()
        };
        let report = runner.run_directory(dir.path(), &options).await;

        assert_eq!(
            report,
            BatchReport {
                processed: 2,
                skipped: 1,
                failed: 1
            }
        );
        let names: Vec<String> = converter
            .converted()
            .await
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mkv", "b.mkv", "c.mkv"]);
        assert_eq!(converter.validated().await.len(), 4);

        let placements = placer.recorded_placements().await;
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].relative, None);
        assert_eq!(placements[1].relative, Some(PathBuf::from("sub")));
    }

    #[tokio::test]
    async fn test_directory_walk_survives_placement_error() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.mkv");
        touch(dir.path(), "b.mkv");

        let placer = Arc::new(MockPlacer::new());
        placer
            .set_next_error(crate::placer::PlacerError::SourceNotFound {
                path: dir.path().join("a.mp4"),
            })
            .await;
        let mut runner = runner(Arc::new(MockConverter::new()), placer.clone(), &[]);

        let options = RunOptions {
            mode: Mode::Silent,
            ..Default::default()
        };
        let report = runner.run_directory(dir.path(), &options).await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 1);
        assert_eq!(placer.recorded_placements().await.len(), 2);
    }

    #[tokio::test]
    async fn test_directory_walk_operator_skip() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "home video.mkv");

        let converter = Arc::new(MockConverter::new());
        let mut runner = runner(converter.clone(), Arc::new(MockPlacer::new()), &["5"]);

        let report = runner
            .run_directory(dir.path(), &RunOptions::default())
            .await;
        assert_eq!(report.skipped, 1);
        assert!(converter.converted().await.is_empty());
    }
}
