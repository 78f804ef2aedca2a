//! Per-file processing: convert, tag, replicate, post-process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::converter::{ConversionOutput, Converter};
use crate::identify::Identification;
use crate::placer::{Placer, PlacerError};
use crate::post_process::PostProcessor;
use crate::tagger::{FallbackTagger, TagError, TagWriterFactory};

use super::config::ProcessorConfig;
use super::types::{FileOutcome, TagOutcome};

/// Error type for per-file processing.
///
/// Conversion and tagging problems are reported through [`FileOutcome`];
/// only faults that leave the file in an unknown place end up here.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Replication failed.
    #[error("Placement failed: {0}")]
    Placement(#[from] PlacerError),
}

/// Runs one identified file through conversion and everything after it.
pub struct MediaProcessor {
    config: ProcessorConfig,
    converter: Arc<dyn Converter>,
    tag_writers: Arc<dyn TagWriterFactory>,
    fallback: FallbackTagger,
    placer: Arc<dyn Placer>,
    post_processor: Option<Arc<dyn PostProcessor>>,
}

impl MediaProcessor {
    /// Creates a new processor without post-processing.
    pub fn new(
        config: ProcessorConfig,
        converter: Arc<dyn Converter>,
        tag_writers: Arc<dyn TagWriterFactory>,
        fallback: FallbackTagger,
        placer: Arc<dyn Placer>,
    ) -> Self {
        Self {
            config,
            converter,
            tag_writers,
            fallback,
            placer,
            post_processor: None,
        }
    }

    /// Sets the post-processor run after replication.
    pub fn with_post_processor(mut self, post_processor: Arc<dyn PostProcessor>) -> Self {
        self.post_processor = Some(post_processor);
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Whether the converter accepts `path` as a source.
    pub async fn is_valid_source(&self, path: &Path) -> bool {
        self.converter.is_valid_source(path).await
    }

    /// Process one file under an already resolved identification.
    ///
    /// `relative` is handed to replication as the sub-directory to recreate
    /// under each destination.
    pub async fn process_file(
        &self,
        input: &Path,
        identification: &Identification,
        relative: Option<&Path>,
    ) -> Result<FileOutcome, ProcessError> {
        if *identification != Identification::Skip && !self.converter.is_valid_source(input).await
        {
            info!(path = %input.display(), "File is not in the correct format");
            return Ok(FileOutcome::InvalidSource);
        }

        self.process_valid_source(input, identification, relative)
            .await
    }

    /// [`Self::process_file`] for an input already accepted by
    /// [`Self::is_valid_source`].
    pub(crate) async fn process_valid_source(
        &self,
        input: &Path,
        identification: &Identification,
        relative: Option<&Path>,
    ) -> Result<FileOutcome, ProcessError> {
        if *identification == Identification::Skip {
            info!(path = %input.display(), "Skipping file");
            return Ok(FileOutcome::Skipped);
        }

        info!(
            path = %input.display(),
            identification = %identification,
            converter = self.converter.name(),
            "Converting file"
        );
        let output = match self.converter.convert(input).await {
            Ok(Some(output)) => output,
            Ok(None) => {
                error!(path = %input.display(), "Converter produced no output");
                return Ok(FileOutcome::ConversionFailed {
                    reason: "no output produced".to_string(),
                });
            }
            Err(e) => {
                error!(path = %input.display(), error = %e, "Conversion failed");
                return Ok(FileOutcome::ConversionFailed {
                    reason: e.to_string(),
                });
            }
        };

        let tagging = if output.is_tag_eligible() && identification.should_tag() {
            self.tag(&output, identification).await
        } else {
            TagOutcome::NotAttempted
        };

        let placed = self.placer.replicate(&output.output_path, relative).await?;
        info!(files = ?placed, placer = self.placer.name(), "File replicated");

        if self.config.post_process {
            self.post_process(&placed, identification).await;
        }

        Ok(FileOutcome::Completed {
            output,
            tagging,
            placed,
        })
    }

    /// Rich tags first, filename-derived tags when that fails.
    async fn tag(&self, output: &ConversionOutput, identification: &Identification) -> TagOutcome {
        let path = &output.output_path;
        match self.write_rich_tags(output, identification).await {
            Ok(()) => return TagOutcome::Tagged,
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Unable to tag file with metadata, trying tags from the filename"
            ),
        }

        match self.fallback.tag(path, identification).await {
            Ok(_) => TagOutcome::FallbackTagged,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Unable to write manual tags");
                TagOutcome::FallbackFailed(e.to_string())
            }
        }
    }

    async fn write_rich_tags(
        &self,
        output: &ConversionOutput,
        identification: &Identification,
    ) -> Result<(), TagError> {
        let mut writer = self.tag_writers.create(identification).await?;
        writer.set_resolution(output.width, output.height);
        info!(metadata = %writer.describe(), "Tagging file");
        writer
            .write_tags(
                &output.output_path,
                self.config.artwork,
                self.config.thumbnail,
            )
            .await
    }

    async fn post_process(&self, files: &[PathBuf], identification: &Identification) {
        let Some(post_processor) = &self.post_processor else {
            return;
        };
        match post_processor.run(files, identification).await {
            Ok(report) if !report.failed.is_empty() => {
                warn!(failed = ?report.failed, "Some post-processing scripts failed")
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Post-processing failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::{keys, RetryPolicy, TagStoreError};
    use crate::testing::{
        MockConverter, MockPlacer, MockPostProcessor, MockTagStore, MockTagWriterFactory,
    };
    use std::time::Duration;

    struct Harness {
        converter: Arc<MockConverter>,
        writers: Arc<MockTagWriterFactory>,
        store: Arc<MockTagStore>,
        placer: Arc<MockPlacer>,
        post: Arc<MockPostProcessor>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                converter: Arc::new(MockConverter::new()),
                writers: Arc::new(MockTagWriterFactory::new()),
                store: Arc::new(MockTagStore::new()),
                placer: Arc::new(MockPlacer::new()),
                post: Arc::new(MockPostProcessor::new()),
            }
        }

        fn processor(&self, config: ProcessorConfig) -> MediaProcessor {
            let policy = RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_millis(1),
            };
            MediaProcessor::new(
                config,
                self.converter.clone(),
                self.writers.clone(),
                FallbackTagger::new(self.store.clone(), policy),
                self.placer.clone(),
            )
            .with_post_processor(self.post.clone())
        }
    }

    fn episode() -> Identification {
        Identification::TvEpisode {
            tvdb_id: 81189,
            season: 2,
            episode: 5,
        }
    }

    #[tokio::test]
    async fn test_skip_does_nothing() {
        let h = Harness::new();
        let outcome = h
            .processor(ProcessorConfig::default())
            .process_file(Path::new("/in/a.mkv"), &Identification::Skip, None)
            .await
            .unwrap();

        assert_eq!(outcome, FileOutcome::Skipped);
        assert!(h.converter.converted().await.is_empty());
        assert!(h.placer.recorded_placements().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_source() {
        let h = Harness::new();
        h.converter.reject_extension("txt").await;
        let outcome = h
            .processor(ProcessorConfig::default())
            .process_file(Path::new("/in/notes.txt"), &episode(), None)
            .await
            .unwrap();

        assert_eq!(outcome, FileOutcome::InvalidSource);
        assert!(h.converter.converted().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_conversion_is_failure() {
        let h = Harness::new();
        h.converter.produce_nothing_for("a.mkv").await;
        let outcome = h
            .processor(ProcessorConfig::default())
            .process_file(Path::new("/in/a.mkv"), &episode(), None)
            .await
            .unwrap();

        assert!(matches!(outcome, FileOutcome::ConversionFailed { .. }));
        assert!(h.placer.recorded_placements().await.is_empty());
    }

    #[tokio::test]
    async fn test_rich_tags_then_replication_and_post_processing() {
        let h = Harness::new();
        h.converter.set_resolution(1280, 720).await;
        let config = ProcessorConfig::default().with_post_process(true);
        let outcome = h
            .processor(config)
            .process_file(
                Path::new("/in/Breaking Bad - S02E05 - Breakage.mkv"),
                &episode(),
                Some(Path::new("Breaking Bad")),
            )
            .await
            .unwrap();

        let FileOutcome::Completed { tagging, placed, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(tagging, TagOutcome::Tagged);

        let writes = h.writers.recorded_writes().await;
        assert_eq!(writes.len(), 1);
        assert_eq!((writes[0].width, writes[0].height), (1280, 720));
        assert!(writes[0].artwork);
        assert!(h.store.saved().is_empty());

        let placements = h.placer.recorded_placements().await;
        assert_eq!(
            placements[0].file,
            PathBuf::from("/in/Breaking Bad - S02E05 - Breakage.mp4")
        );
        assert_eq!(placements[0].relative, Some(PathBuf::from("Breaking Bad")));

        let runs = h.post.recorded_runs().await;
        assert_eq!(runs, vec![(placed, episode())]);
    }

    #[tokio::test]
    async fn test_rich_failure_falls_back_to_filename() {
        let h = Harness::new();
        h.writers.set_fail_write(true).await;
        let outcome = h
            .processor(ProcessorConfig::default())
            .process_file(
                Path::new("/in/Breaking Bad - S02E05 - Breakage.mkv"),
                &episode(),
                None,
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            FileOutcome::Completed {
                tagging: TagOutcome::FallbackTagged,
                ..
            }
        ));
        let saved = h.store.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].1.text(&keys::SHOW), Some("Breaking Bad"));
        assert!(h.post.recorded_runs().await.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_failure_still_replicates() {
        let h = Harness::new();
        h.writers.set_fail_create(true).await;
        for _ in 0..3 {
            h.store
                .push_save_error(TagStoreError::Io(std::io::Error::other("locked")));
        }
        let outcome = h
            .processor(ProcessorConfig::default())
            .process_file(
                Path::new("/in/Breaking Bad - S02E05 - Breakage.mkv"),
                &episode(),
                None,
            )
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            FileOutcome::Completed {
                tagging: TagOutcome::FallbackFailed(_),
                ..
            }
        ));
        assert_eq!(h.store.save_attempts(), 3);
        assert_eq!(h.placer.recorded_placements().await.len(), 1);
    }

    #[tokio::test]
    async fn test_untagged_and_ineligible_outputs_skip_tagging() {
        let h = Harness::new();
        let outcome = h
            .processor(ProcessorConfig::default())
            .process_file(Path::new("/in/a.mkv"), &Identification::Untagged, None)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            FileOutcome::Completed {
                tagging: TagOutcome::NotAttempted,
                ..
            }
        ));

        h.converter.set_output_extension("mkv").await;
        let outcome = h
            .processor(ProcessorConfig::default())
            .process_file(Path::new("/in/b.avi"), &episode(), None)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            FileOutcome::Completed {
                tagging: TagOutcome::NotAttempted,
                ..
            }
        ));
        assert!(h.writers.recorded_writes().await.is_empty());
        assert_eq!(h.store.save_attempts(), 0);
    }

    #[tokio::test]
    async fn test_placement_error_is_returned() {
        let h = Harness::new();
        h.placer
            .set_next_error(PlacerError::SourceNotFound {
                path: PathBuf::from("/in/a.mp4"),
            })
            .await;
        let result = h
            .processor(ProcessorConfig::default())
            .process_file(Path::new("/in/a.mkv"), &Identification::Untagged, None)
            .await;

        assert!(matches!(result, Err(ProcessError::Placement(_))));
    }

    #[tokio::test]
    async fn test_post_processing_failure_is_not_fatal() {
        let h = Harness::new();
        h.post.set_fail(true).await;
        let config = ProcessorConfig::default().with_post_process(true);
        let outcome = h
            .processor(config)
            .process_file(Path::new("/in/a.mkv"), &Identification::Untagged, None)
            .await
            .unwrap();

        assert!(matches!(outcome, FileOutcome::Completed { .. }));
        assert_eq!(h.post.recorded_runs().await.len(), 1);
    }
}
