mod args;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reeltag_core::converter::{Converter, FfmpegConverter};
use reeltag_core::external_catalog::{CombinedCatalogClient, ExternalCatalog, TmdbClient, TvdbClient};
use reeltag_core::identify::{
    ask_value, CandidateMatcher, FilenameGuesser, Resolver, StdinPrompter,
};
use reeltag_core::placer::FsPlacer;
use reeltag_core::post_process::ScriptPostProcessor;
use reeltag_core::processor::{BatchRunner, MediaProcessor, ProcessorConfig, RunOptions};
use reeltag_core::tagger::{FallbackTagger, LoftyTagStore, MetadataTagWriterFactory, RetryPolicy};
use reeltag_core::{load_settings, validate_config, SanitizedSettings, Settings};

use args::Args;

fn main() {
    if let Err(e) = run() {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Files are handled one at a time, so a single thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    runtime.block_on(execute(args))
}

async fn execute(args: Args) -> Result<()> {
    let settings = load_settings(args.config.as_deref(), &install_dir())
        .context("Failed to load configuration")?;
    validate_config(&settings).context("Configuration validation failed")?;
    let settings = Arc::new(settings.with_overrides(&args.overrides()));
    info!(
        "Configuration: {}",
        serde_json::to_string(&SanitizedSettings::from(settings.as_ref())).unwrap_or_default()
    );

    let converter = Arc::new(FfmpegConverter::new(settings.converter.clone()));
    converter
        .validate()
        .await
        .context("Converter is not usable")?;

    let mut prompter = StdinPrompter;
    let input = match &args.input {
        Some(input) => input.clone(),
        None => PathBuf::from(
            ask_value(&mut prompter, "Enter path to file", false).context("No input path")?,
        ),
    };

    let mut runner = build_runner(&settings, converter)?;
    let options = RunOptions {
        mode: args.mode(),
        tagging_enabled: settings.tagging.enabled,
        explicit: args.explicit_ids(),
        preserve_relative: args.preserve_relative,
    };

    if input.is_dir() {
        let report = runner.run_directory(&input, &options).await;
        info!(
            processed = report.processed,
            skipped = report.skipped,
            failed = report.failed,
            "Done"
        );
    } else if input.is_file() {
        let outcome = runner
            .run_file(&input, &options)
            .await
            .with_context(|| format!("Failed to process {:?}", input))?;
        info!(outcome = %serde_json::to_string(&outcome).unwrap_or_default(), "Done");
    } else {
        bail!("Input {:?} is neither a file nor a directory", input);
    }

    Ok(())
}

fn build_runner(settings: &Settings, converter: Arc<FfmpegConverter>) -> Result<BatchRunner> {
    let tmdb = settings
        .catalogs
        .tmdb
        .clone()
        .map(|config| TmdbClient::new(config, &settings.tagging.language))
        .transpose()
        .context("Failed to create TMDB client")?;
    let tvdb = settings
        .catalogs
        .tvdb
        .clone()
        .map(|config| TvdbClient::new(config, &settings.tagging.language))
        .transpose()
        .context("Failed to create TVDB client")?;
    let catalog: Arc<dyn ExternalCatalog> = Arc::new(CombinedCatalogClient::new(tmdb, tvdb));

    let store = Arc::new(LoftyTagStore::new());
    let fallback = FallbackTagger::new(
        store.clone(),
        RetryPolicy::from(&settings.tagging.fallback),
    );

    let mut processor = MediaProcessor::new(
        ProcessorConfig::from_settings(settings),
        converter,
        Arc::new(MetadataTagWriterFactory::new(catalog.clone(), store)),
        fallback,
        Arc::new(FsPlacer::new(settings.placement.clone())),
    );
    if settings.post_process.enabled {
        processor = processor.with_post_processor(Arc::new(ScriptPostProcessor::new(
            settings.post_process.scripts_dir.clone(),
        )));
    }

    let resolver = Resolver::new(
        FilenameGuesser::heuristic(settings.identify.full_path_guess),
        CandidateMatcher::new(catalog),
        Box::new(StdinPrompter),
    );

    Ok(BatchRunner::new(resolver, processor))
}

/// Directory of the executable, where the default config file lives.
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
