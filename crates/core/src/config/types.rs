use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use crate::converter::ConverterConfig;
use crate::external_catalog::{TmdbConfig, TvdbConfig};
use crate::placer::PlacerConfig;

/// Root configuration.
///
/// Built once at startup from the config file, the environment and the
/// command line overrides, then shared read-only.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub identify: IdentifyConfig,
    #[serde(default)]
    pub tagging: TaggingConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub placement: PlacerConfig,
    #[serde(default)]
    pub post_process: PostProcessConfig,
    #[serde(default)]
    pub catalogs: CatalogConfig,
}

/// Filename guessing configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentifyConfig {
    /// Feed the whole path to the guesser instead of the base name.
    #[serde(default)]
    pub full_path_guess: bool,
}

/// Tagging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Metadata language (ISO 639-1).
    #[serde(default = "default_language")]
    pub language: String,
    /// Embed poster artwork.
    #[serde(default = "default_true")]
    pub artwork: bool,
    /// Prefer the episode still over the series poster for TV artwork.
    #[serde(default)]
    pub thumbnail: bool,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: default_language(),
            artwork: true,
            thumbnail: false,
            fallback: FallbackConfig::default(),
        }
    }
}

/// Filename based tagging used when metadata tagging fails
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FallbackConfig {
    /// Save attempts on I/O faults (default: 3)
    #[serde(default = "default_fallback_attempts")]
    pub max_attempts: u32,
    /// Pause between save attempts in seconds (default: 5)
    #[serde(default = "default_fallback_delay")]
    pub retry_delay_secs: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_fallback_attempts(),
            retry_delay_secs: default_fallback_delay(),
        }
    }
}

/// Post-processing scripts configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostProcessConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Directory holding the executable scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scripts_dir: default_scripts_dir(),
        }
    }
}

/// Metadata catalogs configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    #[serde(default)]
    pub tvdb: Option<TvdbConfig>,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn default_fallback_attempts() -> u32 {
    3
}

fn default_fallback_delay() -> u64 {
    5
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("post_process")
}

/// Command line overrides applied on top of the loaded settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub no_move: bool,
    pub move_to: Option<PathBuf>,
    pub no_copy: bool,
    pub no_delete: bool,
    pub no_tag: bool,
    pub no_post: bool,
    pub process_same_extension: bool,
}

impl Settings {
    /// Consumes the settings and returns them with the overrides applied.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if overrides.no_move {
            self.converter.output_dir = None;
            self.placement.move_to = None;
            info!("No-move enabled");
        } else if let Some(ref move_to) = overrides.move_to {
            self.placement.move_to = Some(move_to.clone());
            info!("Overridden move-to to {:?}", move_to);
        }
        if overrides.no_copy {
            self.placement.copy_to.clear();
            info!("No-copy enabled");
        }
        if overrides.no_delete {
            self.converter.delete_original = false;
            info!("No-delete enabled");
        }
        if overrides.process_same_extension {
            self.converter.process_same_extension = true;
            info!("Reprocessing of {} files enabled", self.converter.output_extension);
        }
        if overrides.no_tag {
            self.tagging.enabled = false;
            info!("No-tagging enabled");
        }
        if overrides.no_post {
            self.post_process.enabled = false;
            info!("No post processing enabled");
        }
        self
    }
}

/// Sanitized settings for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSettings {
    pub identify: IdentifyConfig,
    pub tagging: TaggingConfig,
    pub converter: ConverterConfig,
    pub placement: PlacerConfig,
    pub post_process: PostProcessConfig,
    pub tmdb_configured: bool,
    pub tvdb_configured: bool,
}

impl From<&Settings> for SanitizedSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            identify: settings.identify.clone(),
            tagging: settings.tagging.clone(),
            converter: settings.converter.clone(),
            placement: settings.placement.clone(),
            post_process: settings.post_process.clone(),
            tmdb_configured: settings
                .catalogs
                .tmdb
                .as_ref()
                .is_some_and(|t| !t.api_key.is_empty()),
            tvdb_configured: settings
                .catalogs
                .tvdb
                .as_ref()
                .is_some_and(|t| !t.api_key.is_empty()),
        }
    }
}
