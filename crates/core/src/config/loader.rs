use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{types::Settings, ConfigError};

/// Config file looked up next to the executable when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "reeltag.toml";

const ENV_PREFIX: &str = "REELTAG_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let settings: Settings = Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(settings)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Settings, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Picks the config file to read.
///
/// A requested path is used when it exists, either as given or relative to
/// `default_dir`. Otherwise the default file in `default_dir` is used when
/// present. `None` means built-in defaults.
pub fn resolve_config_path(requested: Option<&Path>, default_dir: &Path) -> Option<PathBuf> {
    if let Some(requested) = requested {
        if requested.exists() {
            return Some(requested.to_path_buf());
        }
        let relative = default_dir.join(requested);
        if relative.exists() {
            return Some(relative);
        }
        warn!(
            "Configuration file {:?} not present, using default {}",
            requested, DEFAULT_CONFIG_FILE
        );
    }

    let default = default_dir.join(DEFAULT_CONFIG_FILE);
    default.exists().then_some(default)
}

/// Loads the settings for a run.
///
/// Only parse failures are errors; a missing file yields the defaults with
/// environment overrides applied.
pub fn load_settings(requested: Option<&Path>, default_dir: &Path) -> Result<Settings, ConfigError> {
    match resolve_config_path(requested, default_dir) {
        Some(path) => {
            info!("Using configuration file {:?}", path);
            load_config(&path)
        }
        None => {
            info!("No configuration file found, using defaults");
            Figment::new()
                .merge(Serialized::defaults(Settings::default()))
                .merge(Env::prefixed(ENV_PREFIX).split("__"))
                .extract()
                .map_err(|e| ConfigError::ParseError(e.to_string()))
        }
    }
}
