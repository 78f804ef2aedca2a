use super::{types::Settings, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Output extension is set
/// - Fallback tagging makes at least one attempt
/// - Configured catalogs carry an API key
pub fn validate_config(settings: &Settings) -> Result<(), ConfigError> {
    if settings.converter.output_extension.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.output_extension cannot be empty".to_string(),
        ));
    }

    if settings.tagging.fallback.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "tagging.fallback.max_attempts must be at least 1".to_string(),
        ));
    }

    if let Some(ref tmdb) = settings.catalogs.tmdb {
        if tmdb.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "catalogs.tmdb.api_key cannot be empty".to_string(),
            ));
        }
    }

    if let Some(ref tvdb) = settings.catalogs.tvdb {
        if tvdb.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "catalogs.tvdb.api_key cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
