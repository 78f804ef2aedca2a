pub mod config;
pub mod converter;
pub mod external_catalog;
pub mod identify;
pub mod placer;
pub mod post_process;
pub mod processor;
pub mod tagger;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, load_settings, validate_config, ConfigError, Overrides,
    SanitizedSettings, Settings,
};
pub use identify::{ExplicitIds, Identification, Mode, Resolver};
pub use processor::{BatchReport, BatchRunner, FileOutcome, MediaProcessor, RunOptions, TagOutcome};
