//! Filename-based fallback tagging.
//!
//! Used when the metadata-driven writer fails. Tags are rebuilt from the
//! output file's name alone, using one of two naming conventions:
//!
//! - TV: `Show Name - S02E05 - Episode Title`
//! - Movie: `Movie Name (1999)`

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::store::{TagStore, TagStoreError};
use super::types::{keys, TagSet, TagValue, MEDIA_KIND_TV_SHOW};
use crate::config::FallbackConfig;
use crate::identify::Identification;

static SEASON_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"S(\d+)E(\d+)").expect("valid regex"));

/// Errors from fallback tagging.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// The filename does not follow the expected convention.
    #[error("File name not in expected format '{expected}': {name}")]
    Format { name: String, expected: &'static str },

    /// The tag store failed with a fault that is not retried.
    #[error("Tag store error: {0}")]
    Store(#[from] TagStoreError),

    /// Every save attempt hit an I/O fault.
    #[error("Gave up writing tags after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: TagStoreError },
}

/// How often and how patiently saves are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl From<&FallbackConfig> for RetryPolicy {
    fn from(config: &FallbackConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

/// Fields of a `Show - S01E02 - Title` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TvFileName {
    pub show: String,
    pub season: u16,
    pub episode: i32,
    pub title: String,
}

/// Fields of a `Title (Year)` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieFileName {
    pub title: String,
    pub year: String,
}

const TV_FORMAT: &str = "show title - S##E## - episode title";
const MOVIE_FORMAT: &str = "movie name (year)";

fn format_fault(name: &str, expected: &'static str) -> FallbackError {
    FallbackError::Format {
        name: name.to_string(),
        expected,
    }
}

/// Parse a TV file name (without extension).
pub fn parse_tv_filename(name: &str) -> Result<TvFileName, FallbackError> {
    let parts: Vec<&str> = name.split(" - ").collect();
    let (Some(show), Some(token)) = (parts.first(), parts.get(1)) else {
        return Err(format_fault(name, TV_FORMAT));
    };

    let caps = SEASON_EPISODE_RE
        .captures(token)
        .ok_or_else(|| format_fault(name, TV_FORMAT))?;
    // Numbers must fit the `disk` and `tves` atoms.
    let season = caps[1]
        .parse::<u16>()
        .map_err(|_| format_fault(name, TV_FORMAT))?;
    let episode = caps[2]
        .parse::<i32>()
        .map_err(|_| format_fault(name, TV_FORMAT))?;
    let title = parts[2..].join(" - ");

    if show.is_empty() || title.is_empty() {
        return Err(format_fault(name, TV_FORMAT));
    }

    Ok(TvFileName {
        show: show.to_string(),
        season,
        episode,
        title,
    })
}

/// Parse a movie file name (without extension).
pub fn parse_movie_filename(name: &str) -> Result<MovieFileName, FallbackError> {
    let Some((title, year_token)) = name.rsplit_once(" (") else {
        return Err(format_fault(name, MOVIE_FORMAT));
    };
    let year = year_token.replace(')', "");
    if title.is_empty() || year.is_empty() {
        return Err(format_fault(name, MOVIE_FORMAT));
    }
    Ok(MovieFileName {
        title: title.to_string(),
        year,
    })
}

/// Minimal TV tag set.
pub fn tv_tags(name: &TvFileName) -> TagSet {
    let mut tags = TagSet::new();
    tags.set_text(keys::SHOW, &name.show)
        .set_text(keys::TITLE, &name.title)
        .set_text(keys::EPISODE_TITLE, &name.title)
        .set(keys::SEASON, TagValue::Integer(i32::from(name.season)))
        .set(keys::DISK, TagValue::Disk(name.season))
        .set_text(keys::ALBUM, format!("{}, Season {}", name.show, name.season))
        .set(keys::EPISODE, TagValue::Integer(name.episode))
        .set(keys::MEDIA_KIND, TagValue::Byte(MEDIA_KIND_TV_SHOW));
    tags
}

/// Minimal movie tag set.
pub fn movie_tags(name: &MovieFileName) -> TagSet {
    let mut tags = TagSet::new();
    tags.set_text(keys::TITLE, &name.title)
        .set_text(keys::DATE, &name.year);
    tags
}

/// Writes filename-derived tags with bounded retries.
#[derive(Clone)]
pub struct FallbackTagger {
    store: Arc<dyn TagStore>,
    policy: RetryPolicy,
}

impl FallbackTagger {
    pub fn new(store: Arc<dyn TagStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Tags for `output`, chosen by the kind of identification.
    pub fn tags_for(output: &Path, identification: &Identification) -> Result<TagSet, FallbackError> {
        let name = output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if identification.is_tv() {
            parse_tv_filename(&name).map(|n| tv_tags(&n))
        } else {
            parse_movie_filename(&name).map(|n| movie_tags(&n))
        }
    }

    /// Replace the tags of `output` with ones derived from its name.
    pub async fn tag(
        &self,
        output: &Path,
        identification: &Identification,
    ) -> Result<TagSet, FallbackError> {
        let tags = Self::tags_for(output, identification)?;

        match self.store.read(output) {
            Ok(existing) => info!(existing, "Replacing existing tag atoms"),
            Err(e) => warn!(error = %e, "Could not read existing tags"),
        }
        self.store.delete_all(output)?;

        self.save_with_retry(output, &tags).await?;
        Ok(tags)
    }

    async fn save_with_retry(&self, path: &Path, tags: &TagSet) -> Result<(), FallbackError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(attempt, path = %path.display(), "Trying to write manual tags");

            match self.store.save(path, tags) {
                Ok(()) => {
                    info!(tags = %tags, "Manual tags written successfully");
                    return Ok(());
                }
                Err(e) if e.is_retryable() => {
                    if attempt >= max_attempts {
                        return Err(FallbackError::RetriesExhausted { attempts: attempt, last: e });
                    }
                    warn!(attempt, error = %e, "Problem writing manual tags, retrying");
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(e) => return Err(FallbackError::Store(e)),
            }
        }
    }
}
