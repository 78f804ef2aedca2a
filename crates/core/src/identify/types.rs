//! Types shared by the identification engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of media a filename appears to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Episode,
}

/// Episode number(s) found in a filename.
///
/// Files holding more than one episode (`S01E01E02`) report all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EpisodeNumber {
    Single(u32),
    Multi(Vec<u32>),
}

impl EpisodeNumber {
    /// The episode used for identification and tagging.
    pub fn first(&self) -> Option<u32> {
        match self {
            Self::Single(n) => Some(*n),
            Self::Multi(numbers) => numbers.first().copied(),
        }
    }
}

/// A heuristic guess extracted from a filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGuess {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<EpisodeNumber>,
}

impl RawGuess {
    /// A movie guess.
    pub fn movie(title: impl Into<String>, year: Option<u32>) -> Self {
        Self {
            title: title.into(),
            year,
            kind: MediaKind::Movie,
            season: None,
            episode: None,
        }
    }

    /// An episode guess.
    pub fn episode(
        title: impl Into<String>,
        year: Option<u32>,
        season: Option<u32>,
        episode: Option<EpisodeNumber>,
    ) -> Self {
        Self {
            title: title.into(),
            year,
            kind: MediaKind::Episode,
            season,
            episode,
        }
    }
}

impl fmt::Display for RawGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if let Some(year) = self.year {
            write!(f, " ({})", year)?;
        }
        Ok(())
    }
}

/// The resolved target of a file: what it is and whether to tag it.
///
/// Built once per file and consumed by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Identification {
    /// Leave the file alone.
    Skip,
    /// Convert, but do not tag.
    Untagged,
    MovieByImdbId {
        imdb_id: String,
    },
    MovieByTmdbId {
        tmdb_id: u32,
    },
    TvEpisode {
        tvdb_id: u32,
        season: u32,
        episode: u32,
    },
}

impl Identification {
    /// Whether this identification carries metadata to tag with.
    pub fn should_tag(&self) -> bool {
        !matches!(self, Self::Skip | Self::Untagged)
    }

    pub fn is_tv(&self) -> bool {
        matches!(self, Self::TvEpisode { .. })
    }
}

impl fmt::Display for Identification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Untagged => write!(f, "untagged"),
            Self::MovieByImdbId { imdb_id } => write!(f, "movie (IMDB ID {})", imdb_id),
            Self::MovieByTmdbId { tmdb_id } => write!(f, "movie (TMDB ID {})", tmdb_id),
            Self::TvEpisode {
                tvdb_id,
                season,
                episode,
            } => write!(f, "TV (TVDB ID {}) S{:02}E{:02}", tvdb_id, season, episode),
        }
    }
}

/// IDs supplied by the caller instead of guessed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitIds {
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<u32>,
    pub tvdb_id: Option<u32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl ExplicitIds {
    /// A complete identification from the supplied IDs, if they form one.
    ///
    /// A TVDB ID needs both season and episode and must not be mixed with a
    /// movie ID. An IMDB ID wins over a TMDB ID.
    pub fn identification(&self) -> Option<Identification> {
        let has_movie_id = self.imdb_id.is_some() || self.tmdb_id.is_some();

        match (self.tvdb_id, has_movie_id) {
            (Some(tvdb_id), false) => match (self.season, self.episode) {
                (Some(season), Some(episode)) => Some(Identification::TvEpisode {
                    tvdb_id,
                    season,
                    episode,
                }),
                _ => None,
            },
            (None, true) => match (&self.imdb_id, self.tmdb_id) {
                (Some(imdb_id), _) => Some(Identification::MovieByImdbId {
                    imdb_id: imdb_id.clone(),
                }),
                (None, Some(tmdb_id)) => Some(Identification::MovieByTmdbId { tmdb_id }),
                (None, None) => None,
            },
            _ => None,
        }
    }
}

/// Result of matching a guess against a catalog.
///
/// `NotFound` and `LookupFailed` both send resolution to manual entry, but
/// stay distinct so callers can tell "no match" from "catalog unreachable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<T> {
    Found(T),
    NotFound,
    LookupFailed(String),
}

impl<T> MatchOutcome<T> {
    /// The match, if there was one.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }
}
