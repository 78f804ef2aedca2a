//! Filename heuristics.
//!
//! Turns names like `Breaking.Bad.S02E05.720p.mkv` or `Inception.2010.1080p.mkv`
//! into a [`RawGuess`]. When given a full path, parent directories fill in a
//! missing show title or season.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Component, Path};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::types::{EpisodeNumber, RawGuess};

/// Errors from filename parsing.
#[derive(Debug, Error)]
pub enum GuessError {
    #[error("no title found in '{0}'")]
    NoTitle(String),

    #[error("parser failed: {0}")]
    Parser(String),
}

/// Extracts a guess from a file name or path.
pub trait FilenameParser: Send + Sync {
    fn parse(&self, name: &str) -> Result<RawGuess, GuessError>;
}

static SXXEXX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)[\s\-\[\(]*\bS(\d{1,2})[\s\-]?E(\d{1,3})((?:[\s\-]?E\d{1,3})*)")
        .expect("valid regex")
});

static NXNN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)[\s\-\[\(]*\b(\d{1,2})x(\d{2,3})\b").expect("valid regex"));

static EXTRA_EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)E(\d{1,3})").expect("valid regex"));

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").expect("valid regex"));

static TITLE_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)[\s\(\[]*\b((?:19|20)\d{2})\b[\)\]]?\s*$").expect("valid regex")
});

static QUALITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(2160p|1080p|1080i|720p|576p|480p|4k|uhd|hdr|bluray|blu-ray|brrip|bdrip|web-dl|webrip|web|hdtv|dvdrip|dvd|x264|x265|h264|h265|hevc|xvid|remux|proper|repack|extended|unrated)\b",
    )
    .expect("valid regex")
});

static LEADING_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]*\]\s*").expect("valid regex"));

static SEASON_DIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:season|series|s)[\s._\-]*(\d{1,2})$").expect("valid regex")
});

static SPECIALS_DIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^specials?$").expect("valid regex"));

/// Regex-based parser for common release naming schemes.
#[derive(Debug, Clone, Default)]
pub struct HeuristicParser;

impl HeuristicParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_name(&self, stem: &str) -> RawGuess {
        let cleaned = clean_separators(stem);
        let cleaned = LEADING_GROUP_RE.replace(&cleaned, "").to_string();

        if let Some(caps) = SXXEXX_RE.captures(&cleaned) {
            let (title, year) = split_title_year(&caps[1]);
            let season = caps[2].parse().ok();
            let first: Option<u32> = caps[3].parse().ok();
            let extra: Vec<u32> = EXTRA_EPISODE_RE
                .captures_iter(&caps[4])
                .filter_map(|c| c[1].parse().ok())
                .collect();
            let episode = match (first, extra.is_empty()) {
                (Some(first), true) => Some(EpisodeNumber::Single(first)),
                (Some(first), false) => {
                    let mut all = vec![first];
                    all.extend(extra);
                    Some(EpisodeNumber::Multi(all))
                }
                (None, _) => None,
            };
            return RawGuess::episode(title, year, season, episode);
        }

        if let Some(caps) = NXNN_RE.captures(&cleaned) {
            let (title, year) = split_title_year(&caps[1]);
            return RawGuess::episode(
                title,
                year,
                caps[2].parse().ok(),
                caps[3].parse().ok().map(EpisodeNumber::Single),
            );
        }

        let head = match QUALITY_RE.find(&cleaned) {
            Some(m) => &cleaned[..m.start()],
            None => cleaned.as_str(),
        };
        if let Some((title, year)) = last_year_split(head) {
            return RawGuess::movie(title, Some(year));
        }
        let year = YEAR_RE
            .find_iter(&cleaned[head.len()..])
            .last()
            .and_then(|m| m.as_str().parse().ok());
        RawGuess::movie(tidy_title(head), year)
    }

    /// Fill gaps in a guess from the directories above the file.
    fn apply_parents(&self, mut guess: RawGuess, parents: &[String]) -> RawGuess {
        let mut season_from_dir = None;
        let mut show_dir = None;

        for dir in parents.iter().rev() {
            if let Some(caps) = SEASON_DIR_RE.captures(dir) {
                season_from_dir = season_from_dir.or_else(|| caps[1].parse().ok());
                continue;
            }
            if SPECIALS_DIR_RE.is_match(dir) {
                season_from_dir = season_from_dir.or(Some(0));
                continue;
            }
            show_dir = Some(dir.as_str());
            break;
        }

        if guess.season.is_none() && guess.episode.is_some() {
            guess.season = season_from_dir;
        }

        if guess.title.is_empty() {
            if let Some(dir) = show_dir {
                let (title, year) = split_title_year(&clean_separators(dir));
                debug!(dir = %dir, title = %title, "Took title from parent directory");
                guess.title = title;
                if guess.year.is_none() {
                    guess.year = year;
                }
            }
        }

        guess
    }
}

impl FilenameParser for HeuristicParser {
    fn parse(&self, name: &str) -> Result<RawGuess, GuessError> {
        let path = Path::new(name);
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| GuessError::Parser(format!("not a file name: '{}'", name)))?;

        let guess = self.parse_name(strip_media_extension(file_name));

        let parents: Vec<String> = path
            .parent()
            .map(|p| {
                p.components()
                    .filter_map(|c| match c {
                        Component::Normal(s) => s.to_str().map(str::to_string),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let guess = if parents.is_empty() {
            guess
        } else {
            self.apply_parents(guess, &parents)
        };

        if guess.title.is_empty() {
            return Err(GuessError::NoTitle(name.to_string()));
        }
        Ok(guess)
    }
}

/// Applies a [`FilenameParser`] to a file, using either the bare file name
/// or the whole path.
#[derive(Clone)]
pub struct FilenameGuesser {
    parser: Arc<dyn FilenameParser>,
    full_path: bool,
}

impl FilenameGuesser {
    pub fn new(parser: Arc<dyn FilenameParser>, full_path: bool) -> Self {
        Self { parser, full_path }
    }

    /// Guesser backed by [`HeuristicParser`].
    pub fn heuristic(full_path: bool) -> Self {
        Self::new(Arc::new(HeuristicParser::new()), full_path)
    }

    pub fn guess(&self, path: &Path) -> Result<RawGuess, GuessError> {
        let input = if self.full_path {
            path.to_string_lossy().into_owned()
        } else {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    GuessError::Parser(format!("no file name in '{}'", path.display()))
                })?
        };
        self.parser.parse(&input)
    }
}

/// Drop a short alphabetic extension. Names like `Mr. Robot` keep their dot.
fn strip_media_extension(file_name: &str) -> &str {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (2..=4).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && ext.chars().any(|c| c.is_ascii_alphabetic()) =>
        {
            stem
        }
        _ => file_name,
    }
}

fn clean_separators(s: &str) -> String {
    s.replace(['.', '_'], " ")
}

fn tidy_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c == '-' || c == '(' || c == '[' || c.is_whitespace())
        .to_string()
}

/// Split at the last year-like token that has a title in front of it.
fn last_year_split(raw: &str) -> Option<(String, u32)> {
    let years: Vec<_> = YEAR_RE.find_iter(raw).collect();
    years.into_iter().rev().find_map(|m| {
        let title = tidy_title(&raw[..m.start()]);
        let year = m.as_str().parse().ok()?;
        (!title.is_empty()).then_some((title, year))
    })
}

fn split_title_year(raw: &str) -> (String, Option<u32>) {
    let tidy = tidy_title(raw);
    if let Some(caps) = TITLE_YEAR_RE.captures(&tidy) {
        let title = tidy_title(&caps[1]);
        if !title.is_empty() {
            return (title, caps[2].parse().ok());
        }
    }
    (tidy, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::types::MediaKind;

    fn parse(name: &str) -> RawGuess {
        HeuristicParser::new().parse(name).unwrap()
    }

    #[test]
    fn test_sxxexx() {
        let guess = parse("Breaking.Bad.S02E05.720p.HDTV.x264.mkv");
        assert_eq!(guess.kind, MediaKind::Episode);
        assert_eq!(guess.title, "Breaking Bad");
        assert_eq!(guess.season, Some(2));
        assert_eq!(guess.episode, Some(EpisodeNumber::Single(5)));
        assert_eq!(guess.year, None);
    }

    #[test]
    fn test_sxxexx_with_year() {
        let guess = parse("Doctor.Who.2005.S10E01.mkv");
        assert_eq!(guess.title, "Doctor Who");
        assert_eq!(guess.year, Some(2005));
        assert_eq!(guess.season, Some(10));
    }

    #[test]
    fn test_multi_episode() {
        let guess = parse("Show Name - S01E01E02.mkv");
        assert_eq!(guess.title, "Show Name");
        assert_eq!(guess.episode, Some(EpisodeNumber::Multi(vec![1, 2])));
        assert_eq!(guess.episode.unwrap().first(), Some(1));
    }

    #[test]
    fn test_nxnn() {
        let guess = parse("Futurama 3x07.avi");
        assert_eq!(guess.kind, MediaKind::Episode);
        assert_eq!(guess.title, "Futurama");
        assert_eq!(guess.season, Some(3));
        assert_eq!(guess.episode, Some(EpisodeNumber::Single(7)));
    }

    #[test]
    fn test_movie_with_year() {
        let guess = parse("Inception.2010.1080p.BluRay.mkv");
        assert_eq!(guess.kind, MediaKind::Movie);
        assert_eq!(guess.title, "Inception");
        assert_eq!(guess.year, Some(2010));
    }

    #[test]
    fn test_movie_with_year_in_parens() {
        let guess = parse("The Matrix (1999).mp4");
        assert_eq!(guess.title, "The Matrix");
        assert_eq!(guess.year, Some(1999));
    }

    #[test]
    fn test_movie_title_starting_with_year() {
        let guess = parse("2001.A.Space.Odyssey.1968.mkv");
        assert_eq!(guess.title, "2001 A Space Odyssey");
        assert_eq!(guess.year, Some(1968));
    }

    #[test]
    fn test_movie_title_containing_year() {
        let guess = parse("Blade.Runner.2049.2017.1080p.mkv");
        assert_eq!(guess.title, "Blade Runner 2049");
        assert_eq!(guess.year, Some(2017));

        let guess = parse("Blade Runner 2049 (2017) [1080p].mkv");
        assert_eq!(guess.title, "Blade Runner 2049");
        assert_eq!(guess.year, Some(2017));
    }

    #[test]
    fn test_movie_year_after_quality_tokens() {
        let guess = parse("Heat.REMUX.1995.mkv");
        assert_eq!(guess.title, "Heat");
        assert_eq!(guess.year, Some(1995));
    }

    #[test]
    fn test_movie_title_that_is_a_year() {
        let guess = parse("2012.mkv");
        assert_eq!(guess.title, "2012");
        assert_eq!(guess.year, None);
    }

    #[test]
    fn test_movie_without_year_stops_at_quality() {
        let guess = parse("Some.Movie.720p.WEB-DL.mkv");
        assert_eq!(guess.title, "Some Movie");
        assert_eq!(guess.year, None);
    }

    #[test]
    fn test_name_with_dot_and_no_extension() {
        let guess = parse("Mr. Robot S01E01");
        assert_eq!(guess.title, "Mr Robot");
        assert_eq!(guess.season, Some(1));
    }

    #[test]
    fn test_release_group_prefix_dropped() {
        let guess = parse("[Group] Show Name - S01E03.mkv");
        assert_eq!(guess.title, "Show Name");
    }

    #[test]
    fn test_full_path_keeps_title_from_file_name() {
        let guess = parse("/media/tv/Other Show/Season 1/The.Wire.S03E04.mkv");
        assert_eq!(guess.title, "The Wire");
        assert_eq!(guess.season, Some(3));
    }

    #[test]
    fn test_full_path_show_dir_with_year() {
        let guess = parse("/media/tv/The Wire (2002)/Season 3/S03E04.mkv");
        assert_eq!(guess.title, "The Wire");
        assert_eq!(guess.year, Some(2002));
        assert_eq!(guess.episode, Some(EpisodeNumber::Single(4)));
    }

    #[test]
    fn test_full_path_title_from_show_dir() {
        let guess = parse("/media/tv/Futurama/Season 2/S02E05.mkv");
        assert_eq!(guess.title, "Futurama");
        assert_eq!(guess.season, Some(2));
        assert_eq!(guess.episode, Some(EpisodeNumber::Single(5)));
    }

    #[test]
    fn test_no_title() {
        let err = HeuristicParser::new().parse("S01E01.mkv").unwrap_err();
        assert!(matches!(err, GuessError::NoTitle(_)));
    }

    #[test]
    fn test_guesser_uses_file_name_only_by_default() {
        let guesser = FilenameGuesser::heuristic(false);
        let err = guesser
            .guess(Path::new("/media/tv/Futurama/Season 2/S02E05.mkv"))
            .unwrap_err();
        assert!(matches!(err, GuessError::NoTitle(_)));

        let guesser = FilenameGuesser::heuristic(true);
        let guess = guesser
            .guess(Path::new("/media/tv/Futurama/Season 2/S02E05.mkv"))
            .unwrap();
        assert_eq!(guess.title, "Futurama");
    }
}
