//! Matching filename guesses against the external catalogs.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::types::{Identification, MatchOutcome, RawGuess};
use crate::external_catalog::{ExternalCatalog, TmdbMovie};

/// How many movie search results are considered.
pub const MOVIE_SEARCH_LIMIT: usize = 4;

/// Lower-case a title and drop everything that is not a letter or digit.
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The first candidate whose normalized title equals the guess and whose
/// release year matches, when the guess has a year.
///
/// Candidates are taken in the order given. There is no scoring: the first
/// one that qualifies wins.
pub fn select_first_match<'a>(guess: &RawGuess, candidates: &'a [TmdbMovie]) -> Option<&'a TmdbMovie> {
    let wanted = normalize_title(&guess.title);
    let wanted_year = guess.year.map(|y| y.to_string());

    candidates.iter().find(|candidate| {
        let title_matches = normalize_title(&candidate.title) == wanted;
        let year_matches = match &wanted_year {
            Some(year) => candidate.year_prefix() == *year,
            None => true,
        };
        if !(title_matches && year_matches) {
            debug!(
                candidate = %candidate.title,
                year = %candidate.year_prefix(),
                "Skipped potential match"
            );
        }
        title_matches && year_matches
    })
}

/// Turns a [`RawGuess`] into an [`Identification`] using the catalogs.
#[derive(Clone)]
pub struct CandidateMatcher {
    catalog: Arc<dyn ExternalCatalog>,
}

impl CandidateMatcher {
    pub fn new(catalog: Arc<dyn ExternalCatalog>) -> Self {
        Self { catalog }
    }

    /// Search TMDB for the guessed title and confirm the first acceptable
    /// candidate by fetching its full record.
    pub async fn match_movie(&self, guess: &RawGuess) -> MatchOutcome<Identification> {
        let candidates = match self
            .catalog
            .search_movies(&guess.title, MOVIE_SEARCH_LIMIT)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(title = %guess.title, error = %e, "Movie search failed");
                return MatchOutcome::LookupFailed(e.to_string());
            }
        };

        let Some(candidate) = select_first_match(guess, &candidates) else {
            info!(guess = %guess, searched = candidates.len(), "No matching movie found");
            return MatchOutcome::NotFound;
        };

        match self.catalog.get_movie(candidate.id).await {
            Ok(movie) => {
                info!(
                    title = %movie.title,
                    tmdb_id = movie.id,
                    "Matched movie"
                );
                MatchOutcome::Found(Identification::MovieByTmdbId { tmdb_id: movie.id })
            }
            Err(e) => {
                warn!(tmdb_id = candidate.id, error = %e, "Movie confirmation failed");
                MatchOutcome::LookupFailed(e.to_string())
            }
        }
    }

    /// Find the series for an episode guess.
    ///
    /// A TVDB hint is used directly when it resolves. Otherwise the series is
    /// looked up as `"<title> (<year>)"` when the guess has a year, then by the
    /// bare title.
    pub async fn match_episode(
        &self,
        guess: &RawGuess,
        tvdb_hint: Option<u32>,
    ) -> MatchOutcome<Identification> {
        let (Some(season), Some(episode)) =
            (guess.season, guess.episode.as_ref().and_then(|e| e.first()))
        else {
            info!(guess = %guess, "Episode guess has no season or episode number");
            return MatchOutcome::NotFound;
        };

        let mut tvdb_id = None;

        if let Some(hint) = tvdb_hint {
            match self.catalog.get_series(hint).await {
                Ok(series) => {
                    debug!(tvdb_id = hint, name = %series.name, "Using supplied TVDB ID");
                    tvdb_id = Some(series.id);
                }
                Err(e) => {
                    warn!(tvdb_id = hint, error = %e, "Supplied TVDB ID did not resolve");
                }
            }
        } else if let Some(year) = guess.year {
            let key = format!("{} ({})", guess.title, year);
            match self.catalog.lookup_series(&key).await {
                Ok(Some(series)) => tvdb_id = Some(series.id),
                Ok(None) => debug!(key = %key, "No series for title with year"),
                Err(e) => debug!(key = %key, error = %e, "Series lookup with year failed"),
            }
        }

        let tvdb_id = match tvdb_id {
            Some(id) => id,
            None => match self.catalog.lookup_series(&guess.title).await {
                Ok(Some(series)) => series.id,
                Ok(None) => {
                    info!(title = %guess.title, "No matching series found");
                    return MatchOutcome::NotFound;
                }
                Err(e) => {
                    warn!(title = %guess.title, error = %e, "Series lookup failed");
                    return MatchOutcome::LookupFailed(e.to_string());
                }
            },
        };

        info!(tvdb_id, season, episode, "Matched episode");
        MatchOutcome::Found(Identification::TvEpisode {
            tvdb_id,
            season,
            episode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_catalog::ExternalCatalogError;
    use crate::identify::types::EpisodeNumber;
    use crate::testing::{fixtures, MockExternalCatalog};

    fn movie(id: u32, title: &str, release_date: Option<&str>) -> TmdbMovie {
        let mut movie = fixtures::tmdb_movie(id, title, 2000);
        movie.release_date = release_date.map(str::to_string);
        movie
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Spider-Man: No Way Home"), "spidermannowayhome");
        assert_eq!(normalize_title("Amélie"), "amélie");
        assert_eq!(normalize_title("  "), "");
    }

    #[test]
    fn test_first_match_respects_year() {
        let candidates = vec![
            movie(1, "Inception", Some("2011-01-01")),
            movie(2, "Inception", Some("2010-07-16")),
        ];
        let guess = RawGuess::movie("Inception", Some(2010));
        assert_eq!(select_first_match(&guess, &candidates).map(|m| m.id), Some(2));
    }

    #[test]
    fn test_first_match_without_year_takes_first_title_match() {
        let candidates = vec![
            movie(1, "Inception: The Cobol Job", Some("2010-12-07")),
            movie(2, "Inception", Some("2010-07-16")),
            movie(3, "Inception", Some("2014-01-01")),
        ];
        let guess = RawGuess::movie("inception", None);
        assert_eq!(select_first_match(&guess, &candidates).map(|m| m.id), Some(2));
    }

    #[test]
    fn test_first_match_missing_release_date() {
        let candidates = vec![movie(1, "Inception", None)];
        assert!(select_first_match(&RawGuess::movie("Inception", Some(2010)), &candidates).is_none());
        assert!(select_first_match(&RawGuess::movie("Inception", None), &candidates).is_some());
    }

    #[tokio::test]
    async fn test_match_movie_confirms_candidate() {
        let catalog = Arc::new(MockExternalCatalog::new());
        let inception = movie(27205, "Inception", Some("2010-07-16"));
        catalog
            .set_search_results("Inception", vec![inception.clone()])
            .await;
        catalog.add_movie(inception).await;

        let matcher = CandidateMatcher::new(catalog);
        let outcome = matcher
            .match_movie(&RawGuess::movie("Inception", Some(2010)))
            .await;
        assert_eq!(
            outcome,
            MatchOutcome::Found(Identification::MovieByTmdbId { tmdb_id: 27205 })
        );
    }

    #[tokio::test]
    async fn test_match_movie_search_failure() {
        let catalog = Arc::new(MockExternalCatalog::new());
        catalog
            .set_next_error(ExternalCatalogError::RateLimitExceeded)
            .await;

        let matcher = CandidateMatcher::new(catalog);
        let outcome = matcher.match_movie(&RawGuess::movie("Inception", None)).await;
        assert!(matches!(outcome, MatchOutcome::LookupFailed(_)));
    }

    #[tokio::test]
    async fn test_match_episode_prefers_title_with_year() {
        let catalog = Arc::new(MockExternalCatalog::new());
        catalog
            .add_series("Doctor Who (2005)", fixtures::tvdb_series(78804, "Doctor Who (2005)"))
            .await;
        catalog
            .add_series("Doctor Who", fixtures::tvdb_series(76107, "Doctor Who"))
            .await;

        let matcher = CandidateMatcher::new(catalog);
        let guess = RawGuess::episode(
            "Doctor Who",
            Some(2005),
            Some(1),
            Some(EpisodeNumber::Single(3)),
        );
        assert_eq!(
            matcher.match_episode(&guess, None).await,
            MatchOutcome::Found(Identification::TvEpisode {
                tvdb_id: 78804,
                season: 1,
                episode: 3
            })
        );
    }

    #[tokio::test]
    async fn test_match_episode_retries_bare_title() {
        let catalog = Arc::new(MockExternalCatalog::new());
        catalog
            .add_series("Futurama", fixtures::tvdb_series(73871, "Futurama"))
            .await;

        let matcher = CandidateMatcher::new(catalog);
        let guess = RawGuess::episode(
            "Futurama",
            Some(1999),
            Some(3),
            Some(EpisodeNumber::Multi(vec![7, 8])),
        );
        assert_eq!(
            matcher.match_episode(&guess, None).await,
            MatchOutcome::Found(Identification::TvEpisode {
                tvdb_id: 73871,
                season: 3,
                episode: 7
            })
        );
    }

    #[tokio::test]
    async fn test_match_episode_uses_hint() {
        let catalog = Arc::new(MockExternalCatalog::new());
        catalog
            .add_series("Breaking Bad", fixtures::tvdb_series(81189, "Breaking Bad"))
            .await;

        let matcher = CandidateMatcher::new(catalog.clone());
        let guess = RawGuess::episode("Braking Bad", None, Some(2), Some(EpisodeNumber::Single(5)));
        let outcome = matcher.match_episode(&guess, Some(81189)).await;
        assert_eq!(
            outcome,
            MatchOutcome::Found(Identification::TvEpisode {
                tvdb_id: 81189,
                season: 2,
                episode: 5
            })
        );
    }

    #[tokio::test]
    async fn test_match_episode_without_numbers() {
        let matcher = CandidateMatcher::new(Arc::new(MockExternalCatalog::new()));
        let guess = RawGuess::episode("Futurama", None, None, None);
        assert_eq!(matcher.match_episode(&guess, None).await, MatchOutcome::NotFound);
    }
}
