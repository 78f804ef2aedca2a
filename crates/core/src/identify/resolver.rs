//! Resolution of a file's identification.
//!
//! Combines explicit IDs, filename guessing and operator input into one
//! [`Identification`]. Resolution moves through a small set of states:
//!
//! ```text
//! Start ──explicit──────────────────────────────────────────▶ Done
//!   │
//!   ▼
//! GuessAttempted ──silent──────────────────────────────────▶ Done
//!   │ interactive
//!   ├── guess found, operator confirms ──▶ AutoAccepted ────▶ Done
//!   └── otherwise ───────────────────────▶ ManualOverride ──▶ Done
//! ```

use std::path::Path;
use tracing::{debug, info, warn};

use super::guesser::FilenameGuesser;
use super::matcher::CandidateMatcher;
use super::prompt::{
    ask_choice, ask_number, ask_value, ask_yes_no, ManualChoice, PromptError, Prompter,
};
use super::types::{Identification, MatchOutcome, MediaKind};

/// Whether the operator may be asked questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Silent,
    Interactive,
}

/// Input to [`Resolver::resolve`].
#[derive(Debug, Clone)]
pub struct ResolveRequest<'a> {
    /// File to guess from. `None` skips guessing.
    pub path: Option<&'a Path>,
    pub mode: Mode,
    /// When false, resolution ends at [`Identification::Untagged`].
    pub tagging_enabled: bool,
    /// A complete identification supplied up front.
    pub explicit: Option<Identification>,
    /// TVDB series ID to use when the guess is an episode.
    pub tvdb_hint: Option<u32>,
}

impl<'a> ResolveRequest<'a> {
    pub fn new(path: Option<&'a Path>, mode: Mode) -> Self {
        Self {
            path,
            mode,
            tagging_enabled: true,
            explicit: None,
            tvdb_hint: None,
        }
    }

    pub fn with_tagging(mut self, enabled: bool) -> Self {
        self.tagging_enabled = enabled;
        self
    }

    pub fn with_explicit(mut self, explicit: Option<Identification>) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_tvdb_hint(mut self, hint: Option<u32>) -> Self {
        self.tvdb_hint = hint;
        self
    }
}

/// States of a single resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ResolutionState {
    Start,
    GuessAttempted(Option<Identification>),
    AutoAccepted(Identification),
    ManualOverride,
    Done(Identification),
}

/// Resolves identifications, one file at a time.
pub struct Resolver {
    guesser: FilenameGuesser,
    matcher: CandidateMatcher,
    prompter: Box<dyn Prompter>,
}

impl Resolver {
    pub fn new(
        guesser: FilenameGuesser,
        matcher: CandidateMatcher,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            guesser,
            matcher,
            prompter,
        }
    }

    /// Resolve the identification for one request.
    pub async fn resolve(&mut self, request: ResolveRequest<'_>) -> Identification {
        let mut state = ResolutionState::Start;

        loop {
            debug!(state = ?state, "Resolution step");
            state = match state {
                ResolutionState::Start => {
                    if !request.tagging_enabled {
                        ResolutionState::Done(Identification::Untagged)
                    } else if let Some(explicit) = request.explicit.clone() {
                        info!(identification = %explicit, "Using supplied identification");
                        ResolutionState::Done(explicit)
                    } else {
                        let guessed = match request.path {
                            Some(path) => self.guess(path, request.tvdb_hint).await,
                            None => None,
                        };
                        ResolutionState::GuessAttempted(guessed)
                    }
                }
                ResolutionState::GuessAttempted(guessed) => match (request.mode, guessed) {
                    (Mode::Silent, Some(id)) => ResolutionState::Done(id),
                    (Mode::Silent, None) => ResolutionState::Done(Identification::Untagged),
                    (Mode::Interactive, Some(id)) => {
                        self.prompter
                            .say("Proceed using guessed identification from filename?");
                        match ask_yes_no(self.prompter.as_mut()) {
                            Ok(true) => ResolutionState::AutoAccepted(id),
                            Ok(false) => ResolutionState::ManualOverride,
                            Err(e) => skip_on(e),
                        }
                    }
                    (Mode::Interactive, None) => {
                        self.prompter.say(
                            "Unable to determine identity based on filename, must enter manually",
                        );
                        ResolutionState::ManualOverride
                    }
                },
                ResolutionState::AutoAccepted(id) => ResolutionState::Done(id),
                ResolutionState::ManualOverride => match self.manual_entry() {
                    Ok(id) => ResolutionState::Done(id),
                    Err(e) => skip_on(e),
                },
                ResolutionState::Done(id) => {
                    info!(identification = %id, "Resolved identification");
                    return id;
                }
            };
        }
    }

    /// Guess from the filename and look the guess up.
    ///
    /// Any failure along the way is logged and yields `None`.
    async fn guess(&mut self, path: &Path, tvdb_hint: Option<u32>) -> Option<Identification> {
        let guess = match self.guesser.guess(path) {
            Ok(guess) => guess,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Guessing title failed");
                return None;
            }
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.prompter.say(&format!(
            "Guessing title of '{}' for file '{}'",
            guess, file_name
        ));

        let outcome = match (guess.kind, tvdb_hint) {
            (MediaKind::Movie, Some(hint)) => {
                warn!(
                    tvdb_id = hint,
                    "Guess returned movie type even though a TVDB ID was given"
                );
                MatchOutcome::NotFound
            }
            (MediaKind::Movie, None) => self.matcher.match_movie(&guess).await,
            (MediaKind::Episode, hint) => self.matcher.match_episode(&guess, hint).await,
        };

        match outcome {
            MatchOutcome::Found(id) => Some(id),
            MatchOutcome::NotFound => None,
            MatchOutcome::LookupFailed(reason) => {
                warn!(reason = %reason, "Guessing title failed");
                None
            }
        }
    }

    fn manual_entry(&mut self) -> Result<Identification, PromptError> {
        let prompter = self.prompter.as_mut();
        let id = match ask_choice(prompter)? {
            ManualChoice::ImdbMovie => Identification::MovieByImdbId {
                imdb_id: ask_value(prompter, "Enter IMDB ID", false)?,
            },
            ManualChoice::TmdbMovie => Identification::MovieByTmdbId {
                tmdb_id: ask_number(prompter, "Enter TMDB ID")?,
            },
            ManualChoice::TvEpisode => Identification::TvEpisode {
                tvdb_id: ask_number(prompter, "Enter TVDB Series ID")?,
                season: ask_number(prompter, "Enter Season Number")?,
                episode: ask_number(prompter, "Enter Episode Number")?,
            },
            ManualChoice::ConvertOnly => Identification::Untagged,
            ManualChoice::Skip => Identification::Skip,
        };
        Ok(id)
    }
}

fn skip_on(error: PromptError) -> ResolutionState {
    warn!(error = %error, "No usable answer from operator, skipping file");
    ResolutionState::Done(Identification::Skip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identify::prompt::ScriptedPrompter;
    use crate::testing::{fixtures, MockExternalCatalog};
    use std::path::PathBuf;
    use std::sync::Arc;

    async fn catalog_with_inception() -> Arc<MockExternalCatalog> {
        let catalog = Arc::new(MockExternalCatalog::new());
        let inception = fixtures::tmdb_movie(27205, "Inception", 2010);
        catalog
            .set_search_results("Inception", vec![inception.clone()])
            .await;
        catalog.add_movie(inception).await;
        catalog
    }

    fn resolver(catalog: Arc<MockExternalCatalog>, answers: &[&str]) -> Resolver {
        Resolver::new(
            FilenameGuesser::heuristic(false),
            CandidateMatcher::new(catalog),
            Box::new(ScriptedPrompter::new(answers.iter().copied())),
        )
    }

    fn inception_path() -> PathBuf {
        PathBuf::from("/downloads/Inception.2010.1080p.mkv")
    }

    #[tokio::test]
    async fn test_silent_accepts_guess() {
        let mut r = resolver(catalog_with_inception().await, &[]);
        let path = inception_path();
        let id = r
            .resolve(ResolveRequest::new(Some(&path), Mode::Silent))
            .await;
        assert_eq!(id, Identification::MovieByTmdbId { tmdb_id: 27205 });
    }

    #[tokio::test]
    async fn test_silent_without_match_is_untagged() {
        let mut r = resolver(Arc::new(MockExternalCatalog::new()), &[]);
        let path = inception_path();
        let id = r
            .resolve(ResolveRequest::new(Some(&path), Mode::Silent))
            .await;
        assert_eq!(id, Identification::Untagged);
    }

    #[tokio::test]
    async fn test_tagging_disabled_is_untagged() {
        let mut r = resolver(catalog_with_inception().await, &[]);
        let path = inception_path();
        let id = r
            .resolve(
                ResolveRequest::new(Some(&path), Mode::Interactive)
                    .with_tagging(false)
                    .with_explicit(Some(Identification::MovieByTmdbId { tmdb_id: 1 })),
            )
            .await;
        assert_eq!(id, Identification::Untagged);
    }

    #[tokio::test]
    async fn test_explicit_short_circuits() {
        let mut r = resolver(catalog_with_inception().await, &[]);
        let path = inception_path();
        let explicit = Identification::TvEpisode {
            tvdb_id: 81189,
            season: 1,
            episode: 2,
        };
        let id = r
            .resolve(
                ResolveRequest::new(Some(&path), Mode::Interactive)
                    .with_explicit(Some(explicit.clone())),
            )
            .await;
        assert_eq!(id, explicit);
    }

    #[tokio::test]
    async fn test_interactive_confirms_guess() {
        let mut r = resolver(catalog_with_inception().await, &["y"]);
        let path = inception_path();
        let id = r
            .resolve(ResolveRequest::new(Some(&path), Mode::Interactive))
            .await;
        assert_eq!(id, Identification::MovieByTmdbId { tmdb_id: 27205 });
    }

    #[tokio::test]
    async fn test_interactive_rejects_guess_and_enters_tv() {
        let mut r = resolver(
            catalog_with_inception().await,
            &["n", "3", "81189", "2", "5"],
        );
        let path = inception_path();
        let id = r
            .resolve(ResolveRequest::new(Some(&path), Mode::Interactive))
            .await;
        assert_eq!(
            id,
            Identification::TvEpisode {
                tvdb_id: 81189,
                season: 2,
                episode: 5
            }
        );
    }

    #[tokio::test]
    async fn test_interactive_manual_choices() {
        let path = inception_path();
        let cases: [(&[&str], Identification); 4] = [
            (
                &["1", "tt1375666"],
                Identification::MovieByImdbId {
                    imdb_id: "tt1375666".to_string(),
                },
            ),
            (&["2", "x", "27205"], Identification::MovieByTmdbId { tmdb_id: 27205 }),
            (&["4"], Identification::Untagged),
            (&["5"], Identification::Skip),
        ];
        for (answers, expected) in cases {
            let mut r = resolver(Arc::new(MockExternalCatalog::new()), answers);
            let id = r
                .resolve(ResolveRequest::new(Some(&path), Mode::Interactive))
                .await;
            assert_eq!(id, expected);
        }
    }

    #[tokio::test]
    async fn test_closed_input_skips() {
        let mut r = resolver(Arc::new(MockExternalCatalog::new()), &[]);
        let id = r
            .resolve(ResolveRequest::new(None, Mode::Interactive))
            .await;
        assert_eq!(id, Identification::Skip);
    }

    #[tokio::test]
    async fn test_movie_guess_with_tvdb_hint_goes_manual() {
        let mut r = resolver(catalog_with_inception().await, &["5"]);
        let path = inception_path();
        let id = r
            .resolve(
                ResolveRequest::new(Some(&path), Mode::Interactive).with_tvdb_hint(Some(81189)),
            )
            .await;
        assert_eq!(id, Identification::Skip);
    }
}
