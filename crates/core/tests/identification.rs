//! Identification integration tests.
//!
//! Drive the resolver with the shipped filename heuristics against a mock
//! catalog, covering:
//! - First-match selection among search candidates
//! - Silent acceptance of guesses
//! - Manual entry after a rejected guess

use std::path::Path;
use std::sync::Arc;

use reeltag_core::identify::{
    select_first_match, CandidateMatcher, FilenameGuesser, Identification, Mode, RawGuess,
    ResolveRequest, Resolver, ScriptedPrompter,
};
use reeltag_core::testing::{fixtures, MockExternalCatalog, RecordedCatalogQuery};

fn resolver(catalog: Arc<MockExternalCatalog>, answers: &[&str]) -> Resolver {
    Resolver::new(
        FilenameGuesser::heuristic(false),
        CandidateMatcher::new(catalog),
        Box::new(ScriptedPrompter::new(answers.iter().copied())),
    )
}

#[test]
fn first_qualifying_candidate_wins() {
    let candidates = vec![
        fixtures::tmdb_movie(1, "Inception 2", 2010),
        fixtures::tmdb_movie(27205, "Inception", 2010),
        fixtures::tmdb_movie(3, "Inception", 2010),
    ];

    let chosen = select_first_match(&RawGuess::movie("Inception", Some(2010)), &candidates);
    assert_eq!(chosen.map(|m| m.id), Some(27205));
}

#[test]
fn guess_without_year_accepts_any_year() {
    let candidates = vec![fixtures::tmdb_movie(8, "Solaris", 1972)];
    let chosen = select_first_match(&RawGuess::movie("Solaris", None), &candidates);
    assert_eq!(chosen.map(|m| m.id), Some(8));
}

#[tokio::test]
async fn silent_mode_accepts_guess_without_prompting() {
    let catalog = Arc::new(MockExternalCatalog::new());
    let wrong = fixtures::tmdb_movie(1, "Inception 2", 2010);
    let right = fixtures::tmdb_movie(27205, "Inception", 2010);
    catalog
        .set_search_results("Inception", vec![wrong, right.clone()])
        .await;
    catalog.add_movie(right).await;

    // No scripted answers: any prompt would end in a skip.
    let mut resolver = resolver(catalog.clone(), &[]);
    let path = Path::new("/downloads/Inception.2010.1080p.BluRay.x264.mkv");
    let id = resolver
        .resolve(ResolveRequest::new(Some(path), Mode::Silent))
        .await;

    assert_eq!(id, Identification::MovieByTmdbId { tmdb_id: 27205 });
    assert!(catalog
        .recorded_queries()
        .await
        .contains(&RecordedCatalogQuery::GetMovie { tmdb_id: 27205 }));
}

#[tokio::test]
async fn silent_mode_episode_guess() {
    let catalog = Arc::new(MockExternalCatalog::new());
    catalog
        .add_series("Breaking Bad", fixtures::tvdb_series(81189, "Breaking Bad"))
        .await;

    let mut resolver = resolver(catalog, &[]);
    let path = Path::new("/downloads/Breaking.Bad.S02E05.720p.HDTV.mkv");
    let id = resolver
        .resolve(ResolveRequest::new(Some(path), Mode::Silent))
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
async fn catalog_outage_leaves_file_untagged_in_silent_mode() {
    let catalog = Arc::new(MockExternalCatalog::new());
    catalog
        .set_next_error(reeltag_core::external_catalog::ExternalCatalogError::RateLimitExceeded)
        .await;

    let mut resolver = resolver(catalog, &[]);
    let id = resolver
        .resolve(ResolveRequest::new(
            Some(Path::new("/downloads/Inception.2010.mkv")),
            Mode::Silent,
        ))
        .await;
    assert_eq!(id, Identification::Untagged);
}

#[tokio::test]
async fn rejected_guess_goes_to_manual_entry_with_reprompts() {
    let catalog = Arc::new(MockExternalCatalog::new());
    let inception = fixtures::tmdb_movie(27205, "Inception", 2010);
    catalog
        .set_search_results("Inception", vec![inception.clone()])
        .await;
    catalog.add_movie(inception).await;

    // "n" rejects the guess, "9" and "tv" are invalid menu picks, "x1" an
    // invalid number.
    let answers = ["n", "9", "tv", "2", "x1", "603"];
    let mut resolver = resolver(catalog, &answers);
    let id = resolver
        .resolve(ResolveRequest::new(
            Some(Path::new("/downloads/Inception.2010.mkv")),
            Mode::Interactive,
        ))
        .await;

    assert_eq!(id, Identification::MovieByTmdbId { tmdb_id: 603 });
}
