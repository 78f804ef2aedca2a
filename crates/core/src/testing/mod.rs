//! Testing utilities and mock implementations.
//!
//! Every collaborator trait has a mock here, so the whole pipeline can be
//! driven without ffmpeg, network access or real media files.
//!
//! # Example
//!
//! ```rust,ignore
//! use reeltag_core::testing::{fixtures, MockConverter, MockExternalCatalog};
//!
//! let catalog = MockExternalCatalog::new();
//! catalog.add_movie(fixtures::tmdb_movie(27205, "Inception", 2010)).await;
//!
//! let converter = MockConverter::new();
//! converter.reject_extension("txt").await;
//! ```

mod mock_converter;
mod mock_external_catalog;
mod mock_placer;
mod mock_post_processor;
mod mock_tag_store;
mod mock_tag_writer;

pub use crate::identify::ScriptedPrompter;
pub use mock_converter::MockConverter;
pub use mock_external_catalog::{MockExternalCatalog, RecordedCatalogQuery};
pub use mock_placer::{MockPlacer, RecordedPlacement};
pub use mock_post_processor::MockPostProcessor;
pub use mock_tag_store::MockTagStore;
pub use mock_tag_writer::{MockTagWriterFactory, RecordedTagWrite};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::external_catalog::{TmdbMovie, TvdbEpisode, TvdbSeries};

    /// Create a test TMDB movie released in `year`.
    pub fn tmdb_movie(id: u32, title: &str, year: u32) -> TmdbMovie {
        TmdbMovie {
            id,
            title: title.to_string(),
            original_title: None,
            release_date: Some(format!("{}-07-16", year)),
            imdb_id: None,
            tagline: None,
            overview: Some(format!("A movie about {}.", title.to_lowercase())),
            poster_url: None,
            genres: vec!["Drama".to_string(), "Thriller".to_string()],
        }
    }

    /// Create a test TVDB series.
    pub fn tvdb_series(id: u32, name: &str) -> TvdbSeries {
        TvdbSeries {
            id,
            name: name.to_string(),
            year: None,
            overview: Some(format!("A TV series about {}.", name.to_lowercase())),
            poster_url: None,
            network: None,
            genres: vec!["Drama".to_string()],
        }
    }

    /// Create a test TVDB episode.
    pub fn tvdb_episode(season: u32, episode: u32, name: &str) -> TvdbEpisode {
        TvdbEpisode {
            id: season * 1000 + episode,
            season_number: season,
            episode_number: episode,
            name: Some(name.to_string()),
            overview: Some(format!("Episode {} of season {}.", episode, season)),
            aired: Some(format!("2020-01-{:02}", episode.clamp(1, 28))),
            still_url: None,
        }
    }
}
