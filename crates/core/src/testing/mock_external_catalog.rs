//! Mock external catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::external_catalog::{
    ExternalCatalog, ExternalCatalogError, TmdbMovie, TvdbEpisode, TvdbSeries,
};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogQuery {
    SearchMovies { query: String, limit: usize },
    GetMovie { tmdb_id: u32 },
    FindByImdb { imdb_id: String },
    LookupSeries { name: String },
    GetSeries { tvdb_id: u32 },
    GetEpisode { tvdb_id: u32, season: u32, episode: u32 },
}

/// Mock implementation of the ExternalCatalog trait.
///
/// Search results are returned in the order they were set, so first-match
/// behavior can be exercised directly.
///
/// # Example
///
/// ```rust,ignore
/// use reeltag_core::testing::{fixtures, MockExternalCatalog};
///
/// let catalog = MockExternalCatalog::new();
/// let movie = fixtures::tmdb_movie(27205, "Inception", 2010);
/// catalog.set_search_results("Inception", vec![movie.clone()]).await;
/// catalog.add_movie(movie).await;
/// ```
#[derive(Debug)]
pub struct MockExternalCatalog {
    /// Search results by exact query.
    search_results: Arc<RwLock<HashMap<String, Vec<TmdbMovie>>>>,
    /// Movies by TMDB ID.
    movies: Arc<RwLock<HashMap<u32, TmdbMovie>>>,
    /// Movies by IMDB ID.
    imdb_index: Arc<RwLock<HashMap<String, TmdbMovie>>>,
    /// Series by lookup name.
    series_by_name: Arc<RwLock<HashMap<String, TvdbSeries>>>,
    /// Series by TVDB ID.
    series: Arc<RwLock<HashMap<u32, TvdbSeries>>>,
    /// Episodes by (series, season, episode).
    episodes: Arc<RwLock<HashMap<(u32, u32, u32), TvdbEpisode>>>,
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ExternalCatalogError>>>,
}

impl Default for MockExternalCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExternalCatalog {
    /// Create a new empty mock external catalog.
    pub fn new() -> Self {
        Self {
            search_results: Arc::new(RwLock::new(HashMap::new())),
            movies: Arc::new(RwLock::new(HashMap::new())),
            imdb_index: Arc::new(RwLock::new(HashMap::new())),
            series_by_name: Arc::new(RwLock::new(HashMap::new())),
            series: Arc::new(RwLock::new(HashMap::new())),
            episodes: Arc::new(RwLock::new(HashMap::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // TMDB Configuration
    // =========================================================================

    /// Set the ordered results for a movie search query.
    pub async fn set_search_results(&self, query: &str, results: Vec<TmdbMovie>) {
        self.search_results
            .write()
            .await
            .insert(query.to_string(), results);
    }

    /// Add a movie, reachable by TMDB ID and by its IMDB ID when it has one.
    pub async fn add_movie(&self, movie: TmdbMovie) {
        if let Some(imdb_id) = &movie.imdb_id {
            self.imdb_index
                .write()
                .await
                .insert(imdb_id.clone(), movie.clone());
        }
        self.movies.write().await.insert(movie.id, movie);
    }

    // =========================================================================
    // TVDB Configuration
    // =========================================================================

    /// Add a series, found by `lookup_name` and by its ID.
    pub async fn add_series(&self, lookup_name: &str, series: TvdbSeries) {
        self.series_by_name
            .write()
            .await
            .insert(lookup_name.to_string(), series.clone());
        self.series.write().await.insert(series.id, series);
    }

    /// Add an episode of a series.
    pub async fn add_episode(&self, tvdb_id: u32, episode: TvdbEpisode) {
        self.episodes.write().await.insert(
            (tvdb_id, episode.season_number, episode.episode_number),
            episode,
        );
    }

    // =========================================================================
    // Error Simulation
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ExternalCatalogError) {
        *self.next_error.write().await = Some(error);
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    async fn record(&self, query: RecordedCatalogQuery) -> Result<(), ExternalCatalogError> {
        self.queries.write().await.push(query);
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ExternalCatalog for MockExternalCatalog {
    async fn search_movies(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TmdbMovie>, ExternalCatalogError> {
        self.record(RecordedCatalogQuery::SearchMovies {
            query: query.to_string(),
            limit,
        })
        .await?;

        let results = self.search_results.read().await;
        Ok(results
            .get(query)
            .map(|movies| movies.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_movie(&self, tmdb_id: u32) -> Result<TmdbMovie, ExternalCatalogError> {
        self.record(RecordedCatalogQuery::GetMovie { tmdb_id }).await?;

        self.movies
            .read()
            .await
            .get(&tmdb_id)
            .cloned()
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("Movie {}", tmdb_id)))
    }

    async fn find_movie_by_imdb(&self, imdb_id: &str) -> Result<TmdbMovie, ExternalCatalogError> {
        self.record(RecordedCatalogQuery::FindByImdb {
            imdb_id: imdb_id.to_string(),
        })
        .await?;

        self.imdb_index
            .read()
            .await
            .get(imdb_id)
            .cloned()
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("IMDB {}", imdb_id)))
    }

    async fn lookup_series(&self, name: &str) -> Result<Option<TvdbSeries>, ExternalCatalogError> {
        self.record(RecordedCatalogQuery::LookupSeries {
            name: name.to_string(),
        })
        .await?;

        Ok(self.series_by_name.read().await.get(name).cloned())
    }

    async fn get_series(&self, tvdb_id: u32) -> Result<TvdbSeries, ExternalCatalogError> {
        self.record(RecordedCatalogQuery::GetSeries { tvdb_id }).await?;

        self.series
            .read()
            .await
            .get(&tvdb_id)
            .cloned()
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("Series {}", tvdb_id)))
    }

    async fn get_episode(
        &self,
        tvdb_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<TvdbEpisode, ExternalCatalogError> {
        self.record(RecordedCatalogQuery::GetEpisode {
            tvdb_id,
            season,
            episode,
        })
        .await?;

        self.episodes
            .read()
            .await
            .get(&(tvdb_id, season, episode))
            .cloned()
            .ok_or_else(|| {
                ExternalCatalogError::NotFound(format!(
                    "Series {} S{:02}E{:02}",
                    tvdb_id, season, episode
                ))
            })
    }
}
