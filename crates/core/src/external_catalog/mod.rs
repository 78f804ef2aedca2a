//! External catalog integration for TMDB (movies) and TheTVDB (series).
//!
//! The identification engine searches these catalogs to turn a filename
//! guess into an ID, and the metadata tag writer fetches the details it
//! embeds into converted files.

mod tmdb;
mod tvdb;
mod types;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use tvdb::{TvdbClient, TvdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when interacting with external catalogs.
#[derive(Debug, Error)]
pub enum ExternalCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Trait for external catalog clients.
#[async_trait]
pub trait ExternalCatalog: Send + Sync {
    // TMDB operations

    /// Search for movies by title. Results are in relevance order and at
    /// most `limit` long.
    async fn search_movies(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TmdbMovie>, ExternalCatalogError>;

    /// Get a specific movie by TMDB ID.
    async fn get_movie(&self, tmdb_id: u32) -> Result<TmdbMovie, ExternalCatalogError>;

    /// Resolve a movie by its IMDB ID.
    async fn find_movie_by_imdb(&self, imdb_id: &str) -> Result<TmdbMovie, ExternalCatalogError>;

    // TVDB operations

    /// Exact-or-best series lookup by name. `None` when nothing matches.
    async fn lookup_series(&self, name: &str) -> Result<Option<TvdbSeries>, ExternalCatalogError>;

    /// Get a specific series by TVDB ID.
    async fn get_series(&self, tvdb_id: u32) -> Result<TvdbSeries, ExternalCatalogError>;

    /// Get an episode by series, season and episode number.
    async fn get_episode(
        &self,
        tvdb_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<TvdbEpisode, ExternalCatalogError>;
}

/// Combined external catalog client that delegates to appropriate backends.
pub struct CombinedCatalogClient {
    tmdb: Option<TmdbClient>,
    tvdb: Option<TvdbClient>,
}

impl CombinedCatalogClient {
    /// Create a new combined client with optional backends.
    pub fn new(tmdb: Option<TmdbClient>, tvdb: Option<TvdbClient>) -> Self {
        Self { tmdb, tvdb }
    }

    /// Check if TMDB is available.
    pub fn has_tmdb(&self) -> bool {
        self.tmdb.is_some()
    }

    /// Check if TVDB is available.
    pub fn has_tvdb(&self) -> bool {
        self.tvdb.is_some()
    }

    fn tmdb(&self) -> Result<&TmdbClient, ExternalCatalogError> {
        self.tmdb.as_ref().ok_or_else(|| {
            ExternalCatalogError::NotConfigured("TMDB client not configured".to_string())
        })
    }

    fn tvdb(&self) -> Result<&TvdbClient, ExternalCatalogError> {
        self.tvdb.as_ref().ok_or_else(|| {
            ExternalCatalogError::NotConfigured("TVDB client not configured".to_string())
        })
    }
}

#[async_trait]
impl ExternalCatalog for CombinedCatalogClient {
    async fn search_movies(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TmdbMovie>, ExternalCatalogError> {
        self.tmdb()?.search_movies(query, limit).await
    }

    async fn get_movie(&self, tmdb_id: u32) -> Result<TmdbMovie, ExternalCatalogError> {
        self.tmdb()?.get_movie(tmdb_id).await
    }

    async fn find_movie_by_imdb(&self, imdb_id: &str) -> Result<TmdbMovie, ExternalCatalogError> {
        self.tmdb()?.find_by_imdb(imdb_id).await
    }

    async fn lookup_series(&self, name: &str) -> Result<Option<TvdbSeries>, ExternalCatalogError> {
        self.tvdb()?.lookup_series(name).await
    }

    async fn get_series(&self, tvdb_id: u32) -> Result<TvdbSeries, ExternalCatalogError> {
        self.tvdb()?.get_series(tvdb_id).await
    }

    async fn get_episode(
        &self,
        tvdb_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<TvdbEpisode, ExternalCatalogError> {
        self.tvdb()?.get_episode(tvdb_id, season, episode).await
    }
}
