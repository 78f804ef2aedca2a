//! TMDB (The Movie Database) API client.
//!
//! TMDB requires an API key for access.
//! Rate limits are generous (around 40 requests per second).

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::TmdbMovie;
use super::ExternalCatalogError;

/// TMDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// TMDB API key (required).
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
}

/// TMDB API client.
pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    image_base_url: String,
    language: String,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig, language: &str) -> Result<Self, ExternalCatalogError> {
        if config.api_key.is_empty() {
            return Err(ExternalCatalogError::NotConfigured(
                "TMDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());

        let image_base_url = config
            .image_base_url
            .unwrap_or_else(|| "https://image.tmdb.org/t/p/original".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            image_base_url,
            language: language.to_string(),
        })
    }

    /// Search for movies by title, keeping TMDB's relevance order.
    pub async fn search_movies(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TmdbMovie>, ExternalCatalogError> {
        let url = format!("{}/search/movie", self.base_url);

        debug!("TMDB movie search: query='{}', limit={}", query, limit);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        let response = check_status(response, || format!("search '{}'", query)).await?;

        let search_result: TmdbSearchResponse =
            response.json().await.map_err(|e| {
                ExternalCatalogError::ParseError(format!(
                    "Failed to parse movie search response: {}",
                    e
                ))
            })?;

        let movies = search_result
            .results
            .into_iter()
            .take(limit)
            .map(|r| self.movie_from_result(r))
            .collect();

        Ok(movies)
    }

    /// Get a specific movie by TMDB ID.
    pub async fn get_movie(&self, tmdb_id: u32) -> Result<TmdbMovie, ExternalCatalogError> {
        let url = format!("{}/movie/{}", self.base_url, tmdb_id);

        debug!("TMDB get movie: id={}", tmdb_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        let response = check_status(response, || format!("Movie ID {}", tmdb_id)).await?;

        let movie: TmdbMovieDetails = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse movie response: {}", e))
        })?;

        Ok(self.movie_from_details(movie))
    }

    /// Resolve an IMDB ID to the full TMDB movie.
    pub async fn find_by_imdb(&self, imdb_id: &str) -> Result<TmdbMovie, ExternalCatalogError> {
        let url = format!("{}/find/{}", self.base_url, imdb_id);

        debug!("TMDB find: imdb_id={}", imdb_id);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("external_source", "imdb_id"),
            ])
            .send()
            .await?;

        let response = check_status(response, || format!("IMDB ID {}", imdb_id)).await?;

        let found: TmdbFindResponse = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse find response: {}", e))
        })?;

        let first = found
            .movie_results
            .into_iter()
            .next()
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("IMDB ID {}", imdb_id)))?;

        self.get_movie(first.id).await
    }

    fn image_url(&self, path: Option<String>) -> Option<String> {
        path.map(|p| format!("{}{}", self.image_base_url, p))
    }

    fn movie_from_result(&self, r: TmdbMovieResult) -> TmdbMovie {
        TmdbMovie {
            id: r.id,
            title: r.title,
            original_title: r.original_title,
            release_date: r.release_date,
            imdb_id: None, // Not available in search results
            tagline: None,
            overview: r.overview,
            poster_url: self.image_url(r.poster_path),
            genres: vec![],
        }
    }

    fn movie_from_details(&self, d: TmdbMovieDetails) -> TmdbMovie {
        TmdbMovie {
            id: d.id,
            title: d.title,
            original_title: d.original_title,
            release_date: d.release_date,
            imdb_id: d.imdb_id,
            tagline: d.tagline,
            overview: d.overview,
            poster_url: self.image_url(d.poster_path),
            genres: d.genres.into_iter().map(|g| g.name).collect(),
        }
    }
}

async fn check_status(
    response: Response,
    what: impl FnOnce() -> String,
) -> Result<Response, ExternalCatalogError> {
    let status = response.status();
    if status == 401 {
        return Err(ExternalCatalogError::NotConfigured(
            "Invalid TMDB API key".to_string(),
        ));
    }
    if status == 404 {
        return Err(ExternalCatalogError::NotFound(what()));
    }
    if status == 429 {
        return Err(ExternalCatalogError::RateLimitExceeded);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ExternalCatalogError::ApiError {
            status: status.as_u16(),
            message: body,
        });
    }
    Ok(response)
}

// ============================================================================
// TMDB API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    #[serde(default)]
    movie_results: Vec<TmdbMovieResult>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieResult {
    id: u32,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    id: u32,
    title: String,
    original_title: Option<String>,
    release_date: Option<String>,
    imdb_id: Option<String>,
    tagline: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}
