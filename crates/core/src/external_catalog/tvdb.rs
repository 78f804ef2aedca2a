//! TheTVDB (v4) API client.
//!
//! Every request carries a bearer token obtained from `/login` with the
//! project API key; the token is requested lazily and cached for the
//! lifetime of the client.
//!
//! Series and episode text is requested in the configured language and
//! falls back to the series' default language when TVDB has no translation.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::types::{TvdbEpisode, TvdbSeries};
use super::ExternalCatalogError;

/// TVDB API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvdbConfig {
    /// TVDB project API key (required).
    pub api_key: String,
    /// Subscriber PIN, for user-supported keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    /// Base URL (default: https://api4.thetvdb.com/v4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// TVDB API client.
pub struct TvdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    pin: Option<String>,
    /// TVDB (ISO 639-2) code for translated records.
    language: Option<String>,
    token: RwLock<Option<String>>,
}

impl TvdbClient {
    /// Create a new TVDB client returning text in `language` (ISO 639-1
    /// or 639-2) where TVDB has it.
    pub fn new(config: TvdbConfig, language: &str) -> Result<Self, ExternalCatalogError> {
        if config.api_key.is_empty() {
            return Err(ExternalCatalogError::NotConfigured(
                "TVDB API key is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api4.thetvdb.com/v4".to_string());

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
            pin: config.pin,
            language: tvdb_language(language),
            token: RwLock::new(None),
        })
    }

    async fn token(&self) -> Result<String, ExternalCatalogError> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(token.clone());
        }

        let url = format!("{}/login", self.base_url);
        debug!("TVDB login");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                apikey: &self.api_key,
                pin: self.pin.as_deref(),
            })
            .send()
            .await?;

        let response = check_status(response, || "login".to_string()).await?;
        let login: Envelope<LoginData> = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse login response: {}", e))
        })?;

        *self.token.write().await = Some(login.data.token.clone());
        Ok(login.data.token)
    }

    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: impl FnOnce() -> String,
    ) -> Result<Response, ExternalCatalogError> {
        let token = self.token().await?;
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if response.status() == 401 {
            // Expired tokens are re-requested on the next call.
            *self.token.write().await = None;
        }

        check_status(response, what).await
    }

    /// Search series by name; results keep TVDB's relevance order.
    pub async fn search_series(&self, query: &str) -> Result<Vec<TvdbSeries>, ExternalCatalogError> {
        debug!("TVDB series search: query='{}'", query);

        let response = self
            .get(
                "/search",
                &[("query", query.to_string()), ("type", "series".to_string())],
                || format!("search '{}'", query),
            )
            .await?;

        let results: Envelope<Vec<SearchResult>> = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse series search: {}", e))
        })?;

        Ok(results
            .data
            .into_iter()
            .filter_map(|r| r.into_series())
            .collect())
    }

    /// Exact-or-best lookup: the first result whose name equals the query
    /// (ignoring case), otherwise the first result.
    pub async fn lookup_series(&self, name: &str) -> Result<Option<TvdbSeries>, ExternalCatalogError> {
        let results = self.search_series(name).await?;
        Ok(pick_exact_or_best(results, name))
    }

    /// Get a specific series by TVDB ID.
    pub async fn get_series(&self, tvdb_id: u32) -> Result<TvdbSeries, ExternalCatalogError> {
        debug!("TVDB get series: id={}", tvdb_id);

        let response = self
            .get(&format!("/series/{}/extended", tvdb_id), &[("short", "true".to_string())], || {
                format!("Series ID {}", tvdb_id)
            })
            .await?;

        let series: Envelope<SeriesRecord> = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse series response: {}", e))
        })?;
        let mut series: TvdbSeries = series.data.into();

        if let Some(language) = &self.language {
            match self.series_translation(tvdb_id, language).await {
                Ok(translation) => {
                    if let Some(name) = translation.name {
                        series.name = name;
                    }
                    if translation.overview.is_some() {
                        series.overview = translation.overview;
                    }
                }
                Err(ExternalCatalogError::NotFound(_)) => {
                    debug!(tvdb_id, language = %language, "No series translation");
                }
                Err(e) => {
                    warn!(tvdb_id, language = %language, error = %e, "Series translation failed");
                }
            }
        }

        Ok(series)
    }

    async fn series_translation(
        &self,
        tvdb_id: u32,
        language: &str,
    ) -> Result<Translation, ExternalCatalogError> {
        let response = self
            .get(
                &format!("/series/{}/translations/{}", tvdb_id, language),
                &[],
                || format!("Series {} in '{}'", tvdb_id, language),
            )
            .await?;

        let translation: Envelope<Translation> = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse translation: {}", e))
        })?;
        Ok(translation.data)
    }

    /// Get a single episode by its aired season/episode numbers.
    pub async fn get_episode(
        &self,
        tvdb_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<TvdbEpisode, ExternalCatalogError> {
        debug!(
            "TVDB get episode: series={}, season={}, episode={}",
            tvdb_id, season, episode
        );

        if let Some(language) = &self.language {
            match self
                .fetch_episode(tvdb_id, season, episode, Some(language))
                .await
            {
                Err(ExternalCatalogError::NotFound(_)) => {
                    debug!(tvdb_id, language = %language, "No episode translation");
                }
                result => return result,
            }
        }
        self.fetch_episode(tvdb_id, season, episode, None).await
    }

    async fn fetch_episode(
        &self,
        tvdb_id: u32,
        season: u32,
        episode: u32,
        language: Option<&str>,
    ) -> Result<TvdbEpisode, ExternalCatalogError> {
        let path = match language {
            Some(language) => format!("/series/{}/episodes/default/{}", tvdb_id, language),
            None => format!("/series/{}/episodes/default", tvdb_id),
        };
        let response = self
            .get(
                &path,
                &[
                    ("season", season.to_string()),
                    ("episodeNumber", episode.to_string()),
                ],
                || format!("Series {} S{:02}E{:02}", tvdb_id, season, episode),
            )
            .await?;

        let page: Envelope<EpisodePage> = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse episode response: {}", e))
        })?;

        page.data
            .episodes
            .into_iter()
            .find(|e| e.season_number == season && e.number == episode)
            .map(Into::into)
            .ok_or_else(|| {
                ExternalCatalogError::NotFound(format!(
                    "Series {} S{:02}E{:02}",
                    tvdb_id, season, episode
                ))
            })
    }
}

/// TVDB identifies languages by ISO 639-2 code.
fn tvdb_language(code: &str) -> Option<String> {
    let code = code.trim().to_lowercase();
    let mapped = match code.as_str() {
        "" => return None,
        "en" => "eng",
        "de" => "deu",
        "fr" => "fra",
        "it" => "ita",
        "es" => "spa",
        "pt" => "por",
        "nl" => "nld",
        "sv" => "swe",
        "da" => "dan",
        "no" | "nb" => "nor",
        "fi" => "fin",
        "pl" => "pol",
        "cs" => "ces",
        "hu" => "hun",
        "ru" => "rus",
        "tr" => "tur",
        "el" => "ell",
        "he" => "heb",
        "ja" => "jpn",
        "ko" => "kor",
        "zh" => "zho",
        other if other.len() == 3 => other,
        other => {
            warn!(language = %other, "No TVDB language for this code, using series defaults");
            return None;
        }
    };
    Some(mapped.to_string())
}

fn pick_exact_or_best(results: Vec<TvdbSeries>, name: &str) -> Option<TvdbSeries> {
    let wanted = name.to_lowercase();
    let exact = results
        .iter()
        .position(|s| s.name.to_lowercase() == wanted);
    match exact {
        Some(index) => results.into_iter().nth(index),
        None => results.into_iter().next(),
    }
}

async fn check_status(
    response: Response,
    what: impl FnOnce() -> String,
) -> Result<Response, ExternalCatalogError> {
    let status = response.status();
    if status == 401 {
        return Err(ExternalCatalogError::NotConfigured(
            "TVDB rejected the API key or token".to_string(),
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
// TVDB API Response Types (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    apikey: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    tvdb_id: Option<String>,
    name: Option<String>,
    year: Option<String>,
    overview: Option<String>,
    image_url: Option<String>,
    network: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
}

impl SearchResult {
    fn into_series(self) -> Option<TvdbSeries> {
        Some(TvdbSeries {
            id: self.tvdb_id?.parse().ok()?,
            name: self.name?,
            year: self.year.and_then(|y| y.parse().ok()),
            overview: self.overview,
            poster_url: self.image_url,
            network: self.network,
            genres: self.genres,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SeriesRecord {
    id: u32,
    name: String,
    year: Option<String>,
    overview: Option<String>,
    image: Option<String>,
    #[serde(rename = "originalNetwork")]
    original_network: Option<NamedRecord>,
    #[serde(default)]
    genres: Vec<NamedRecord>,
}

#[derive(Debug, Deserialize)]
struct NamedRecord {
    name: String,
}

impl From<SeriesRecord> for TvdbSeries {
    fn from(s: SeriesRecord) -> Self {
        Self {
            id: s.id,
            name: s.name,
            year: s.year.and_then(|y| y.parse().ok()),
            overview: s.overview,
            poster_url: s.image,
            network: s.original_network.map(|n| n.name),
            genres: s.genres.into_iter().map(|g| g.name).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Translation {
    name: Option<String>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EpisodePage {
    #[serde(default)]
    episodes: Vec<EpisodeRecord>,
}

#[derive(Debug, Deserialize)]
struct EpisodeRecord {
    id: u32,
    name: Option<String>,
    overview: Option<String>,
    aired: Option<String>,
    #[serde(rename = "seasonNumber")]
    season_number: u32,
    number: u32,
    image: Option<String>,
}

impl From<EpisodeRecord> for TvdbEpisode {
    fn from(e: EpisodeRecord) -> Self {
        Self {
            id: e.id,
            season_number: e.season_number,
            episode_number: e.number,
            name: e.name,
            overview: e.overview,
            aired: e.aired,
            still_url: e.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(id: u32, name: &str) -> TvdbSeries {
        TvdbSeries {
            id,
            name: name.to_string(),
            year: None,
            overview: None,
            poster_url: None,
            network: None,
            genres: vec![],
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = TvdbClient::new(
            TvdbConfig {
                api_key: String::new(),
                pin: None,
                base_url: None,
            },
            "en",
        );
        assert!(matches!(result, Err(ExternalCatalogError::NotConfigured(_))));
    }

    #[test]
    fn test_tvdb_language_codes() {
        assert_eq!(tvdb_language("de").as_deref(), Some("deu"));
        assert_eq!(tvdb_language("EN").as_deref(), Some("eng"));
        assert_eq!(tvdb_language("fra").as_deref(), Some("fra"));
        assert_eq!(tvdb_language("xx"), None);
        assert_eq!(tvdb_language(""), None);
    }

    #[test]
    fn test_pick_exact_match_over_first() {
        let results = vec![series(1, "Doctor Who (2005)"), series(2, "Doctor Who")];
        let picked = pick_exact_or_best(results, "doctor who").unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn test_pick_best_when_no_exact() {
        let results = vec![series(1, "The Office (US)"), series(2, "The Office (UK)")];
        let picked = pick_exact_or_best(results, "The Office").unwrap();
        assert_eq!(picked.id, 1);
    }

    #[test]
    fn test_pick_from_empty() {
        assert!(pick_exact_or_best(vec![], "Anything").is_none());
    }

    #[test]
    fn test_search_result_conversion() {
        let result: SearchResult = serde_json::from_str(
            r#"{
                "tvdb_id": "81189",
                "name": "Breaking Bad",
                "year": "2008",
                "network": "AMC",
                "genres": ["Drama", "Crime"]
            }"#,
        )
        .unwrap();

        let series = result.into_series().unwrap();
        assert_eq!(series.id, 81189);
        assert_eq!(series.year, Some(2008));
        assert_eq!(series.network.as_deref(), Some("AMC"));
    }

    #[test]
    fn test_search_result_without_id_is_dropped() {
        let result: SearchResult = serde_json::from_str(r#"{"name": "Orphan"}"#).unwrap();
        assert!(result.into_series().is_none());
    }

    #[test]
    fn test_episode_record_conversion() {
        let record: EpisodeRecord = serde_json::from_str(
            r#"{
                "id": 349232,
                "name": "Pilot",
                "aired": "2008-01-20",
                "seasonNumber": 1,
                "number": 1,
                "image": "https://artworks.thetvdb.com/still.jpg"
            }"#,
        )
        .unwrap();

        let episode: TvdbEpisode = record.into();
        assert_eq!(episode.season_number, 1);
        assert_eq!(episode.episode_number, 1);
        assert_eq!(episode.name.as_deref(), Some("Pilot"));
    }
}
